use crate::tiff::TagId;
use std::fmt;

#[derive(Debug)]
pub enum GeoTiffError {
    MissingTag(TagId),
    BadTag(TagId),
}

impl fmt::Display for GeoTiffError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeoTiffError::MissingTag(id) => write!(f, "missing GeoTIFF tag {id:?}"),
            GeoTiffError::BadTag(id) => write!(f, "malformed GeoTIFF tag {id:?}"),
        }
    }
}

impl std::error::Error for GeoTiffError {}
