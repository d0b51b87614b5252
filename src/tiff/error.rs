use super::TagId;
use std::fmt;
use std::io;

pub type TiffResult<T> = Result<T, TiffError>;

#[derive(Debug)]
pub enum TiffError {
    BadMagicBytes,
    NoIfd0,
    MissingTag(TagId),
    BadTag(TagId),
    OffsetOverflow(u64),
    ReadError(io::Error),
}

impl fmt::Display for TiffError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TiffError::BadMagicBytes => write!(f, "not a TIFF file"),
            TiffError::NoIfd0 => write!(f, "TIFF has no image directory"),
            TiffError::MissingTag(id) => write!(f, "missing TIFF tag {id:?}"),
            TiffError::BadTag(id) => write!(f, "malformed TIFF tag {id:?}"),
            TiffError::OffsetOverflow(offset) => {
                write!(f, "offset {offset} does not fit a classic TIFF, BigTIFF required")
            }
            TiffError::ReadError(e) => write!(f, "TIFF read failed: {e}"),
        }
    }
}

impl std::error::Error for TiffError {}

impl From<io::Error> for TiffError {
    fn from(e: io::Error) -> Self {
        TiffError::ReadError(e)
    }
}
