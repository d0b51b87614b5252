use super::compression::CompressionError;
use crate::geotags::GeoTiffError;
use crate::raster::RasterError;
use crate::tiff::TiffError;
use std::fmt;
use std::io;

pub type CloudTiffResult<T> = Result<T, CloudTiffError>;

#[derive(Debug)]
pub enum CloudTiffError {
    BadTiff(TiffError),
    BadGeoTiff(GeoTiffError),
    TileLevelOutOfRange((usize, usize)),
    TileIndexOutOfRange((usize, usize)),
    ReadError(io::Error),
    CompressionError(CompressionError),
    RasterizationError(RasterError),
    NoLevels,
    NotSupported(String),
}

impl fmt::Display for CloudTiffError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CloudTiffError::BadTiff(e) => write!(f, "bad TIFF: {e}"),
            CloudTiffError::BadGeoTiff(e) => write!(f, "bad GeoTIFF: {e}"),
            CloudTiffError::TileLevelOutOfRange((level, max)) => {
                write!(f, "level {level} out of range 0..={max}")
            }
            CloudTiffError::TileIndexOutOfRange((index, max)) => {
                write!(f, "tile {index} out of range 0..={max}")
            }
            CloudTiffError::ReadError(e) => write!(f, "read failed: {e}"),
            CloudTiffError::CompressionError(e) => write!(f, "{e}"),
            CloudTiffError::RasterizationError(e) => write!(f, "{e}"),
            CloudTiffError::NoLevels => write!(f, "no tiled image levels"),
            CloudTiffError::NotSupported(msg) => write!(f, "not supported: {msg}"),
        }
    }
}

impl std::error::Error for CloudTiffError {}

impl From<TiffError> for CloudTiffError {
    fn from(e: TiffError) -> Self {
        match e {
            TiffError::ReadError(io_error) => CloudTiffError::ReadError(io_error),
            tiff_error => CloudTiffError::BadTiff(tiff_error),
        }
    }
}

impl From<GeoTiffError> for CloudTiffError {
    fn from(e: GeoTiffError) -> Self {
        CloudTiffError::BadGeoTiff(e)
    }
}

impl From<io::Error> for CloudTiffError {
    fn from(e: io::Error) -> Self {
        CloudTiffError::ReadError(e)
    }
}

impl From<CompressionError> for CloudTiffError {
    fn from(e: CompressionError) -> Self {
        CloudTiffError::CompressionError(e)
    }
}

impl From<RasterError> for CloudTiffError {
    fn from(e: RasterError) -> Self {
        CloudTiffError::RasterizationError(e)
    }
}
