use crate::cog::CompressionError;
use crate::raster::RasterError;
use crate::tiff::TiffError;
use std::fmt;
use std::io;

pub type EncodeResult<T> = Result<T, EncodeError>;

#[derive(Debug)]
pub enum EncodeError {
    WriteError(io::Error),
    RasterizationError(RasterError),
    CompressionError(CompressionError),
    LayoutError(TiffError),
    InvalidTileSize((u16, u16)),
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodeError::WriteError(e) => write!(f, "write failed: {e}"),
            EncodeError::RasterizationError(e) => write!(f, "{e}"),
            EncodeError::CompressionError(e) => write!(f, "{e}"),
            EncodeError::LayoutError(e) => write!(f, "cannot lay out TIFF: {e}"),
            EncodeError::InvalidTileSize((w, h)) => {
                write!(f, "tile size {w}x{h} must be a non-zero multiple of 16")
            }
        }
    }
}

impl std::error::Error for EncodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EncodeError::WriteError(e) => Some(e),
            EncodeError::RasterizationError(e) => Some(e),
            EncodeError::CompressionError(e) => Some(e),
            EncodeError::LayoutError(e) => Some(e),
            EncodeError::InvalidTileSize(_) => None,
        }
    }
}

impl From<io::Error> for EncodeError {
    fn from(e: io::Error) -> Self {
        EncodeError::WriteError(e)
    }
}

impl From<RasterError> for EncodeError {
    fn from(e: RasterError) -> Self {
        EncodeError::RasterizationError(e)
    }
}

impl From<CompressionError> for EncodeError {
    fn from(e: CompressionError) -> Self {
        EncodeError::CompressionError(e)
    }
}

impl From<TiffError> for EncodeError {
    fn from(e: TiffError) -> Self {
        match e {
            TiffError::ReadError(io_error) => EncodeError::WriteError(io_error),
            tiff_error => EncodeError::LayoutError(tiff_error),
        }
    }
}
