use crate::cog::CloudTiffError;
use crate::encode::EncodeError;
use crate::raster::RasterError;
use std::fmt;
use std::io;
use std::path::PathBuf;

pub type WriteResult<T> = Result<T, WriteError>;

#[derive(Debug)]
pub enum WriteError {
    Encode(EncodeError),
    Reencode(CloudTiffError),
    Raster(RasterError),
    Io(io::Error),
    Persist { path: PathBuf, source: io::Error },
}

impl fmt::Display for WriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteError::Encode(e) => write!(f, "encoding failed: {e}"),
            WriteError::Reencode(e) => write!(f, "re-encoding failed: {e}"),
            WriteError::Raster(e) => write!(f, "{e}"),
            WriteError::Io(e) => write!(f, "write failed: {e}"),
            WriteError::Persist { path, source } => {
                write!(f, "cannot move output into place at {}: {source}", path.display())
            }
        }
    }
}

impl std::error::Error for WriteError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            WriteError::Encode(e) => Some(e),
            WriteError::Reencode(e) => Some(e),
            WriteError::Raster(e) => Some(e),
            WriteError::Io(e) => Some(e),
            WriteError::Persist { source, .. } => Some(source),
        }
    }
}

impl From<EncodeError> for WriteError {
    fn from(e: EncodeError) -> Self {
        WriteError::Encode(e)
    }
}

impl From<CloudTiffError> for WriteError {
    fn from(e: CloudTiffError) -> Self {
        WriteError::Reencode(e)
    }
}

impl From<RasterError> for WriteError {
    fn from(e: RasterError) -> Self {
        WriteError::Raster(e)
    }
}

impl From<io::Error> for WriteError {
    fn from(e: io::Error) -> Self {
        WriteError::Io(e)
    }
}
