use crate::container::ContainerError;
use crate::writer::WriteError;
use std::fmt;
use std::io;
use std::path::PathBuf;

pub type ConvertResult<T> = Result<T, ConvertError>;

#[derive(Debug)]
pub enum ConvertError {
    Container(ContainerError),
    Write(WriteError),
    OutputDir { path: PathBuf, source: io::Error },
}

impl fmt::Display for ConvertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConvertError::Container(e) => write!(f, "{e}"),
            ConvertError::Write(e) => write!(f, "{e}"),
            ConvertError::OutputDir { path, source } => {
                write!(f, "cannot create output folder {}: {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ConvertError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConvertError::Container(e) => Some(e),
            ConvertError::Write(e) => Some(e),
            ConvertError::OutputDir { source, .. } => Some(source),
        }
    }
}

impl From<ContainerError> for ConvertError {
    fn from(e: ContainerError) -> Self {
        ConvertError::Container(e)
    }
}

impl From<WriteError> for ConvertError {
    fn from(e: WriteError) -> Self {
        ConvertError::Write(e)
    }
}
