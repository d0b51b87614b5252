use crate::grid::BoundsError;
use std::fmt;
use std::path::PathBuf;

pub type ContainerResult<T> = Result<T, ContainerError>;

#[derive(Debug)]
pub enum ContainerError {
    Read { path: PathBuf, reason: String },
    MissingDataset(String),
    MissingAttribute(String),
    UnsupportedType(String),
    MalformedBounds(BoundsError),
}

impl fmt::Display for ContainerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContainerError::Read { path, reason } => {
                write!(f, "cannot read {}: {reason}", path.display())
            }
            ContainerError::MissingDataset(name) => write!(f, "dataset {name} not found"),
            ContainerError::MissingAttribute(name) => write!(f, "attribute {name} not found"),
            ContainerError::UnsupportedType(msg) => write!(f, "unsupported dataset: {msg}"),
            ContainerError::MalformedBounds(e) => write!(f, "malformed bounds: {e}"),
        }
    }
}

impl std::error::Error for ContainerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ContainerError::MalformedBounds(e) => Some(e),
            _ => None,
        }
    }
}

impl From<BoundsError> for ContainerError {
    fn from(e: BoundsError) -> Self {
        ContainerError::MalformedBounds(e)
    }
}
