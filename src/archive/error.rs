use std::fmt;
use std::io;

pub type ArchiveResult<T> = Result<T, ArchiveError>;

#[derive(Debug)]
pub enum ArchiveError {
    List { prefix: String, reason: String },
    Download { key: String, reason: String },
    Io(io::Error),
}

impl fmt::Display for ArchiveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArchiveError::List { prefix, reason } => write!(f, "cannot list {prefix}: {reason}"),
            ArchiveError::Download { key, reason } => write!(f, "cannot download {key}: {reason}"),
            ArchiveError::Io(e) => write!(f, "archive I/O failed: {e}"),
        }
    }
}

impl std::error::Error for ArchiveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ArchiveError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for ArchiveError {
    fn from(e: io::Error) -> Self {
        ArchiveError::Io(e)
    }
}
