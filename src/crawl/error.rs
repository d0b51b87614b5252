use crate::archive::ArchiveError;
use crate::convert::ConvertError;
use std::fmt;
use std::io;
use std::path::PathBuf;

pub type CrawlResult<T> = Result<T, CrawlError>;

#[derive(Debug)]
pub enum CrawlError {
    Archive(ArchiveError),
    Convert { key: String, source: ConvertError },
    Staging { path: PathBuf, source: io::Error },
}

impl fmt::Display for CrawlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CrawlError::Archive(e) => write!(f, "{e}"),
            CrawlError::Convert { key, source } => write!(f, "converting {key} failed: {source}"),
            CrawlError::Staging { path, source } => {
                write!(f, "cannot stage download in {}: {source}", path.display())
            }
        }
    }
}

impl std::error::Error for CrawlError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CrawlError::Archive(e) => Some(e),
            CrawlError::Convert { source, .. } => Some(source),
            CrawlError::Staging { source, .. } => Some(source),
        }
    }
}

impl From<ArchiveError> for CrawlError {
    fn from(e: ArchiveError) -> Self {
        CrawlError::Archive(e)
    }
}
