use std::fmt;
use std::io;
use std::path::PathBuf;

pub type PaletteResult<T> = Result<T, PaletteError>;

#[derive(Debug)]
pub enum PaletteError {
    Empty,
    BadBand { index: usize, reason: String },
    Gap { index: usize, expected: f64, found: f64 },
    OpenEndedBand(usize),
    ClosedFinalBand,
    Parse(serde_json::Error),
    Read(PathBuf, io::Error),
}

impl fmt::Display for PaletteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaletteError::Empty => write!(f, "palette has no bands"),
            PaletteError::BadBand { index, reason } => write!(f, "band {index}: {reason}"),
            PaletteError::Gap {
                index,
                expected,
                found,
            } => write!(
                f,
                "band {index} starts at {found} but the previous band ends at {expected}"
            ),
            PaletteError::OpenEndedBand(index) => {
                write!(f, "band {index} is open-ended but is not the last band")
            }
            PaletteError::ClosedFinalBand => write!(f, "the last band must be open-ended"),
            PaletteError::Parse(e) => write!(f, "palette is not valid JSON: {e}"),
            PaletteError::Read(path, e) => write!(f, "cannot read palette {}: {e}", path.display()),
        }
    }
}

impl std::error::Error for PaletteError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PaletteError::Parse(e) => Some(e),
            PaletteError::Read(_, e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for PaletteError {
    fn from(e: serde_json::Error) -> Self {
        PaletteError::Parse(e)
    }
}
