use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// The part of a MOLDEN file an [`Error::Parse`] points into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    /// The file as a whole, for problems that do not belong to one section.
    Document,
    Title,
    Freq,
    Int,
    FrCoord,
    FrNormCoord,
}

impl Section {
    /// The marker that introduces this section, without the brackets.
    pub(crate) fn from_marker(name: &str) -> Option<Self> {
        let section = match name.trim().to_ascii_uppercase().as_str() {
            "TITLE" => Self::Title,
            "FREQ" => Self::Freq,
            "INT" => Self::Int,
            "FR-COORD" => Self::FrCoord,
            "FR-NORM-COORD" => Self::FrNormCoord,
            _ => return None,
        };
        Some(section)
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Document => write!(f, "document"),
            Self::Title => write!(f, "[Title]"),
            Self::Freq => write!(f, "[FREQ]"),
            Self::Int => write!(f, "[INT]"),
            Self::FrCoord => write!(f, "[FR-COORD]"),
            Self::FrNormCoord => write!(f, "[FR-NORM-COORD]"),
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    /// Malformed or incomplete input. `line` is 1-based.
    #[error("{section}, line {line}: {details}")]
    Parse {
        section: Section,
        line: usize,
        details: String,
    },

    /// An invalid parameter, or data that disagrees across a call boundary.
    #[error("invalid value: {0}")]
    Value(String),

    #[error("i/o error on '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn parse(section: Section, line: usize, details: impl Into<String>) -> Self {
        Self::Parse {
            section,
            line,
            details: details.into(),
        }
    }

    /// Returns a closure that attaches `path` to an [`std::io::Error`], for use with `map_err`.
    pub fn io(path: &Path) -> impl FnOnce(std::io::Error) -> Self + '_ {
        move |source| Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}
