use crate::data::err::GetCode;
use std::{error::Error, fmt};

/// Result alias used across the crate.
pub type ProfillicResult<T> = Result<T, ProfillicError>;

/// An enum representing the errors that can happen while reading alignments,
/// converting models, or building HMMs.
///
/// Running out of input is not an error: readers return `Ok(None)` instead.
#[non_exhaustive]
pub enum ProfillicError {
    /// Malformed input, usually with the offending line number in the message
    Format(String),
    /// Input that parses but cannot be used, such as mismatched model sizes
    InvalidInput(String),
    /// A degenerate result, such as a model with no match states
    NoResult(String),
    /// A reader that exists as a format name only
    NotImplemented(&'static str),
    /// A condition that should not be reachable
    Internal(String),
    /// An underlying I/O failure
    Io(std::io::Error),
}

impl ProfillicError {
    #[inline]
    pub(crate) fn format(msg: impl Into<String>) -> Self {
        ProfillicError::Format(msg.into())
    }

    #[inline]
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        ProfillicError::InvalidInput(msg.into())
    }

    #[inline]
    pub(crate) fn no_result(msg: impl Into<String>) -> Self {
        ProfillicError::NoResult(msg.into())
    }

    /// Whether the error is a [`NoResult`](ProfillicError::NoResult), which
    /// callers may treat as "nothing to do" rather than corruption.
    #[inline]
    #[must_use]
    pub fn is_no_result(&self) -> bool {
        matches!(self, ProfillicError::NoResult(_))
    }
}

impl fmt::Display for ProfillicError {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ProfillicError::Format(msg) | ProfillicError::InvalidInput(msg) | ProfillicError::Internal(msg) => {
                write!(f, "{msg}")
            }
            ProfillicError::NoResult(msg) => write!(f, "No result: {msg}"),
            ProfillicError::NotImplemented(msg) => write!(f, "{msg}"),
            ProfillicError::Io(e) => write!(f, "{e}"),
        }
    }
}

impl fmt::Debug for ProfillicError {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{self}")
    }
}

impl Error for ProfillicError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ProfillicError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ProfillicError {
    #[inline]
    fn from(e: std::io::Error) -> Self {
        ProfillicError::Io(e)
    }
}

impl GetCode for ProfillicError {
    #[inline]
    fn get_code(&self) -> i32 {
        match self {
            ProfillicError::Io(e) => e.get_code(),
            _ => 1,
        }
    }
}
