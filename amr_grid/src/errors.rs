//! The errors that can occur at the external-interface boundary: reading a
//! grid's scalar values and exchanging per-round messages between blocks.
//! `amr_engine` re-exports the subset of `AmrError` that wraps these.
use std::error::Error;
use std::fmt;
use std::io;

/// Helper type for a call that could go wrong.
pub type GridResult<T> = Result<T, GridError>;

/// Error type surfaced by the grid reader / exchange boundary; this is the
/// concrete type `AmrError::GridReadFailure` wraps.
#[derive(Debug)]
pub enum GridError {
    /// The external reader could not supply the requested bounds.
    ReadFailure {
        /// Which gid's box failed to read.
        gid: i32,
        /// Human-readable reason from the reader backend.
        reason: String,
    },
    /// Underlying I/O error from a reader backend.
    Io(io::Error),
}

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GridError::ReadFailure { gid, reason } => {
                write!(f, "failed to read grid data for gid {}: {}", gid, reason)
            }
            GridError::Io(e) => write!(f, "{}", e),
        }
    }
}

impl Error for GridError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            GridError::Io(e) => Some(e),
            GridError::ReadFailure { .. } => None,
        }
    }
}

impl From<io::Error> for GridError {
    fn from(err: io::Error) -> Self {
        GridError::Io(err)
    }
}
