//! The errors this engine can raise. Every kind here is fatal: the caller
//! logs the diagnostic and aborts the process, except `GridReadFailure`,
//! which the caller may retry.
use std::error::Error;
use std::fmt;
use std::io;

use amr_grid::GridError;

/// Helper type for a call that could go wrong.
pub type AmrResult<T> = Result<T, AmrError>;

/// Error type for the merge-tree / connected-component engine: the four
/// ways a round or a grid read can fail, plus an `Io` variant for the
/// save/load path.
#[derive(Debug)]
pub enum AmrError {
    /// The external grid reader could not supply the requested bounds.
    GridReadFailure(GridError),
    /// The ghost ring references a gid absent from the link, or a `core`
    /// cell is unclassified after mask construction.
    MaskConsistencyError {
        /// The block in which the inconsistency was found.
        gid: i32,
        /// Human-readable description of which invariant failed.
        reason: String,
    },
    /// `processed_neighbors ⊄ current_neighbors` at a round boundary, or a
    /// union was attempted between classes whose edge does not exist.
    ProtocolInvariantViolation(String),
    /// A loaded block's layout version does not match this build's.
    SerializationVersionMismatch {
        /// Version found in the serialized stream.
        found: u32,
        /// Version this build expects.
        expected: u32,
    },
    /// Underlying I/O error from the save/load path.
    Io(io::Error),
}

impl fmt::Display for AmrError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AmrError::GridReadFailure(e) => write!(f, "grid read failure: {}", e),
            AmrError::MaskConsistencyError { gid, reason } => {
                write!(f, "mask consistency error in block {}: {}", gid, reason)
            }
            AmrError::ProtocolInvariantViolation(reason) => {
                write!(f, "protocol invariant violation: {}", reason)
            }
            AmrError::SerializationVersionMismatch { found, expected } => write!(
                f,
                "serialization version mismatch: found {}, expected {}",
                found, expected
            ),
            AmrError::Io(e) => write!(f, "{}", e),
        }
    }
}

impl Error for AmrError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            AmrError::GridReadFailure(e) => Some(e),
            AmrError::Io(e) => Some(e),
            AmrError::MaskConsistencyError { .. } => None,
            AmrError::ProtocolInvariantViolation(_) => None,
            AmrError::SerializationVersionMismatch { .. } => None,
        }
    }
}

impl From<GridError> for AmrError {
    fn from(err: GridError) -> Self {
        AmrError::GridReadFailure(err)
    }
}

impl From<io::Error> for AmrError {
    fn from(err: io::Error) -> Self {
        AmrError::Io(err)
    }
}