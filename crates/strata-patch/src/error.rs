//! Error types for the patch crate.

use strata_types::TypeError;

/// Errors that can occur while decoding or replaying a patch log.
#[derive(Debug, thiserror::Error)]
pub enum PatchError {
    /// The path is not a well-formed pointer.
    #[error("invalid pointer {pointer:?}: {reason}")]
    InvalidPointer { pointer: String, reason: String },

    /// The path runs through a value that cannot hold the next step.
    #[error("cannot reach {path:?}: {source}")]
    Unreachable {
        path: String,
        #[source]
        source: TypeError,
    },
}

/// Convenience alias for patch results.
pub type PatchResult<T> = Result<T, PatchError>;
