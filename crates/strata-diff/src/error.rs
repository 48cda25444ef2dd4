//! Error types for the diff crate.

use strata_types::TypeError;

/// Errors that can occur while applying or reverting changes.
///
/// Computing a diff never fails; only writing changes back into a value can.
#[derive(Debug, thiserror::Error)]
pub enum DiffError {
    /// A revert walked into a path the target does not have.
    #[error("path not found: {path:?}")]
    PathNotFound { path: String },

    /// The target's shape does not admit the write.
    #[error("access error: {0}")]
    Access(#[from] TypeError),
}

/// Convenience alias for diff results.
pub type DiffResult<T> = Result<T, DiffError>;
