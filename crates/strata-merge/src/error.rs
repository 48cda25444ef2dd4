//! Error types for the merge crate.

use strata_types::ValueKind;

/// Errors that can occur while resolving a merge configuration or merging
/// fields.
#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    /// A resolved code map does not cover every source key.
    #[error("no update code resolved for {key:?} ({resolved} of {expected} keys resolved)")]
    UnresolvedKeys {
        key: String,
        resolved: usize,
        expected: usize,
    },

    /// Both sides of a field hold values of different kinds.
    #[error("field type mismatch for {field:?}: target is {target_kind}, source is {source_kind}")]
    TypeMismatch {
        field: String,
        target_kind: ValueKind,
        source_kind: ValueKind,
    },

    /// A vector code was applied to an occupied field that is not an array.
    #[error("type change to vector for {field:?}: target is {kind}")]
    NotAVector { field: String, kind: ValueKind },

    /// A glob pattern could not be compiled.
    #[error("invalid glob {pattern:?}: {reason}")]
    InvalidGlob { pattern: String, reason: String },

    /// Unknown update code token.
    #[error("unknown update code {code:?}")]
    InvalidCode { code: String },

    /// Malformed merge configuration.
    #[error("invalid merge config: {reason}")]
    InvalidConfig { reason: String },
}

/// Convenience alias for merge results.
pub type MergeResult<T> = Result<T, MergeError>;
