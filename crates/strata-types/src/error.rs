use thiserror::Error;

use crate::kind::ValueKind;

/// Errors produced by value operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TypeError {
    /// A path step tried to descend into a value that holds no children.
    #[error("cannot address {segment:?} inside a {kind} value")]
    NotAContainer { segment: String, kind: ValueKind },

    /// A path step is not a usable array position.
    #[error("invalid array index: {segment:?}")]
    InvalidIndex { segment: String },

    #[error("invalid date: {0}")]
    InvalidDate(String),

    #[error("invalid regex literal: {0}")]
    InvalidRegex(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Convenience type alias for value operations.
pub type Result<T> = std::result::Result<T, TypeError>;
