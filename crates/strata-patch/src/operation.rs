//! Patch log wire model.

use std::fmt;

use serde::{Deserialize, Serialize};
use strata_types::Value;

/// The operation a patch entry performs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatchOp {
    Add,
    Remove,
    Replace,
    Test,
}

impl fmt::Display for PatchOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Add => "add",
            Self::Remove => "remove",
            Self::Replace => "replace",
            Self::Test => "test",
        };
        f.write_str(name)
    }
}

/// One entry of a patch log.
///
/// Compatible with JSON Patch `add`/`remove`/`replace`/`test`; `prev` is an
/// extension holding the value the entry overwrote or removed, which is what
/// makes a log reversible.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PatchOperation {
    /// Pointer to the addressed value.
    pub path: String,
    pub op: PatchOp,
    /// New value for `add`/`replace`/`test`. Absent reads as `null`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    /// Previous value for `replace`/`remove`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev: Option<Value>,
}

impl PatchOperation {
    /// An `add` entry.
    pub fn add(path: impl Into<String>, value: Value) -> Self {
        Self {
            path: path.into(),
            op: PatchOp::Add,
            value: Some(value),
            prev: None,
        }
    }

    /// A `remove` entry, keeping the removed value when known.
    pub fn remove(path: impl Into<String>, prev: Option<Value>) -> Self {
        Self {
            path: path.into(),
            op: PatchOp::Remove,
            value: None,
            prev,
        }
    }

    /// A `replace` entry, keeping the overwritten value when known.
    pub fn replace(path: impl Into<String>, value: Value, prev: Option<Value>) -> Self {
        Self {
            path: path.into(),
            op: PatchOp::Replace,
            value: Some(value),
            prev,
        }
    }

    /// A `test` entry asserting `value` at `path`.
    pub fn test(path: impl Into<String>, value: Value) -> Self {
        Self {
            path: path.into(),
            op: PatchOp::Test,
            value: Some(value),
            prev: None,
        }
    }

    /// The value to write, `null` when absent.
    pub fn value_or_null(&self) -> Value {
        self.value.clone().unwrap_or_default()
    }

    /// Drop the `prev` extension, leaving a plain JSON Patch entry.
    pub fn without_prev(mut self) -> Self {
        self.prev = None;
        self
    }
}
