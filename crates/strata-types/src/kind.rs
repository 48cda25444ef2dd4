//! Real-type classification of values.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::value::Value;

/// The concrete type of a value. Two values with different kinds are never
/// compared member-wise.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Null,
    Boolean,
    Number,
    String,
    Array,
    Object,
    Date,
    Regexp,
}

impl ValueKind {
    /// Arrays and objects hold children; everything else is a leaf.
    pub fn is_container(self) -> bool {
        matches!(self, Self::Array | Self::Object)
    }

    /// Booleans, numbers, and strings.
    pub fn is_primitive(self) -> bool {
        matches!(self, Self::Boolean | Self::Number | Self::String)
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Null => "null",
            Self::Boolean => "boolean",
            Self::Number => "number",
            Self::String => "string",
            Self::Array => "array",
            Self::Object => "object",
            Self::Date => "date",
            Self::Regexp => "regexp",
        };
        f.write_str(name)
    }
}

/// Coarse structural class of a value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TypeClass {
    Nullish,
    Scalar,
    Array,
    Object,
    Date,
    Regexp,
}

impl Value {
    /// The concrete kind of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Null => ValueKind::Null,
            Self::Bool(_) => ValueKind::Boolean,
            Self::Number(_) => ValueKind::Number,
            Self::String(_) => ValueKind::String,
            Self::Array(_) => ValueKind::Array,
            Self::Object(_) => ValueKind::Object,
            Self::Date(_) => ValueKind::Date,
            Self::Regex(_) => ValueKind::Regexp,
        }
    }
}

/// Classify a value into its structural class.
pub fn classify(value: &Value) -> TypeClass {
    match value.kind() {
        ValueKind::Null => TypeClass::Nullish,
        ValueKind::Boolean | ValueKind::Number | ValueKind::String => TypeClass::Scalar,
        ValueKind::Array => TypeClass::Array,
        ValueKind::Object => TypeClass::Object,
        ValueKind::Date => TypeClass::Date,
        ValueKind::Regexp => TypeClass::Regexp,
    }
}
