//! The change model: one structural difference between two values.

use std::fmt;

use serde::{Deserialize, Serialize};
use strata_types::{format_path, Path, PathSegment, Value};

/// A single difference found by the tree differ.
///
/// Paths are relative to the compared roots; an empty path means the roots
/// themselves differ. Values carried by a change alias the containers of the
/// inputs they were read from.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Change {
    /// A value present only on the right-hand side.
    #[serde(rename = "N")]
    New { path: Path, rhs: Value },
    /// A value present only on the left-hand side.
    #[serde(rename = "D")]
    Deleted { path: Path, lhs: Value },
    /// A value present on both sides that differs.
    #[serde(rename = "E")]
    Edited { path: Path, lhs: Value, rhs: Value },
    /// An element appended to or dropped from the tail of the array at `path`.
    #[serde(rename = "A")]
    Array {
        path: Path,
        index: usize,
        item: ArrayItem,
    },
}

/// The element-level half of a [`Change::Array`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum ArrayItem {
    #[serde(rename = "N")]
    New { rhs: Value },
    #[serde(rename = "D")]
    Deleted { lhs: Value },
}

/// Discriminant of a [`Change`], rendered as its one-letter wire tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    New,
    Deleted,
    Edited,
    Array,
}

impl Change {
    /// The path of the value this change touches.
    pub fn path(&self) -> &[PathSegment] {
        match self {
            Self::New { path, .. }
            | Self::Deleted { path, .. }
            | Self::Edited { path, .. }
            | Self::Array { path, .. } => path,
        }
    }

    /// The variant of this change, without its payload.
    pub fn kind(&self) -> ChangeKind {
        match self {
            Self::New { .. } => ChangeKind::New,
            Self::Deleted { .. } => ChangeKind::Deleted,
            Self::Edited { .. } => ChangeKind::Edited,
            Self::Array { .. } => ChangeKind::Array,
        }
    }

    /// Returns `true` for changes addressed at the compared roots.
    pub fn is_root(&self) -> bool {
        self.path().is_empty()
    }

    /// The left-hand value, where the change records one.
    pub fn lhs(&self) -> Option<&Value> {
        match self {
            Self::Deleted { lhs, .. } | Self::Edited { lhs, .. } => Some(lhs),
            Self::Array {
                item: ArrayItem::Deleted { lhs },
                ..
            } => Some(lhs),
            _ => None,
        }
    }

    /// The right-hand value, where the change records one.
    pub fn rhs(&self) -> Option<&Value> {
        match self {
            Self::New { rhs, .. } | Self::Edited { rhs, .. } => Some(rhs),
            Self::Array {
                item: ArrayItem::New { rhs },
                ..
            } => Some(rhs),
            _ => None,
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            Self::New => "N",
            Self::Deleted => "D",
            Self::Edited => "E",
            Self::Array => "A",
        };
        f.write_str(tag)
    }
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Array { path, index, item } => {
                let inner = match item {
                    ArrayItem::New { .. } => ChangeKind::New,
                    ArrayItem::Deleted { .. } => ChangeKind::Deleted,
                };
                write!(f, "A[{inner}] {}[{index}]", format_path(path))
            }
            other => write!(f, "{} {}", other.kind(), format_path(other.path())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_with_one_letter_tags() {
        let change = Change::Array {
            path: vec!["list".into()],
            index: 2,
            item: ArrayItem::New {
                rhs: Value::from("x"),
            },
        };
        let json = serde_json::to_value(&change).unwrap();
        assert_eq!(
            json,
            json!({"kind": "A", "path": ["list"], "index": 2, "item": {"kind": "N", "rhs": "x"}})
        );

        let back: Change = serde_json::from_value(json).unwrap();
        assert_eq!(back, change);
    }

    #[test]
    fn accessors_expose_sides() {
        let edited = Change::Edited {
            path: vec!["a".into(), 0.into()],
            lhs: Value::from(1),
            rhs: Value::from(2),
        };
        assert_eq!(edited.kind(), ChangeKind::Edited);
        assert_eq!(edited.lhs(), Some(&Value::from(1)));
        assert_eq!(edited.rhs(), Some(&Value::from(2)));
        assert!(!edited.is_root());
        assert_eq!(edited.to_string(), "E a.0");

        let dropped = Change::Array {
            path: vec![],
            index: 1,
            item: ArrayItem::Deleted {
                lhs: Value::from("a"),
            },
        };
        assert!(dropped.is_root());
        assert_eq!(dropped.rhs(), None);
        assert_eq!(dropped.to_string(), "A[D] [1]");
    }
}
