use std::fmt;

use serde::{Deserialize, Serialize};

use crate::value::Key;

/// One step from a container to one of its children.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    /// Position inside an array.
    Index(usize),
    /// Key inside an object.
    Key(Key),
}

/// A path from a root value; empty means the root itself.
pub type Path = Vec<PathSegment>;

impl PathSegment {
    /// The array position, if this is an index step.
    pub fn as_index(&self) -> Option<usize> {
        match self {
            Self::Index(i) => Some(*i),
            Self::Key(_) => None,
        }
    }

    /// The object key, if this is a key step.
    pub fn as_key(&self) -> Option<&Key> {
        match self {
            Self::Key(key) => Some(key),
            Self::Index(_) => None,
        }
    }

    /// Convert to the key an object would use for this step.
    pub fn to_key(&self) -> Key {
        match self {
            Self::Key(key) => key.clone(),
            Self::Index(i) => Key::Name(i.to_string()),
        }
    }
}

impl PartialEq<str> for PathSegment {
    fn eq(&self, other: &str) -> bool {
        matches!(self, Self::Key(key) if key == other)
    }
}

impl PartialEq<&str> for PathSegment {
    fn eq(&self, other: &&str) -> bool {
        self == *other
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

impl From<&str> for PathSegment {
    fn from(name: &str) -> Self {
        Self::Key(Key::from(name))
    }
}

impl From<String> for PathSegment {
    fn from(name: String) -> Self {
        Self::Key(Key::Name(name))
    }
}

impl From<Key> for PathSegment {
    fn from(key: Key) -> Self {
        Self::Key(key)
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(i) => write!(f, "{i}"),
            Self::Key(key) => write!(f, "{key}"),
        }
    }
}

/// Dot-joined rendering of a path, for messages and logs.
pub fn format_path(path: &[PathSegment]) -> String {
    path.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(".")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_mixed_paths() {
        let path: Path = vec!["phases".into(), 1.into(), "id".into()];
        assert_eq!(format_path(&path), "phases.1.id");
        assert_eq!(format_path(&[]), "");
    }

    #[test]
    fn serializes_untagged() {
        let path: Path = vec!["a".into(), 0.into()];
        let json = serde_json::to_value(&path).unwrap();
        assert_eq!(json, serde_json::json!(["a", 0]));

        let back: Path = serde_json::from_value(json).unwrap();
        assert_eq!(back, path);
    }

    #[test]
    fn index_segments_become_object_keys() {
        assert_eq!(PathSegment::Index(3).to_key(), Key::from("3"));
        assert!(PathSegment::from("x") == "x");
    }
}
