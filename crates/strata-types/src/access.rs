//! Reading and writing children of container values by path segment.
//!
//! Arrays accept [`PathSegment::Index`] steps and name keys that parse as an
//! index; the name `-` appends on write. Objects accept any step, indices
//! becoming their decimal key.

use crate::error::{Result, TypeError};
use crate::path::PathSegment;
use crate::value::{Key, Value};

/// Array position addressed by a segment.
fn array_index(segment: &PathSegment) -> Result<usize> {
    match segment {
        PathSegment::Index(i) => Ok(*i),
        PathSegment::Key(Key::Name(name)) => name.parse().map_err(|_| TypeError::InvalidIndex {
            segment: name.clone(),
        }),
        PathSegment::Key(key) => Err(TypeError::InvalidIndex {
            segment: key.to_string(),
        }),
    }
}

fn is_append(segment: &PathSegment) -> bool {
    matches!(segment, PathSegment::Key(key) if key == "-")
}

impl Value {
    /// The child under `segment`, if this is a container that has one.
    pub fn child(&self, segment: &PathSegment) -> Option<Value> {
        match self {
            Self::Array(array) => array_index(segment).ok().and_then(|i| array.get(i)),
            Self::Object(object) => object.get(&segment.to_key()),
            _ => None,
        }
    }

    /// Follow `path` from this value.
    pub fn lookup(&self, path: &[PathSegment]) -> Option<Value> {
        path.iter()
            .try_fold(self.clone(), |node, segment| node.child(segment))
    }

    /// Write a child, returning the value it replaced.
    ///
    /// Writing past the end of an array pads the gap with `null`.
    pub fn set_child(&self, segment: &PathSegment, value: Value) -> Result<Option<Value>> {
        match self {
            Self::Array(array) => {
                if is_append(segment) {
                    array.push(value);
                    return Ok(None);
                }
                let index = array_index(segment)?;
                let mut items = array.borrow_mut();
                if index < items.len() {
                    Ok(Some(std::mem::replace(&mut items[index], value)))
                } else {
                    items.resize(index, Value::Null);
                    items.push(value);
                    Ok(None)
                }
            }
            Self::Object(object) => Ok(object.insert(segment.to_key(), value)),
            other => Err(TypeError::NotAContainer {
                segment: segment.to_string(),
                kind: other.kind(),
            }),
        }
    }

    /// Remove a child, returning it. Array removal splices the remaining
    /// elements down.
    pub fn remove_child(&self, segment: &PathSegment) -> Result<Option<Value>> {
        match self {
            Self::Array(array) => {
                let index = array_index(segment)?;
                let mut items = array.borrow_mut();
                Ok((index < items.len()).then(|| items.remove(index)))
            }
            Self::Object(object) => Ok(object.remove(&segment.to_key())),
            other => Err(TypeError::NotAContainer {
                segment: segment.to_string(),
                kind: other.kind(),
            }),
        }
    }

    /// The child under `segment`, creating an empty container for it when it
    /// is missing: an array when the following step is an index, otherwise an
    /// object.
    pub fn vivify_child(&self, segment: &PathSegment, next_is_index: bool) -> Result<Value> {
        if let Some(existing) = self.child(segment) {
            return Ok(existing);
        }
        let fresh = if next_is_index {
            Self::array()
        } else {
            Self::object()
        };
        self.set_child(segment, fresh.clone())?;
        Ok(fresh)
    }
}
