//! Flat, dot-keyed views of nested objects.
//!
//! [`flatten`] turns `{"a": {"b": [1]}}` into `{"a.b.0": 1}` and
//! [`unflatten`] builds the nested form back.

use crate::error::Result;
use crate::path::PathSegment;
use crate::value::{Key, NodeId, Object, Value};

/// One entry per leaf of `object`, keyed by the dot-joined path to it.
///
/// Arrays and objects are descended into, so empty containers leave no
/// entry. Dates and regexes are leaves. Symbol keys are skipped, and a
/// container already being walked is not entered again.
pub fn flatten(object: &Object) -> Object {
    let flat = Object::new();
    let mut walker = Flattener {
        flat: &flat,
        path: Vec::new(),
        active: vec![object.node_id()],
    };
    walker.walk_object(object);
    flat
}

struct Flattener<'a> {
    flat: &'a Object,
    path: Vec<String>,
    active: Vec<NodeId>,
}

impl Flattener<'_> {
    fn walk_object(&mut self, object: &Object) {
        for key in object.keys() {
            let Some(name) = key.as_name() else {
                continue;
            };
            let value = object.get(&key).unwrap_or_default();
            self.visit(name.to_string(), &value);
        }
    }

    fn visit(&mut self, step: String, value: &Value) {
        self.path.push(step);
        match value.node_id() {
            Some(id) if self.active.contains(&id) => {}
            Some(id) => {
                self.active.push(id);
                match value {
                    Value::Array(items) => {
                        for (index, item) in items.to_vec().iter().enumerate() {
                            self.visit(index.to_string(), item);
                        }
                    }
                    Value::Object(object) => self.walk_object(object),
                    _ => {}
                }
                self.active.pop();
            }
            None => {
                self.flat.insert(self.path.join("."), value.clone());
            }
        }
        self.path.pop();
    }
}

/// Rebuild a nested object from dot-keyed entries.
///
/// A missing or `null` step is created as an array when the step after it
/// is a decimal index, otherwise as an object. Fails when a path runs into
/// a scalar.
pub fn unflatten(flat: &Object) -> Result<Object> {
    let root = Object::new();
    for key in flat.keys() {
        let Key::Name(path) = &key else {
            continue;
        };
        let steps: Vec<&str> = path.split('.').collect();
        let Some((last, parents)) = steps.split_last() else {
            continue;
        };

        let mut node = Value::Object(root.clone());
        for (depth, step) in parents.iter().enumerate() {
            let segment = PathSegment::from(*step);
            node = match node.child(&segment).filter(|child| !child.is_null()) {
                Some(existing) => existing,
                None => {
                    let next_is_index = steps[depth + 1].parse::<usize>().is_ok();
                    let fresh = if next_is_index {
                        Value::array()
                    } else {
                        Value::object()
                    };
                    node.set_child(&segment, fresh.clone())?;
                    fresh
                }
            };
        }
        let value = flat.get(&key).unwrap_or_default();
        node.set_child(&PathSegment::from(*last), value)?;
    }
    Ok(root)
}
