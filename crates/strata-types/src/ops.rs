//! Structural clone, equality, and emptiness.

use std::collections::HashMap;

use crate::map::Map;
use crate::value::{Array, NodeId, Object, Value};

/// Structural copy of a value.
///
/// Every container is copied once: aliasing inside the input (including
/// cycles) is reproduced in the output rather than expanded.
pub fn deep_clone(value: &Value) -> Value {
    Cloner::default().copy(value)
}

/// [`deep_clone`] for an object handle.
pub fn deep_clone_object(object: &Object) -> Object {
    Cloner::default().copy_object(object)
}

#[derive(Default)]
struct Cloner {
    copies: HashMap<NodeId, Value>,
}

impl Cloner {
    fn copy(&mut self, value: &Value) -> Value {
        match value {
            Value::Array(array) => {
                if let Some(copy) = self.copies.get(&array.node_id()) {
                    return copy.clone();
                }
                let copy = Array::new();
                self.copies.insert(array.node_id(), Value::Array(copy.clone()));
                let items: Vec<Value> = array.to_vec().iter().map(|item| self.copy(item)).collect();
                *copy.borrow_mut() = items;
                Value::Array(copy)
            }
            Value::Object(object) => Value::Object(self.copy_object(object)),
            other => other.clone(),
        }
    }

    fn copy_object(&mut self, object: &Object) -> Object {
        if let Some(Value::Object(copy)) = self.copies.get(&object.node_id()) {
            return copy.clone();
        }
        let copy = Object::new();
        self.copies.insert(object.node_id(), Value::Object(copy.clone()));
        let entries = object.borrow().clone();
        let map: Map = entries
            .into_iter()
            .map(|(key, item)| (key, self.copy(&item)))
            .collect();
        *copy.borrow_mut() = map;
        copy
    }
}

/// Structural equality.
///
/// Objects compare by key set regardless of order, dates by millisecond,
/// regexes by source and flags, and `NaN` equals `NaN`. A pair of containers
/// met again while already being compared is taken as equal, so cyclic inputs
/// terminate.
pub fn deep_equals(lhs: &Value, rhs: &Value) -> bool {
    Equality::default().equals(lhs, rhs)
}

#[derive(Default)]
struct Equality {
    active: Vec<(NodeId, NodeId)>,
}

impl Equality {
    fn equals(&mut self, lhs: &Value, rhs: &Value) -> bool {
        match (lhs, rhs) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Date(a), Value::Date(b)) => a.timestamp_millis() == b.timestamp_millis(),
            (Value::Regex(a), Value::Regex(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => {
                if a.ptr_eq(b) {
                    return true;
                }
                let pair = (a.node_id(), b.node_id());
                if self.active.contains(&pair) {
                    return true;
                }
                let (left, right) = (a.to_vec(), b.to_vec());
                if left.len() != right.len() {
                    return false;
                }
                self.active.push(pair);
                let same = left.iter().zip(&right).all(|(l, r)| self.equals(l, r));
                self.active.pop();
                same
            }
            (Value::Object(a), Value::Object(b)) => {
                if a.ptr_eq(b) {
                    return true;
                }
                let pair = (a.node_id(), b.node_id());
                if self.active.contains(&pair) {
                    return true;
                }
                let (left, right) = (a.borrow().clone(), b.borrow().clone());
                if left.len() != right.len() {
                    return false;
                }
                self.active.push(pair);
                let same = left
                    .iter()
                    .all(|(key, l)| right.get(key).is_some_and(|r| self.equals(l, r)));
                self.active.pop();
                same
            }
            _ => false,
        }
    }
}

/// `null`, an empty array, or an empty object.
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Array(array) => array.is_empty(),
        Value::Object(object) => object.is_empty(),
        _ => false,
    }
}
