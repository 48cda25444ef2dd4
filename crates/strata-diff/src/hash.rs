//! Commutative hashing for order-independent comparison.
//!
//! The hash of a container is a sum over its children, so permuting array
//! elements or object keys leaves it unchanged. Each leaf is hashed through a
//! type-tagged text form so that values of different kinds with the same
//! rendering (`"1"` and `1`, `[1]` and `1`) hash apart.

use strata_types::{NodeId, Value};

/// Hash a value independently of array element order and object key order.
///
/// Only determinism and ordering stability matter; this is not a
/// cryptographic hash. Cycles hash as a fixed marker at the point of
/// re-entry.
pub fn order_independent_hash(value: &Value) -> i32 {
    CommutativeHasher::default().hash(value)
}

/// 32-bit string hash: `h = h * 31 + unit` over UTF-16 code units.
fn hash_text(text: &str) -> i32 {
    text.encode_utf16()
        .fold(0i32, |h, unit| h.wrapping_mul(31).wrapping_add(i32::from(unit)))
}

#[derive(Default)]
struct CommutativeHasher {
    active: Vec<NodeId>,
}

impl CommutativeHasher {
    fn hash(&mut self, value: &Value) -> i32 {
        let text = match value {
            Value::Array(_) | Value::Object(_) => return self.hash_container(value),
            Value::String(s) => s.clone(),
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => n.to_string(),
            Value::Date(d) => d.timestamp_millis().to_string(),
            Value::Regex(r) => r.to_string(),
        };
        hash_text(&format!("[ type: {} ; value: {text}]", value.kind()))
    }

    fn hash_container(&mut self, value: &Value) -> i32 {
        let Some(id) = value.node_id() else {
            return 0;
        };
        if self.active.contains(&id) {
            return hash_text("[ type: circular ]");
        }
        self.active.push(id);
        let hash = match value {
            Value::Array(array) => {
                let accum = array
                    .to_vec()
                    .iter()
                    .fold(0i32, |acc, item| acc.wrapping_add(self.hash(item)));
                accum.wrapping_add(hash_text(&format!("[type: array, hash: {accum}]")))
            }
            Value::Object(object) => {
                let entries = object.borrow().clone();
                entries.iter().fold(0i32, |acc, (key, item)| {
                    let item_hash = self.hash(item);
                    acc.wrapping_add(hash_text(&format!(
                        "[ type: object, key: {key}, value hash: {item_hash}]"
                    )))
                })
            }
            _ => 0,
        };
        self.active.pop();
        hash
    }
}
