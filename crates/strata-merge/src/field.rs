//! Per-field merge primitives.
//!
//! Both handlers write a single field of `target` from the same field of
//! `source` and report whether `target` changed. A side "has" a field when
//! it holds a non-null value there. Values taken from `source` are
//! deep-cloned before they are written.

use strata_types::{deep_clone, is_empty_value, Key, Object, Value, ValueKind};
use tracing::trace;

use crate::code::UpdateCode;
use crate::error::{MergeError, MergeResult};

fn present(object: &Object, key: &Key) -> Option<Value> {
    object.get(key).filter(|value| !value.is_null())
}

/// Kind as a primitive type check sees it.
fn primitive_kind(value: &Value) -> ValueKind {
    match value.kind() {
        kind if kind.is_primitive() => kind,
        _ => ValueKind::Object,
    }
}

/// Merge one scalar field under `code`.
///
/// Vector codes are forwarded to [`merge_vector_field`]. When both sides
/// hold a value they must agree on primitive type: booleans, numbers and
/// strings only match their own kind, while arrays, objects, dates and
/// regexes all count as objects and may replace one another. Writing an
/// empty value (`null`, `[]` or `{}`) removes the field instead.
pub fn merge_scalar_field(
    target: &Object,
    source: &Object,
    key: &Key,
    code: UpdateCode,
) -> MergeResult<bool> {
    if code.is_vector() {
        return merge_vector_field(target, source, key, code);
    }

    let current = present(target, key);
    let incoming = present(source, key);
    match (&current, &incoming) {
        (None, None) => return Ok(false),
        (Some(current), Some(incoming)) => {
            if primitive_kind(current) != primitive_kind(incoming) {
                return Err(MergeError::TypeMismatch {
                    field: key.to_string(),
                    target_kind: current.kind(),
                    source_kind: incoming.kind(),
                });
            }
            if current == incoming {
                return Ok(false);
            }
        }
        _ => {}
    }

    let (target_has, source_has) = (current.is_some(), incoming.is_some());
    let migrate = match code {
        UpdateCode::Y => {
            match source.get(key) {
                Some(value) => target.insert(key.clone(), deep_clone(&value)),
                None => target.remove(key),
            };
            trace!(field = %key, %code, "field overwritten");
            return Ok(true);
        }
        UpdateCode::B => source_has,
        UpdateCode::U => target_has,
        UpdateCode::H => target_has && source_has,
        UpdateCode::I => !target_has,
        UpdateCode::D => target_has && !source_has,
        UpdateCode::N | UpdateCode::T | UpdateCode::C => false,
        UpdateCode::XR
        | UpdateCode::XM
        | UpdateCode::XD
        | UpdateCode::XI
        | UpdateCode::XS
        | UpdateCode::XF => false,
    };
    if !migrate {
        return Ok(false);
    }

    let changed = match incoming.filter(|value| !is_empty_value(value)) {
        Some(value) => {
            target.insert(key.clone(), deep_clone(&value));
            true
        }
        None => {
            target.remove(key);
            target_has
        }
    };
    trace!(field = %key, %code, changed, "scalar field merged");
    Ok(changed)
}

/// Merge one array field under `code`.
///
/// A null or missing source leaves the field alone. A bare scalar source is
/// treated as a one-element array. The target must be an array when it has
/// a value. An empty result removes the field.
pub fn merge_vector_field(
    target: &Object,
    source: &Object,
    key: &Key,
    code: UpdateCode,
) -> MergeResult<bool> {
    let Some(incoming) = present(source, key) else {
        return Ok(false);
    };
    let current = present(target, key);
    let target_has = current.is_some();
    let existing = match &current {
        None => Vec::new(),
        Some(Value::Array(items)) => items.to_vec(),
        Some(other) => {
            return Err(MergeError::NotAVector {
                field: key.to_string(),
                kind: other.kind(),
            })
        }
    };
    let given: Vec<Value> = match &incoming {
        Value::Array(items) => items.to_vec().iter().map(deep_clone).collect(),
        scalar => vec![deep_clone(scalar)],
    };

    let merged: Vec<Value> = match code {
        UpdateCode::Y | UpdateCode::XR => given,
        UpdateCode::XS => existing.iter().cloned().chain(given).collect(),
        UpdateCode::XF => given.into_iter().chain(existing.iter().cloned()).collect(),
        UpdateCode::B | UpdateCode::XM => distinct(existing.iter().cloned().chain(given)),
        UpdateCode::XD => existing
            .iter()
            .filter(|item| !given.contains(*item))
            .cloned()
            .collect(),
        UpdateCode::XI => distinct(existing.iter().filter(|item| given.contains(*item)).cloned()),
        _ => return Ok(false),
    };

    if merged.is_empty() {
        target.remove(key);
        trace!(field = %key, %code, "vector field emptied");
        return Ok(target_has);
    }
    if merged == existing {
        return Ok(false);
    }
    target.insert(key.clone(), Value::from(merged));
    trace!(field = %key, %code, "vector field merged");
    Ok(true)
}

/// Keep the first of every run of deep-equal items.
fn distinct(items: impl Iterator<Item = Value>) -> Vec<Value> {
    items.fold(Vec::new(), |mut kept, item| {
        if !kept.contains(&item) {
            kept.push(item);
        }
        kept
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(json: serde_json::Value) -> Object {
        match Value::from(json) {
            Value::Object(object) => object,
            other => panic!("expected object, got {:?}", other),
        }
    }

    fn key(name: &str) -> Key {
        Key::from(name)
    }

    #[test]
    fn insert_only_leaves_occupied_fields() {
        let target = obj(json!({"a": "t"}));
        let source = obj(json!({"a": "s", "b": "s"}));
        assert!(!merge_scalar_field(&target, &source, &key("a"), UpdateCode::I).unwrap());
        assert!(merge_scalar_field(&target, &source, &key("b"), UpdateCode::I).unwrap());
        assert_eq!(Value::from(target), Value::from(json!({"a": "t", "b": "s"})));
    }

    #[test]
    fn update_deletes_when_source_lacks() {
        let target = obj(json!({"d": "t"}));
        let source = obj(json!({"d": null}));
        assert!(merge_scalar_field(&target, &source, &key("d"), UpdateCode::U).unwrap());
        assert!(!target.contains_key(&key("d")));
    }

    #[test]
    fn b_never_deletes() {
        let target = obj(json!({"d": "t"}));
        let source = obj(json!({"d": null}));
        assert!(!merge_scalar_field(&target, &source, &key("d"), UpdateCode::B).unwrap());
        assert_eq!(target.get(&key("d")), Some(Value::from("t")));
    }

    #[test]
    fn y_writes_source_verbatim() {
        let target = obj(json!({"d": "t", "e": "t"}));
        let source = obj(json!({"d": null}));
        assert!(merge_scalar_field(&target, &source, &key("d"), UpdateCode::Y).unwrap());
        assert_eq!(target.get(&key("d")), Some(Value::Null));

        assert!(merge_scalar_field(&target, &source, &key("missing"), UpdateCode::N).is_ok());
        assert!(merge_scalar_field(&target, &obj(json!({})), &key("e"), UpdateCode::Y).unwrap());
        assert!(!target.contains_key(&key("e")));
    }

    #[test]
    fn equal_values_are_not_a_change() {
        let target = obj(json!({"o": {"z": [1]}}));
        let source = obj(json!({"o": {"z": [1]}}));
        for code in [UpdateCode::Y, UpdateCode::B, UpdateCode::H] {
            assert!(!merge_scalar_field(&target, &source, &key("o"), code).unwrap());
        }
    }

    #[test]
    fn writing_an_empty_value_deletes() {
        let target = obj(json!({"a": "t"}));
        let source = obj(json!({"b": []}));
        assert!(!merge_scalar_field(&target, &source, &key("b"), UpdateCode::I).unwrap());
        assert!(!target.contains_key(&key("b")));
    }

    #[test]
    fn kind_mismatch_is_fatal() {
        let target = obj(json!({"a": "text"}));
        let source = obj(json!({"a": 1}));
        let scalar_codes: Vec<UpdateCode> = UpdateCode::ALL
            .iter()
            .copied()
            .filter(|code| !code.is_vector())
            .collect();
        assert_eq!(scalar_codes.len(), 9);
        for code in scalar_codes {
            match merge_scalar_field(&target, &source, &key("a"), code) {
                Err(MergeError::TypeMismatch { field, .. }) => assert_eq!(field, "a"),
                other => panic!("expected TypeMismatch under {code}, got {:?}", other),
            }
        }
        assert_eq!(target.get(&key("a")), Some(Value::from("text")));
    }

    #[test]
    fn non_primitive_kinds_replace_each_other() {
        let target = obj(json!({"a": [1], "b": {"x": 1}}));
        target.insert("d", Value::date_from_millis(0).unwrap());
        let source = obj(json!({"a": {"x": 1}, "b": [2], "d": {"y": 2}}));

        for name in ["a", "b", "d"] {
            assert!(merge_scalar_field(&target, &source, &key(name), UpdateCode::B).unwrap());
        }
        assert_eq!(
            Value::Object(target),
            Value::from(json!({"a": {"x": 1}, "b": [2], "d": {"y": 2}}))
        );

        let target = obj(json!({"a": [1]}));
        let source = obj(json!({"a": "flat"}));
        assert!(matches!(
            merge_scalar_field(&target, &source, &key("a"), UpdateCode::H),
            Err(MergeError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn null_target_adopts_any_kind() {
        let target = obj(json!({"a": null}));
        let source = obj(json!({"a": 1}));
        assert!(merge_scalar_field(&target, &source, &key("a"), UpdateCode::B).unwrap());
        assert_eq!(target.get(&key("a")), Some(Value::from(1)));
    }

    #[test]
    fn vector_code_on_scalar_target_is_fatal() {
        let target = obj(json!({"ts": "ts"}));
        let source = obj(json!({"ts": ["x"]}));
        match merge_vector_field(&target, &source, &key("ts"), UpdateCode::XM) {
            Err(MergeError::NotAVector { field, .. }) => assert_eq!(field, "ts"),
            other => panic!("expected NotAVector, got {:?}", other),
        }
    }

    #[test]
    fn vector_codes_combine_arrays() {
        let source = obj(json!({"a": ["33", "22", "44"]}));
        let cases = [
            (UpdateCode::XM, json!(["11", "22", "33", "44"])),
            (UpdateCode::XD, json!(["11"])),
            (UpdateCode::XI, json!(["22", "33"])),
            (UpdateCode::XR, json!(["33", "22", "44"])),
            (UpdateCode::XS, json!(["11", "22", "33", "33", "22", "44"])),
            (UpdateCode::XF, json!(["33", "22", "44", "11", "22", "33"])),
        ];
        for (code, expected) in cases {
            let target = obj(json!({"a": ["11", "22", "33"]}));
            assert!(merge_vector_field(&target, &source, &key("a"), code).unwrap());
            assert_eq!(target.get(&key("a")), Some(Value::from(expected)), "{code}");
        }
    }

    #[test]
    fn scalar_source_is_a_singleton() {
        let target = obj(json!({"tv": ["t"]}));
        let source = obj(json!({"tv": "t"}));
        assert!(!merge_vector_field(&target, &source, &key("tv"), UpdateCode::XI).unwrap());
        assert_eq!(target.get(&key("tv")), Some(Value::from(json!(["t"]))));

        assert!(merge_vector_field(&target, &source, &key("tv"), UpdateCode::XD).unwrap());
        assert!(!target.contains_key(&key("tv")));
    }

    #[test]
    fn empty_result_on_absent_target_reports_no_change() {
        let target = obj(json!({}));
        let source = obj(json!({"sv": ["11", "22", "11"]}));
        assert!(!merge_vector_field(&target, &source, &key("sv"), UpdateCode::XI).unwrap());
        assert!(!target.contains_key(&key("sv")));

        assert!(merge_vector_field(&target, &source, &key("sv"), UpdateCode::XM).unwrap());
        assert_eq!(target.get(&key("sv")), Some(Value::from(json!(["11", "22"]))));
    }

    #[test]
    fn scalar_handler_forwards_vector_codes() {
        let target = obj(json!({"a": ["1"]}));
        let source = obj(json!({"a": "2"}));
        assert!(merge_scalar_field(&target, &source, &key("a"), UpdateCode::XS).unwrap());
        assert_eq!(target.get(&key("a")), Some(Value::from(json!(["1", "2"]))));
    }

    #[test]
    fn written_values_are_detached() {
        let target = obj(json!({}));
        let source = obj(json!({"v": ["x"]}));
        merge_vector_field(&target, &source, &key("v"), UpdateCode::XR).unwrap();
        source.get(&key("v")).unwrap().as_array().unwrap().push(Value::from("y"));
        assert_eq!(target.get(&key("v")), Some(Value::from(json!(["x"]))));
    }
}
