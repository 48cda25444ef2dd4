//! Whole-object merges.
//!
//! [`detail_merge`] walks a resolved code map and [`shallow_merge`] applies
//! one pair of codes to every top-level source key. Both write into `target`
//! in place; the `immutable_*` variants merge into a deep copy instead and
//! return it.

use strata_types::{deep_clone_object, Key, Object, Value};
use tracing::debug;

use crate::code::UpdateCode;
use crate::config::MergeConfig;
use crate::error::MergeResult;
use crate::field::{merge_scalar_field, merge_vector_field};
use crate::resolve::{fill_update_codes, CodeEntry, ResolvedCodeMap};

/// Merge `source` into `target` key by key under `codes`. Returns whether
/// `target` changed.
///
/// A nested entry recurses when both sides hold objects. When only the
/// source holds one, the nested result is built separately and inserted as
/// a whole under `I`.
pub fn detail_merge(target: &Object, source: &Object, codes: &ResolvedCodeMap) -> MergeResult<bool> {
    let mut changed = false;
    for (key, entry) in codes.iter() {
        let effect = match entry {
            CodeEntry::Code(code) if code.is_vector() => {
                merge_vector_field(target, source, key, *code)?
            }
            CodeEntry::Code(code) => merge_scalar_field(target, source, key, *code)?,
            CodeEntry::Nested(nested) => merge_nested(target, source, key, nested)?,
        };
        changed |= effect;
    }
    Ok(changed)
}

fn merge_nested(
    target: &Object,
    source: &Object,
    key: &Key,
    codes: &ResolvedCodeMap,
) -> MergeResult<bool> {
    let current = target.get(key).filter(|value| !value.is_null());
    match (current, source.get(key)) {
        (Some(Value::Object(current)), Some(Value::Object(incoming))) => {
            detail_merge(&current, &incoming, codes)
        }
        (None, Some(Value::Object(incoming))) => {
            let scratch = Object::new();
            detail_merge(&scratch, &incoming, codes)?;
            let staged = Object::new();
            staged.insert(key.clone(), Value::Object(scratch));
            merge_scalar_field(target, &staged, key, UpdateCode::I)
        }
        _ => merge_scalar_field(target, source, key, UpdateCode::I),
    }
}

/// [`detail_merge`] into a deep copy of `target`.
pub fn immutable_detail_merge(
    target: &Object,
    source: &Object,
    codes: &ResolvedCodeMap,
) -> MergeResult<Object> {
    let copy = deep_clone_object(target);
    detail_merge(&copy, source, codes)?;
    Ok(copy)
}

/// Resolve `config` against `source`, then [`immutable_detail_merge`].
pub fn immutable_custom_merge(
    target: &Object,
    source: &Object,
    config: &MergeConfig,
) -> MergeResult<Object> {
    let codes = fill_update_codes(source, config, false, &[])?;
    immutable_detail_merge(target, source, &codes)
}

/// Merge every top-level key of `source` into `target`.
///
/// Fields holding an array on either side use the vector handler with
/// `vector_code` (or `scalar_code` when none is given); the rest use the
/// scalar handler. `include_keys` adds keys the source lacks, which lets
/// unsetting codes remove them from `target`.
pub fn shallow_merge(
    target: &Object,
    source: &Object,
    scalar_code: UpdateCode,
    vector_code: Option<UpdateCode>,
    exclude_keys: &[&str],
    include_keys: &[&str],
) -> MergeResult<bool> {
    let mut keys = source.keys();
    for name in include_keys {
        let key = Key::from(*name);
        if !keys.contains(&key) {
            keys.push(key);
        }
    }
    keys.retain(|key| !key.as_name().is_some_and(|name| exclude_keys.contains(&name)));

    let mut changed = false;
    for key in &keys {
        let is_array = |object: &Object| matches!(object.get(key), Some(Value::Array(_)));
        let effect = if is_array(target) || is_array(source) {
            merge_vector_field(target, source, key, vector_code.unwrap_or(scalar_code))?
        } else {
            merge_scalar_field(target, source, key, scalar_code)?
        };
        changed |= effect;
    }
    debug!(keys = keys.len(), %scalar_code, changed, "shallow merge");
    Ok(changed)
}

/// [`shallow_merge`] into a deep copy of `target`.
pub fn immutable_merge(
    target: &Object,
    source: &Object,
    scalar_code: UpdateCode,
    vector_code: Option<UpdateCode>,
) -> MergeResult<Object> {
    let copy = deep_clone_object(target);
    shallow_merge(&copy, source, scalar_code, vector_code, &[], &[])?;
    Ok(copy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MergeError;
    use serde_json::json;
    use strata_types::deep_clone;

    fn obj(json: serde_json::Value) -> Object {
        match Value::from(json) {
            Value::Object(object) => object,
            other => panic!("expected object, got {:?}", other),
        }
    }

    fn val(object: Object) -> Value {
        Value::Object(object)
    }

    fn codes(json: serde_json::Value, source: &Object) -> ResolvedCodeMap {
        let config = MergeConfig::from_json(&json).unwrap();
        fill_update_codes(source, &config, false, &[]).unwrap()
    }

    #[test]
    fn scalar_codes_over_top_level_keys() {
        let lhs = obj(json!({"y": "t", "z": "t"}));
        let rhs = obj(json!({"x": "s", "z": "s"}));
        let cases = [
            (UpdateCode::B, json!({"x": "s", "y": "t", "z": "s"})),
            (UpdateCode::U, json!({"y": "t", "z": "s"})),
            (UpdateCode::H, json!({"y": "t", "z": "s"})),
            (UpdateCode::D, json!({"y": "t", "z": "t"})),
            (UpdateCode::I, json!({"x": "s", "y": "t", "z": "t"})),
            (UpdateCode::Y, json!({"x": "s", "y": "t", "z": "s"})),
            (UpdateCode::N, json!({"y": "t", "z": "t"})),
        ];
        for (code, expected) in cases {
            let merged = immutable_merge(&lhs, &rhs, code, None).unwrap();
            assert_eq!(val(merged), Value::from(expected), "{code}");
        }
    }

    #[test]
    fn scalar_unset_through_null_source() {
        let lhs = obj(json!({"y": "t", "z": "t", "d": "t"}));
        let rhs = obj(json!({"x": "s", "z": "s", "d": null}));
        let cases = [
            (UpdateCode::D, json!({"y": "t", "z": "t"})),
            (UpdateCode::U, json!({"y": "t", "z": "s"})),
            (UpdateCode::N, json!({"y": "t", "z": "t", "d": "t"})),
        ];
        for (code, expected) in cases {
            let merged = immutable_merge(&lhs, &rhs, code, None).unwrap();
            assert_eq!(val(merged), Value::from(expected), "{code}");
        }
    }

    #[test]
    fn vector_codes_over_top_level_keys() {
        let lhs = obj(json!({"a": ["11", "22", "33"], "tv": ["t"], "ts": "ts"}));
        let rhs = obj(json!({"a": ["33", "22", "44"], "tv": "s", "sv": ["11", "22", "11"], "ss": "ss"}));
        let (lhs_copy, rhs_copy) = (deep_clone(&val(lhs.clone())), deep_clone(&val(rhs.clone())));
        let field = |code: UpdateCode, name: &str| {
            let merged = immutable_merge(&lhs, &rhs, UpdateCode::B, Some(code)).unwrap();
            merged.get(&Key::from(name))
        };
        let arr = |json: serde_json::Value| Some(Value::from(json));

        assert_eq!(field(UpdateCode::XM, "a"), arr(json!(["11", "22", "33", "44"])));
        assert_eq!(field(UpdateCode::XD, "a"), arr(json!(["11"])));
        assert_eq!(field(UpdateCode::XI, "a"), arr(json!(["22", "33"])));

        assert_eq!(field(UpdateCode::XR, "tv"), arr(json!(["s"])));
        assert_eq!(field(UpdateCode::XS, "tv"), arr(json!(["t", "s"])));
        assert_eq!(field(UpdateCode::XF, "tv"), arr(json!(["s", "t"])));
        assert_eq!(field(UpdateCode::XM, "tv"), arr(json!(["t", "s"])));

        assert_eq!(field(UpdateCode::XM, "sv"), arr(json!(["11", "22"])));
        assert_eq!(field(UpdateCode::XD, "sv"), None);
        assert_eq!(field(UpdateCode::XI, "sv"), None);
        assert_eq!(field(UpdateCode::XS, "sv"), arr(json!(["11", "22", "11"])));

        assert_eq!(field(UpdateCode::XM, "ss"), arr(json!("ss")));
        assert_eq!(field(UpdateCode::XM, "ts"), arr(json!("ts")));

        assert_eq!(val(lhs), lhs_copy);
        assert_eq!(val(rhs), rhs_copy);
    }

    #[test]
    fn include_and_exclude_keys() {
        let target = obj(json!({"a": "t", "b": "t", "c": "t"}));
        let source = obj(json!({"b": "s", "c": "s"}));
        let changed =
            shallow_merge(&target, &source, UpdateCode::U, None, &["c"], &["a"]).unwrap();
        assert!(changed);
        assert_eq!(val(target), Value::from(json!({"b": "s", "c": "t"})));
    }

    #[test]
    fn detail_merge_with_exact_codes() {
        let deep_t = obj(json!({"oa": [{"x": "a"}, {"c": "z"}, {"b": "b"}], "o": {"z": ["a", "b"]}, "del": "x"}));
        let deep_s = obj(json!({"oa": [{"y": "b"}, {"b": "b"}], "o": {"z": ["c"]}, "del": null}));

        let n = codes(json!({"oa": "N", "o": "N", "del": "N"}), &deep_s);
        assert_eq!(val(immutable_detail_merge(&deep_t, &deep_s, &n).unwrap()), val(deep_t.clone()));
        let none = ResolvedCodeMap::new();
        assert_eq!(val(immutable_detail_merge(&deep_t, &deep_s, &none).unwrap()), val(deep_t.clone()));

        let y = codes(json!({"oa": "Y", "o": "Y", "del": "Y"}), &deep_s);
        assert_eq!(val(immutable_detail_merge(&deep_t, &deep_s, &y).unwrap()), val(deep_s.clone()));
        assert_eq!(val(immutable_detail_merge(&deep_t, &deep_t, &y).unwrap()), val(deep_t.clone()));

        let m = codes(json!({"oa": "XM", "o": "B", "del": "D"}), &deep_s);
        let merged = immutable_detail_merge(&deep_t, &deep_s, &m).unwrap();
        assert_eq!(merged.get(&Key::from("oa")).unwrap().as_array().unwrap().len(), 4);
        assert_eq!(merged.get(&Key::from("o")), deep_s.get(&Key::from("o")));
        assert!(!merged.contains_key(&Key::from("del")));

        let o = codes(json!({"oa": "XI", "o": {"z": "XF"}}), &deep_s);
        let merged = immutable_detail_merge(&deep_t, &deep_s, &o).unwrap();
        assert_eq!(merged.get(&Key::from("oa")), Some(Value::from(json!([{"b": "b"}]))));
        assert_eq!(merged.get(&Key::from("o")), Some(Value::from(json!({"z": ["c", "a", "b"]}))));
        assert_eq!(merged.get(&Key::from("del")), Some(Value::from("x")));
    }

    #[test]
    fn nested_object_missing_on_target_is_inserted_whole() {
        let target = obj(json!({}));
        let source = obj(json!({"obc": {"x": 1, "y": "z"}, "obe": {"x": 1}}));
        let map = codes(json!({"obc": {"x": "D", "y": "B"}, "obe": {"x": "D"}}), &source);
        assert!(detail_merge(&target, &source, &map).unwrap());
        assert_eq!(val(target), Value::from(json!({"obc": {"y": "z"}})));
    }

    #[test]
    fn custom_merge_with_globs() {
        let target = obj(json!({
            "sc": "t", "vc": ["1", "2"], "m": ["2"], "pAt2": 3, "sty": "s", "dme": "s",
            "ono": [{"a": "2"}], "obu": {"y": "t"}, "oba": {"z": [2]},
            "obx": {"l": 4}, "obd": {"d": 1}
        }));
        let source = obj(json!({
            "sc": "s", "vc": ["3", "1"], "m": ["3"], "pAt": "val", "pAt2": 2,
            "e1": null, "e3": {}, "e4": [], "dme": null,
            "ono": [{"a": "1"}, {"a": "2"}],
            "obs": {"x": 1, "y": "s"}, "obv": {"x": 2},
            "obu": {"z": 3}, "oba": {"z": 3}, "obn": {"z": 3},
            "obc": {"x": 1, "y": "z"}, "obx": {"p": ["1"], "l": 2}
        }));
        let config = MergeConfig::from_json(&json!({
            "m": "XF", "vc": "XI", "dme": "D", "ono": "XM", "vector": "N",
            "*A*": "I", "e*": "Y",
            "ob*": {"x": "B", "y": "N", "z": "XM"},
            "obv": "XM",
            "obc": {"x": "D", "y": "B"},
            "obx": {"vector": "XI"},
            "obd": {"d": "D"}
        }))
        .unwrap();
        let (target_copy, source_copy) = (deep_clone(&val(target.clone())), deep_clone(&val(source.clone())));

        let merged = immutable_custom_merge(&target, &source, &config).unwrap();
        assert_eq!(
            val(merged),
            Value::from(json!({
                "sc": "t", "vc": ["1"], "m": ["3", "2"], "pAt2": 3, "sty": "s",
                "ono": [{"a": "2"}, {"a": "1"}], "obu": {"y": "t", "z": [3]}, "oba": {"z": [2, 3]},
                "obx": {"l": 4}, "obd": {"d": 1},
                "pAt": "val", "e3": {}, "e4": [],
                "obs": {"x": 1}, "obv": [{"x": 2}], "obn": {"z": [3]}, "obc": {"y": "z"}
            }))
        );
        assert_eq!(val(target), target_copy);
        assert_eq!(val(source), source_copy);
    }

    #[test]
    fn kind_changes_are_rejected() {
        let target = obj(json!({"a": "text", "v": "scalar"}));
        let source = obj(json!({"a": 1, "v": ["x"]}));
        assert!(matches!(
            immutable_merge(&target, &obj(json!({"a": 1})), UpdateCode::B, None),
            Err(MergeError::TypeMismatch { .. })
        ));
        assert!(matches!(
            immutable_merge(&target, &obj(json!({"v": ["x"]})), UpdateCode::B, Some(UpdateCode::XM)),
            Err(MergeError::NotAVector { .. })
        ));
        let map = codes(json!({"scalar": "Y"}), &source);
        assert!(detail_merge(&target, &source, &map).is_err());
    }
}
