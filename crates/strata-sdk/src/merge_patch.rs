//! Merges that report what they changed.
//!
//! Each entry point merges `source` into `target` in place and returns a
//! merge log: the patch log from the old target to the new one, with paths
//! rendered dot-separated and every entry tagged with the update code that
//! governed it. `None` means nothing was merged.

use serde::{Deserialize, Serialize};
use strata_merge::{
    detail_merge, fill_update_codes, CodeEntry, ConfigValue, MergeConfig, ResolvedCodeMap,
    UpdateCode,
};
use strata_patch::{decode_pointer, deep_patch_log, escape_segment, PatchOp, PatchOperation};
use strata_types::{deep_clone, deep_clone_object, Key, Object, Value};
use tracing::debug;

use crate::error::SdkResult;

/// One entry of a merge log.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MergeLogEntry {
    /// Dot-separated path of the changed field.
    pub path: String,
    pub op: PatchOp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev: Option<Value>,
    /// Code governing the field at `path`.
    pub code: UpdateCode,
}

impl MergeLogEntry {
    /// The equivalent patch entry, with `path` re-encoded as a pointer.
    /// Field names containing `.` do not survive the dot-separated form.
    pub fn to_patch_operation(&self) -> PatchOperation {
        let pointer = if self.path.is_empty() {
            String::new()
        } else {
            self.path
                .split('.')
                .map(|part| format!("/{}", escape_segment(part)))
                .collect()
        };
        PatchOperation {
            path: pointer,
            op: self.op,
            value: self.value.clone(),
            prev: self.prev.clone(),
        }
    }
}

/// Patch form of a whole merge log.
pub fn merge_log_to_patch_log(log: &[MergeLogEntry]) -> Vec<PatchOperation> {
    log.iter().map(MergeLogEntry::to_patch_operation).collect()
}

/// Merge `source` into `target` under `policy` and log the result.
///
/// A bare code short-circuits: `C` and `N` merge nothing and return `None`,
/// `T` returns an empty log, `Y` is [`bypass_merge_patch`]. Any other bare
/// code is used as the scalar default.
pub fn custom_merge_patch(
    target: &Object,
    source: &Object,
    policy: &ConfigValue,
    exclude_keys: &[&str],
) -> SdkResult<Option<Vec<MergeLogEntry>>> {
    let scalar_only;
    let config = match policy {
        ConfigValue::Code(UpdateCode::C | UpdateCode::N) => return Ok(None),
        ConfigValue::Code(UpdateCode::T) => return Ok(Some(Vec::new())),
        ConfigValue::Code(UpdateCode::Y) => return bypass_merge_patch(target, source),
        ConfigValue::Code(code) => {
            scalar_only = MergeConfig::from(*code);
            &scalar_only
        }
        ConfigValue::Nested(config) => config,
    };

    let codes = fill_update_codes(source, config, false, exclude_keys)?;
    if codes.is_empty() {
        return Ok(None);
    }
    let before = Value::Object(deep_clone_object(target));
    let changed = detail_merge(target, source, &codes)?;
    let log = deep_merge_log(&before, &Value::Object(target.clone()), Some(&codes))?;
    debug!(entries = log.len(), changed, "custom merge patch");
    Ok((changed || !log.is_empty()).then_some(log))
}

/// Assign every top-level source field onto `target` and log the result
/// with code `Y`.
pub fn bypass_merge_patch(
    target: &Object,
    source: &Object,
) -> SdkResult<Option<Vec<MergeLogEntry>>> {
    let keys = source.keys();
    if keys.is_empty() {
        return Ok(None);
    }
    let codes = ResolvedCodeMap::uniform(keys.iter().cloned(), UpdateCode::Y);
    let before = Value::Object(deep_clone_object(target));
    for key in keys {
        let value = source.get(&key).unwrap_or_default();
        target.insert(key, deep_clone(&value));
    }
    let log = deep_merge_log(&before, &Value::Object(target.clone()), Some(&codes))?;
    debug!(entries = log.len(), "bypass merge patch");
    Ok((!log.is_empty()).then_some(log))
}

/// The merge log from `before` to `after`.
///
/// With `codes`, each entry carries [`select_path_code`] for its path.
/// Without, the code follows the operation: `add` is `I`, `replace` is `H`,
/// `remove` is `D` and `test` is `N`.
pub fn deep_merge_log(
    before: &Value,
    after: &Value,
    codes: Option<&ResolvedCodeMap>,
) -> SdkResult<Vec<MergeLogEntry>> {
    deep_patch_log(before, after, false, true)
        .into_iter()
        .map(|entry| -> SdkResult<MergeLogEntry> {
            let parts = decode_pointer(&entry.path)?;
            let code = match codes {
                Some(codes) => select_path_code(codes, &parts),
                None => op_code(entry.op),
            };
            Ok(MergeLogEntry {
                path: parts.join("."),
                op: entry.op,
                value: entry.value,
                prev: entry.prev,
                code,
            })
        })
        .collect()
}

fn op_code(op: PatchOp) -> UpdateCode {
    match op {
        PatchOp::Add => UpdateCode::I,
        PatchOp::Replace => UpdateCode::H,
        PatchOp::Remove => UpdateCode::D,
        PatchOp::Test => UpdateCode::N,
    }
}

/// The code that governs `parts` in `codes`.
///
/// Walks nested maps along the path and returns the first plain code met.
/// A path that leaves the map is `N`; one that ends on a nested map is `I`.
pub fn select_path_code<S: AsRef<str>>(codes: &ResolvedCodeMap, parts: &[S]) -> UpdateCode {
    let mut current = codes;
    for (depth, part) in parts.iter().enumerate() {
        match current.get(&Key::from(part.as_ref())) {
            None => return UpdateCode::N,
            Some(CodeEntry::Code(code)) => return *code,
            Some(CodeEntry::Nested(_)) if depth + 1 == parts.len() => return UpdateCode::I,
            Some(CodeEntry::Nested(nested)) => current = nested,
        }
    }
    UpdateCode::N
}
