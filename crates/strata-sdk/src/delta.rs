//! Delta objects and one-shot patch logs.

use strata_diff::{apply_change, diff_with, DiffOptions};
use strata_merge::{immutable_merge, UpdateCode};
use strata_patch::{deep_patch_log, PatchOperation};
use strata_types::{flatten, Object, Value};
use tracing::debug;

use crate::error::SdkResult;

/// The parts of `rhs` that differ from `lhs`, as a sparse object.
///
/// Every change is applied onto an empty object. Deletions leave nothing
/// behind, and the `null` holes that sparse array writes leave in top-level
/// arrays are dropped.
pub fn diff_typed(lhs: &Object, rhs: &Object, order_independent: bool) -> SdkResult<Object> {
    let delta = Object::new();
    let options = DiffOptions::new().order_independent(order_independent);
    let changes = diff_with(
        &Value::Object(lhs.clone()),
        &Value::Object(rhs.clone()),
        options,
    )
    .unwrap_or_default();

    let mut root = Value::Object(delta.clone());
    for change in &changes {
        apply_change(&mut root, change)?;
    }
    for key in delta.keys() {
        if let Some(Value::Array(items)) = delta.get(&key) {
            items.borrow_mut().retain(|item| !item.is_null());
        }
    }
    debug!(changes = changes.len(), keys = delta.len(), "typed delta built");
    Ok(delta)
}

/// The delta a shallow merge of `source` would make to `target`, or `None`
/// when it would change nothing. Neither input is modified.
pub fn diff_from_merge(
    target: &Object,
    source: &Object,
    scalar_code: UpdateCode,
    vector_code: Option<UpdateCode>,
) -> SdkResult<Option<Object>> {
    let merged = immutable_merge(target, source, scalar_code, vector_code)?;
    let delta = diff_typed(target, &merged, false)?;
    Ok((!delta.is_empty()).then_some(delta))
}

/// Compare two flat objects key by key.
///
/// Returns `(updated, removed)`: `updated` holds the entries of `old` and
/// `removed` the entries of `new`, each minus the keys whose values are
/// identical on both sides. Containers are identical only when they are the
/// same handle, so pass `flatten_first` to compare nested objects leaf by
/// leaf under dot-joined keys.
pub fn diff_flat(old: &Object, new: &Object, flatten_first: bool) -> (Object, Object) {
    let (old, new) = if flatten_first {
        (flatten(old), flatten(new))
    } else {
        (old.clone(), new.clone())
    };
    let updated = Object::from_map(old.borrow().clone());
    let removed = Object::from_map(new.borrow().clone());
    for key in new.keys() {
        let unchanged = match (old.get(&key), new.get(&key)) {
            (Some(before), Some(after)) => before.is_same(&after),
            _ => false,
        };
        if unchanged {
            updated.remove(&key);
            removed.remove(&key);
        }
    }
    debug!(updated = updated.len(), removed = removed.len(), "flat diff built");
    (updated, removed)
}

/// Diff `lhs` against `rhs` straight into a patch log, without `prev`
/// values.
pub fn deep_diff_patch(lhs: &Value, rhs: &Value, order_independent: bool) -> Vec<PatchOperation> {
    deep_patch_log(lhs, rhs, order_independent, false)
}
