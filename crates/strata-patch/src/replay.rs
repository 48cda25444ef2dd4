//! Replaying patch logs onto values.
//!
//! Both directions walk the log front to back and are idempotent: an entry
//! whose effect is already present is skipped, so replaying a log twice
//! reports no change the second time.

use strata_types::{deep_clone, PathSegment, TypeError, Value};
use tracing::{debug, trace};

use crate::error::{PatchError, PatchResult};
use crate::operation::{PatchOp, PatchOperation};
use crate::pointer::{decode_pointer, is_index_token, resolve_token};

/// Apply `log` to `target` in place. Returns whether anything changed.
///
/// `test` entries are not evaluated. `add`/`replace` create missing
/// intermediate containers; `remove` on a missing path does nothing.
pub fn apply_patch_log(log: &[PatchOperation], target: &mut Value) -> PatchResult<bool> {
    let mut changed = false;
    for entry in log {
        let tokens = decode_pointer(&entry.path)?;
        let effect = match entry.op {
            PatchOp::Test => false,
            PatchOp::Remove => unset(target, &tokens, &entry.path)?,
            PatchOp::Add | PatchOp::Replace => {
                write(target, &tokens, &entry.value_or_null(), &entry.path)?
            }
        };
        trace!(op = %entry.op, path = %entry.path, effect, "apply entry");
        changed |= effect;
    }
    debug!(entries = log.len(), changed, "patch log applied");
    Ok(changed)
}

/// Undo `log` on `target` in place. Returns whether anything changed.
///
/// `add` entries are removed and `remove`/`replace` entries restore their
/// `prev` value. Entries recorded without `prev` are skipped.
pub fn revert_patch_log(log: &[PatchOperation], target: &mut Value) -> PatchResult<bool> {
    let mut changed = false;
    for entry in log {
        let tokens = decode_pointer(&entry.path)?;
        let effect = match (entry.op, &entry.prev) {
            (PatchOp::Add, _) => unset(target, &tokens, &entry.path)?,
            (PatchOp::Remove | PatchOp::Replace, Some(prev)) => {
                write(target, &tokens, prev, &entry.path)?
            }
            (PatchOp::Remove | PatchOp::Replace, None) | (PatchOp::Test, _) => false,
        };
        trace!(op = %entry.op, path = %entry.path, effect, "revert entry");
        changed |= effect;
    }
    debug!(entries = log.len(), changed, "patch log reverted");
    Ok(changed)
}

fn unreachable_at(pointer: &str) -> impl FnOnce(TypeError) -> PatchError + '_ {
    move |source| PatchError::Unreachable {
        path: pointer.to_string(),
        source,
    }
}

/// The value at `tokens`, if every step exists.
fn read(target: &Value, tokens: &[String]) -> Option<Value> {
    tokens.iter().try_fold(target.clone(), |node, token| {
        let segment = resolve_token(&node, token);
        node.child(&segment)
    })
}

/// Write a deep copy of `value` at `tokens` unless an equal value is already
/// there.
fn write(target: &mut Value, tokens: &[String], value: &Value, pointer: &str) -> PatchResult<bool> {
    if read(target, tokens).is_some_and(|current| current == *value) {
        return Ok(false);
    }
    let Some((last, parents)) = tokens.split_last() else {
        *target = deep_clone(value);
        return Ok(true);
    };

    let mut node = target.clone();
    for (depth, token) in parents.iter().enumerate() {
        let segment = resolve_token(&node, token);
        let next_is_index = is_index_token(&tokens[depth + 1]);
        node = node
            .vivify_child(&segment, next_is_index)
            .map_err(unreachable_at(pointer))?;
    }
    let segment = resolve_token(&node, last);
    node.set_child(&segment, deep_clone(value))
        .map_err(unreachable_at(pointer))?;
    Ok(true)
}

/// Remove the value at `tokens`. The root and missing paths are left alone.
fn unset(target: &Value, tokens: &[String], pointer: &str) -> PatchResult<bool> {
    let Some((last, parents)) = tokens.split_last() else {
        return Ok(false);
    };
    let Some(parent) = read(target, parents) else {
        return Ok(false);
    };
    if !parent.kind().is_container() {
        return Ok(false);
    }
    let segment = resolve_token(&parent, last);
    if matches!(parent, Value::Array(_)) && !matches!(segment, PathSegment::Index(_)) {
        return Ok(false);
    }
    let removed = parent.remove_child(&segment).map_err(unreachable_at(pointer))?;
    Ok(removed.is_some())
}
