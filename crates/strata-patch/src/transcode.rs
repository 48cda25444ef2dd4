//! Diff-to-patch transcoding.

use strata_diff::{diff_with, ArrayItem, Change, DiffOptions};
use strata_types::{deep_clone, Value};
use tracing::debug;

use crate::operation::PatchOperation;
use crate::pointer::encode_pointer;

/// Convert a change list into a patch log.
///
/// `New` becomes `add`, `Edited` becomes `replace` and `Deleted` becomes
/// `remove`. Array tail ops become `add`/`remove` at `path/index`. With
/// `store_prev`, `replace` and `remove` entries keep the value they displace.
/// Values are deep-cloned so the log never aliases the diffed inputs.
pub fn diff_to_patch_log(changes: &[Change], store_prev: bool) -> Vec<PatchOperation> {
    let prev = |lhs: &Value| store_prev.then(|| deep_clone(lhs));
    changes
        .iter()
        .map(|change| match change {
            Change::New { path, rhs } => PatchOperation::add(encode_pointer(path), deep_clone(rhs)),
            Change::Edited { path, lhs, rhs } => {
                PatchOperation::replace(encode_pointer(path), deep_clone(rhs), prev(lhs))
            }
            Change::Deleted { path, lhs } => PatchOperation::remove(encode_pointer(path), prev(lhs)),
            Change::Array { path, index, item } => {
                let pointer = format!("{}/{index}", encode_pointer(path));
                match item {
                    ArrayItem::New { rhs } => PatchOperation::add(pointer, deep_clone(rhs)),
                    ArrayItem::Deleted { lhs } => PatchOperation::remove(pointer, prev(lhs)),
                }
            }
        })
        .collect()
}

/// Diff two values straight into a patch log. Empty when they do not differ.
pub fn deep_patch_log(
    lhs: &Value,
    rhs: &Value,
    order_independent: bool,
    store_prev: bool,
) -> Vec<PatchOperation> {
    let options = DiffOptions::new().order_independent(order_independent);
    let log = diff_with(lhs, rhs, options)
        .map(|changes| diff_to_patch_log(&changes, store_prev))
        .unwrap_or_default();
    debug!(entries = log.len(), order_independent, "patch log built");
    log
}
