//! Writing changes back into a value.
//!
//! [`apply_change`] moves a target from the left-hand state toward the
//! right-hand state of a change; [`revert_change`] moves it back. Values are
//! deep-cloned on write so the target never aliases the diffed inputs.

use strata_types::{deep_clone, format_path, PathSegment, Value};
use tracing::trace;

use crate::change::{ArrayItem, Change};
use crate::differ::{accumulate_diff, DiffOptions};
use crate::error::{DiffError, DiffResult};

/// Apply one change to `target` in place.
///
/// Missing intermediate containers are created on the way down: an array
/// when the following path step is an index, otherwise an object.
pub fn apply_change(target: &mut Value, change: &Change) -> DiffResult<()> {
    trace!(change = %change, "applying change");
    let Some((last, parents)) = change.path().split_last() else {
        match change {
            Change::New { rhs, .. } | Change::Edited { rhs, .. } => *target = deep_clone(rhs),
            Change::Deleted { .. } => *target = Value::Null,
            Change::Array { index, item, .. } => apply_array_item(target, *index, item)?,
        }
        return Ok(());
    };

    let path = change.path();
    let mut node = target.clone();
    for (depth, segment) in parents.iter().enumerate() {
        let next_is_index = matches!(path[depth + 1], PathSegment::Index(_));
        node = node.vivify_child(segment, next_is_index)?;
    }

    match change {
        Change::New { rhs, .. } | Change::Edited { rhs, .. } => {
            node.set_child(last, deep_clone(rhs))?;
        }
        Change::Deleted { .. } => {
            node.remove_child(last)?;
        }
        Change::Array { index, item, .. } => {
            let array = node.vivify_child(last, true)?;
            apply_array_item(&array, *index, item)?;
        }
    }
    Ok(())
}

/// Undo one change on `target` in place.
///
/// Reverting never creates containers; a path the target lacks is an error.
pub fn revert_change(target: &mut Value, change: &Change) -> DiffResult<()> {
    trace!(change = %change, "reverting change");
    let path = change.path();
    let Some((last, parents)) = path.split_last() else {
        match change {
            Change::New { .. } => *target = Value::Null,
            Change::Deleted { lhs, .. } | Change::Edited { lhs, .. } => *target = deep_clone(lhs),
            Change::Array { index, item, .. } => revert_array_item(target, *index, item)?,
        }
        return Ok(());
    };

    let mut node = target.clone();
    for (depth, segment) in parents.iter().enumerate() {
        node = node.child(segment).ok_or_else(|| DiffError::PathNotFound {
            path: format_path(&path[..=depth]),
        })?;
    }

    match change {
        Change::New { .. } => {
            node.remove_child(last)?;
        }
        Change::Deleted { lhs, .. } | Change::Edited { lhs, .. } => {
            node.set_child(last, deep_clone(lhs))?;
        }
        Change::Array { index, item, .. } => {
            let array = node.child(last).ok_or_else(|| DiffError::PathNotFound {
                path: format_path(path),
            })?;
            revert_array_item(&array, *index, item)?;
        }
    }
    Ok(())
}

fn apply_array_item(array: &Value, index: usize, item: &ArrayItem) -> DiffResult<()> {
    let slot = PathSegment::Index(index);
    match item {
        ArrayItem::New { rhs } => {
            array.set_child(&slot, deep_clone(rhs))?;
        }
        ArrayItem::Deleted { .. } => {
            array.remove_child(&slot)?;
        }
    }
    Ok(())
}

fn revert_array_item(array: &Value, index: usize, item: &ArrayItem) -> DiffResult<()> {
    let slot = PathSegment::Index(index);
    match item {
        ArrayItem::New { .. } => {
            array.remove_child(&slot)?;
        }
        ArrayItem::Deleted { lhs } => {
            array.set_child(&slot, deep_clone(lhs))?;
        }
    }
    Ok(())
}

/// Diff `target` against `source` and apply every change onto `target`.
pub fn apply_diff(target: &mut Value, source: &Value) -> DiffResult<()> {
    apply_diff_filtered(target, source, |_, _, _| true)
}

/// Like [`apply_diff`], applying only the changes `filter` accepts. The
/// filter sees the target as it stands before each change.
pub fn apply_diff_filtered<F>(target: &mut Value, source: &Value, mut filter: F) -> DiffResult<()>
where
    F: FnMut(&Value, &Value, &Change) -> bool,
{
    let mut changes = Vec::new();
    accumulate_diff(target, source, DiffOptions::default(), &mut changes);
    for change in &changes {
        if filter(target, source, change) {
            apply_change(target, change)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::differ::diff;
    use serde_json::json;

    fn v(json: serde_json::Value) -> Value {
        Value::from(json)
    }

    fn nested_pair() -> (Value, Value) {
        (
            v(json!({
                "noChange": "same",
                "levelOne": {"levelTwo": "value"},
                "arrayOne": [{"objValue": "value"}]
            })),
            v(json!({
                "noChange": "same",
                "levelOne": {"levelTwo": "another value"},
                "arrayOne": [{"objValue": "new value"}, {"objValue": "more value"}]
            })),
        )
    }

    #[test]
    fn apply_onto_empty_object_builds_nested_containers() {
        let (one, two) = nested_pair();
        let changes = diff(&one, &two).unwrap();

        let mut result = Value::object();
        apply_change(&mut result, &changes[0]).unwrap();
        assert_eq!(result, v(json!({"levelOne": {"levelTwo": "another value"}})));

        let mut result = Value::object();
        apply_change(&mut result, &changes[2]).unwrap();
        assert_eq!(result, v(json!({"arrayOne": [{"objValue": "new value"}]})));

        let mut result = Value::object();
        apply_change(&mut result, &changes[1]).unwrap();
        assert_eq!(result, v(json!({"arrayOne": [null, {"objValue": "more value"}]})));
    }

    #[test]
    fn applied_values_do_not_alias_the_source() {
        let lhs = v(json!({}));
        let rhs = v(json!({"list": [1]}));
        let changes = diff(&lhs, &rhs).unwrap();

        let mut target = v(json!({}));
        apply_change(&mut target, &changes[0]).unwrap();
        rhs.lookup(&["list".into()]).unwrap().as_array().unwrap().push(Value::from(2));
        assert_eq!(target, v(json!({"list": [1]})));
    }

    #[test]
    fn apply_diff_reorders_nested_arrays() {
        let mut lhs = v(json!({
            "id": "Release",
            "phases": [
                {"id": "Phase1", "tasks": [{"id": "Task1"}, {"id": "Task2"}]},
                {"id": "Phase2", "tasks": [{"id": "Task3"}]}
            ]
        }));
        let rhs = v(json!({
            "id": "Release",
            "phases": [
                {"id": "Phase2", "tasks": [{"id": "Task3"}]},
                {"id": "Phase1", "tasks": [{"id": "Task1"}, {"id": "Task2"}]}
            ]
        }));
        apply_diff(&mut lhs, &rhs).unwrap();
        assert_eq!(lhs, rhs);
    }

    #[test]
    fn apply_and_revert_top_level_array() {
        let mut target = v(json!(["a", "a", "a"]));
        let changes = diff(&target, &v(json!(["a"]))).unwrap();

        for change in &changes {
            apply_change(&mut target, change).unwrap();
        }
        assert_eq!(target, v(json!(["a"])));

        for change in &changes {
            revert_change(&mut target, change).unwrap();
        }
        assert_eq!(target, v(json!(["a", "a", "a"])));
    }

    #[test]
    fn revert_restores_edits_and_removes_additions() {
        let original = v(json!({"a": 1, "b": {"c": "x"}}));
        let updated = v(json!({"a": 2, "b": {"c": "x", "d": true}}));
        let changes = diff(&original, &updated).unwrap();

        let mut target = strata_types::deep_clone(&updated);
        for change in changes.iter().rev() {
            revert_change(&mut target, change).unwrap();
        }
        assert_eq!(target, original);
    }

    #[test]
    fn revert_does_not_create_paths() {
        let change = Change::Edited {
            path: vec!["missing".into(), "leaf".into()],
            lhs: Value::from(1),
            rhs: Value::from(2),
        };
        let mut target = v(json!({}));
        match revert_change(&mut target, &change) {
            Err(DiffError::PathNotFound { path }) => assert_eq!(path, "missing"),
            other => panic!("expected PathNotFound, got {:?}", other),
        }
        assert_eq!(target, v(json!({})));
    }

    #[test]
    fn root_changes_replace_the_target() {
        let mut target = Value::regex("foo", "");
        let changes = diff(&target, &Value::regex("foo", "i")).unwrap();
        apply_change(&mut target, &changes[0]).unwrap();
        assert_eq!(target, Value::regex("foo", "i"));
        revert_change(&mut target, &changes[0]).unwrap();
        assert_eq!(target, Value::regex("foo", ""));
    }

    #[test]
    fn filtered_apply_skips_rejected_changes() {
        let mut target = v(json!({"keep": 1, "take": 1}));
        let source = v(json!({"keep": 2, "take": 2}));
        apply_diff_filtered(&mut target, &source, |_, _, change| {
            change.path().first().is_some_and(|seg| seg == "take")
        })
        .unwrap();
        assert_eq!(target, v(json!({"keep": 1, "take": 2})));
    }

    #[test]
    fn scalar_parent_is_an_access_error() {
        let change = Change::New {
            path: vec!["a".into(), "b".into()],
            rhs: Value::from(1),
        };
        let mut target = v(json!({"a": "text"}));
        assert!(matches!(
            apply_change(&mut target, &change),
            Err(DiffError::Access(_))
        ));
    }
}
