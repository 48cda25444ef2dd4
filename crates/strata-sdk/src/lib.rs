//! High-level SDK for Strata.
//!
//! Combines diffing, patch logs and configured merges into the flows an
//! application embedding Strata uses directly: merge a source into a target
//! and get back a replayable log of what changed, or compute the delta a
//! merge would produce without touching either side.

pub mod delta;
pub mod error;
pub mod merge_patch;

pub use delta::{deep_diff_patch, diff_flat, diff_from_merge, diff_typed};
pub use error::{SdkError, SdkResult};
pub use merge_patch::{
    bypass_merge_patch, custom_merge_patch, deep_merge_log, merge_log_to_patch_log,
    select_path_code, MergeLogEntry,
};

// Re-export key types
pub use strata_diff::{diff, diff_with, Change, DiffOptions};
pub use strata_merge::{ConfigValue, MergeConfig, ResolvedCodeMap, UpdateCode};
pub use strata_patch::{apply_patch_log, revert_patch_log, PatchOp, PatchOperation};
pub use strata_types::{Key, Object, Value};
