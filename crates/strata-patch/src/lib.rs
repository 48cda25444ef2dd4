//! Patch logs for Strata.
//!
//! A patch log is a JSON-Patch compatible list of pointer-addressed
//! operations, extended with the value each entry displaced so the log can be
//! replayed in either direction. Logs are produced from diffs and replayed
//! idempotently onto [`strata_types::Value`] trees.
//!
//! # Key Types
//!
//! - [`PatchOperation`] / [`PatchOp`] -- One log entry and its operation kind
//! - [`deep_patch_log`] -- Diff two values straight into a log
//! - [`apply_patch_log`] / [`revert_patch_log`] -- Replay a log forward or backward

pub mod error;
pub mod operation;
pub mod pointer;
pub mod replay;
pub mod transcode;

pub use error::{PatchError, PatchResult};
pub use operation::{PatchOp, PatchOperation};
pub use pointer::{decode_pointer, encode_pointer, escape_segment, resolve_token, unescape_segment};
pub use replay::{apply_patch_log, revert_patch_log};
pub use transcode::{deep_patch_log, diff_to_patch_log};
