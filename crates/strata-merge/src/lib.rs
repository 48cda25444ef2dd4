//! Merge engine for Strata.
//!
//! Merges a source object into a target object field by field. Each field is
//! governed by an [`UpdateCode`]: scalar codes decide whether a value may be
//! inserted, updated or removed, and vector codes combine arrays as sets or
//! sequences. A [`MergeConfig`] assigns codes by exact key, `*` glob, or
//! value kind, and is resolved against a concrete source before merging.
//!
//! # Key Types
//!
//! - [`UpdateCode`] / [`UpdateCodeInfo`] -- Field merge policies and their capabilities
//! - [`MergeConfig`] / [`ConfigValue`] -- Policy configuration (code, JSON, or TOML)
//! - [`ResolvedCodeMap`] / [`CodeEntry`] -- Glob-free policy for one source object
//! - [`detail_merge`] / [`shallow_merge`] -- In-place merges, with `immutable_*` copies

pub mod code;
pub mod config;
pub mod detail;
pub mod error;
pub mod field;
pub mod resolve;

pub use code::{UpdateCode, UpdateCodeInfo};
pub use config::{is_glob, ConfigValue, MergeConfig};
pub use detail::{
    detail_merge, immutable_custom_merge, immutable_detail_merge, immutable_merge, shallow_merge,
};
pub use error::{MergeError, MergeResult};
pub use field::{merge_scalar_field, merge_vector_field};
pub use resolve::{fill_update_codes, glob_matcher, CodeEntry, ResolvedCodeMap};
