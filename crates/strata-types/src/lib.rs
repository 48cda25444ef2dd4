//! Foundation types for Strata.
//!
//! This crate provides the dynamically-typed value model shared by every other
//! Strata crate: tree values with shared, identity-carrying containers, object
//! keys, path segments, and the structural clone/equality services the diff,
//! merge, and patch engines are built on.
//!
//! # Key Types
//!
//! - [`Value`] -- Closed tagged union of nullish, scalar, array, object, date, and regex values
//! - [`Array`] / [`Object`] -- Shared container handles; cloning aliases, [`deep_clone`] copies
//! - [`Key`] / [`Symbol`] -- Object keys (string names or identity-unique symbols)
//! - [`PathSegment`] -- One step of a path from a root value to a nested value
//! - [`ValueKind`] / [`TypeClass`] -- Real-type classification used for dispatch
//! - [`flatten`] / [`unflatten`] -- Dot-keyed views of nested objects

pub mod access;
pub mod error;
pub mod flat;
pub mod kind;
pub mod map;
pub mod ops;
pub mod path;
pub mod value;

pub use error::{Result, TypeError};
pub use flat::{flatten, unflatten};
pub use kind::{classify, TypeClass, ValueKind};
pub use map::Map;
pub use ops::{deep_clone, deep_clone_object, deep_equals, is_empty_value};
pub use path::{format_path, Path, PathSegment};
pub use value::{Array, Key, NodeId, Object, RegexLiteral, Symbol, Value};
