//! Diff engine for Strata.
//!
//! Computes structural differences between two [`strata_types::Value`] trees
//! and writes them back: a recursive differ with cycle detection and an
//! order-independent mode, a commutative hash used to sort arrays for that
//! mode, and apply/revert primitives for individual changes.
//!
//! # Key Types
//!
//! - [`Change`] / [`ArrayItem`] -- One difference (new, deleted, edited, array tail op)
//! - [`DiffOptions`] / [`PreFilter`] -- Per-key skip/normalize hooks and order-independent mode
//! - [`Accumulator`] -- Sink that receives changes as they are found
//! - [`order_independent_hash`] -- Commutative hash over arrays and objects

pub mod apply;
pub mod change;
pub mod differ;
pub mod error;
pub mod hash;

pub use apply::{apply_change, apply_diff, apply_diff_filtered, revert_change};
pub use change::{ArrayItem, Change, ChangeKind};
pub use differ::{
    accumulate_diff, diff, diff_with, observable_diff, order_independent_diff, Accumulator,
    DiffOptions, PreFilter,
};
pub use error::{DiffError, DiffResult};
pub use hash::order_independent_hash;
