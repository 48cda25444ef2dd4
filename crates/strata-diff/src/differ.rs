//! Recursive structural diff between two values.
//!
//! The walk visits both trees in lockstep and records a [`Change`] for every
//! point where they diverge. Output order is a deterministic pre-order: array
//! tail operations come before the per-index recursion (which runs from the
//! last shared index down to zero), object keys follow the left-hand side's
//! enumeration order, and keys only the right-hand side has come last.
//!
//! Container identity guards against cycles: re-entering a left-hand container
//! that is already being compared records at most one [`Change::Edited`] and
//! stops.

use strata_types::{NodeId, Path, PathSegment, Value};
use tracing::{debug, trace};

use crate::change::{ArrayItem, Change};
use crate::hash::order_independent_hash;

/// Hook consulted before each keyed step of the walk.
///
/// Any `Fn(&[PathSegment], &PathSegment) -> bool` closure is a prefilter that
/// only skips.
pub trait PreFilter {
    /// Returns `true` to leave `key` (and everything beneath it) out of the
    /// diff. `path` is the parent's path.
    fn skip(&self, _path: &[PathSegment], _key: &PathSegment) -> bool {
        false
    }

    /// Substitute the two sides compared under `key`. `None` keeps them as
    /// they are. The substitution applies only within that subtree.
    fn normalize(
        &self,
        _path: &[PathSegment],
        _key: &PathSegment,
        _lhs: Option<&Value>,
        _rhs: Option<&Value>,
    ) -> Option<(Option<Value>, Option<Value>)> {
        None
    }
}

impl<F> PreFilter for F
where
    F: Fn(&[PathSegment], &PathSegment) -> bool,
{
    fn skip(&self, path: &[PathSegment], key: &PathSegment) -> bool {
        self(path, key)
    }
}

/// Sink for changes as the differ produces them.
pub trait Accumulator {
    fn push(&mut self, change: Change);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Accumulator for Vec<Change> {
    fn push(&mut self, change: Change) {
        Vec::push(self, change);
    }

    fn len(&self) -> usize {
        Vec::len(self)
    }
}

/// Knobs shared by every diff entry point.
#[derive(Clone, Copy, Default)]
pub struct DiffOptions<'a> {
    /// Optional per-key skip/normalize hook.
    pub prefilter: Option<&'a dyn PreFilter>,
    /// Compare arrays as multisets: both sides are stably sorted by
    /// [`order_independent_hash`] before index-wise comparison.
    pub order_independent: bool,
}

impl<'a> DiffOptions<'a> {
    /// Ordered comparison with no prefilter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Consult `prefilter` before descending into each child.
    pub fn with_prefilter(mut self, prefilter: &'a dyn PreFilter) -> Self {
        self.prefilter = Some(prefilter);
        self
    }

    /// Compare arrays as multisets when `enabled`.
    pub fn order_independent(mut self, enabled: bool) -> Self {
        self.order_independent = enabled;
        self
    }
}

/// Diff two values. Returns `None` when they do not differ.
pub fn diff(lhs: &Value, rhs: &Value) -> Option<Vec<Change>> {
    diff_with(lhs, rhs, DiffOptions::default())
}

/// Diff two values, treating array element order as insignificant.
pub fn order_independent_diff(lhs: &Value, rhs: &Value) -> Option<Vec<Change>> {
    diff_with(lhs, rhs, DiffOptions::new().order_independent(true))
}

/// Diff two values under explicit options. Returns `None` when they do not
/// differ.
pub fn diff_with(lhs: &Value, rhs: &Value, options: DiffOptions<'_>) -> Option<Vec<Change>> {
    let mut changes = Vec::new();
    accumulate_diff(lhs, rhs, options, &mut changes);
    (!changes.is_empty()).then_some(changes)
}

/// Stream every change into a caller-supplied accumulator.
pub fn accumulate_diff<A>(lhs: &Value, rhs: &Value, options: DiffOptions<'_>, accumulator: &mut A)
where
    A: Accumulator + ?Sized,
{
    let before = accumulator.len();
    let mut walker = Walker {
        options,
        sink: accumulator,
        ancestors: Vec::new(),
    };
    let mut path = Path::new();
    walker.compare(&mut path, Some(lhs.clone()), Some(rhs.clone()));
    debug!(
        changes = walker.sink.len() - before,
        order_independent = options.order_independent,
        "diff computed"
    );
}

/// Diff two values, handing each change to `observer` once the walk is
/// complete. Returns the full list (empty when the values do not differ).
pub fn observable_diff<F>(lhs: &Value, rhs: &Value, mut observer: F, options: DiffOptions<'_>) -> Vec<Change>
where
    F: FnMut(&Change),
{
    let mut changes = Vec::new();
    accumulate_diff(lhs, rhs, options, &mut changes);
    changes.iter().for_each(&mut observer);
    changes
}

struct Walker<'o, 's, A: ?Sized> {
    options: DiffOptions<'o>,
    sink: &'s mut A,
    /// Left-hand containers currently being compared.
    ancestors: Vec<NodeId>,
}

impl<A: Accumulator + ?Sized> Walker<'_, '_, A> {
    fn record(&mut self, change: Change) {
        trace!(change = %change, "change recorded");
        self.sink.push(change);
    }

    /// Step into `key` under `path` and compare the two sides found there.
    fn step(&mut self, path: &mut Path, key: PathSegment, mut lhs: Option<Value>, mut rhs: Option<Value>) {
        if let Some(prefilter) = self.options.prefilter {
            if prefilter.skip(path, &key) {
                return;
            }
            if let Some((l, r)) = prefilter.normalize(path, &key, lhs.as_ref(), rhs.as_ref()) {
                lhs = l;
                rhs = r;
            }
        }
        path.push(key);
        self.compare(path, lhs, rhs);
        path.pop();
    }

    fn compare(&mut self, path: &mut Path, lhs: Option<Value>, rhs: Option<Value>) {
        let (lhs, rhs) = match (lhs, rhs) {
            (None, None) => return,
            (None, Some(rhs)) => {
                self.record(Change::New {
                    path: path.clone(),
                    rhs,
                });
                return;
            }
            (Some(lhs), None) => {
                self.record(Change::Deleted {
                    path: path.clone(),
                    lhs,
                });
                return;
            }
            (Some(lhs), Some(rhs)) => (lhs, rhs),
        };

        if lhs.kind() == rhs.kind() && lhs.kind().is_container() {
            self.compare_containers(path, lhs, rhs);
            return;
        }
        let differs = match (&lhs, &rhs) {
            _ if lhs.kind() != rhs.kind() => true,
            (Value::Regex(a), Value::Regex(b)) => a.to_string() != b.to_string(),
            (Value::Date(a), Value::Date(b)) => a.timestamp_millis() != b.timestamp_millis(),
            (Value::Number(a), Value::Number(b)) => a != b && !(a.is_nan() && b.is_nan()),
            _ => !lhs.is_same(&rhs),
        };
        if differs {
            self.record(Change::Edited {
                path: path.clone(),
                lhs,
                rhs,
            });
        }
    }

    fn compare_containers(&mut self, path: &mut Path, lhs: Value, rhs: Value) {
        let Some(id) = lhs.node_id() else {
            return;
        };
        if self.ancestors.contains(&id) {
            if !lhs.is_same(&rhs) {
                self.record(Change::Edited {
                    path: path.clone(),
                    lhs,
                    rhs,
                });
            }
            return;
        }

        self.ancestors.push(id);
        match (&lhs, &rhs) {
            (Value::Array(left), Value::Array(right)) => {
                let mut left = left.to_vec();
                let mut right = right.to_vec();
                if self.options.order_independent {
                    left.sort_by_cached_key(order_independent_hash);
                    right.sort_by_cached_key(order_independent_hash);
                }
                self.compare_arrays(path, left, right);
            }
            (Value::Object(left), Value::Object(right)) => {
                let mut unmatched: Vec<Option<_>> = right.keys().into_iter().map(Some).collect();
                for key in left.keys() {
                    let counterpart = match unmatched.iter().position(|k| k.as_ref() == Some(&key)) {
                        Some(pos) => {
                            unmatched[pos] = None;
                            right.get(&key)
                        }
                        None => None,
                    };
                    let value = left.get(&key);
                    self.step(path, PathSegment::Key(key), value, counterpart);
                }
                for key in unmatched.into_iter().flatten() {
                    let value = right.get(&key);
                    self.step(path, PathSegment::Key(key), None, value);
                }
            }
            _ => {}
        }
        self.ancestors.pop();
    }

    fn compare_arrays(&mut self, path: &mut Path, left: Vec<Value>, right: Vec<Value>) {
        let shared = left.len().min(right.len());
        for index in (left.len()..right.len()).rev() {
            self.record(Change::Array {
                path: path.clone(),
                index,
                item: ArrayItem::New {
                    rhs: right[index].clone(),
                },
            });
        }
        for index in (right.len()..left.len()).rev() {
            self.record(Change::Array {
                path: path.clone(),
                index,
                item: ArrayItem::Deleted {
                    lhs: left[index].clone(),
                },
            });
        }
        for index in (0..shared).rev() {
            self.step(
                path,
                PathSegment::Index(index),
                Some(left[index].clone()),
                Some(right[index].clone()),
            );
        }
    }
}
