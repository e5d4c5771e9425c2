//! Per-run memo cache for recursively defined cells
//!
//! Every cell evaluation goes through [`SeriesCache::evaluate`]:
//!
//! - The cache is consulted under a read lock
//! - On a miss the formula runs outside any lock, so it can recurse into other keys
//! - The result is published with first-writer-wins; a concurrent duplicate computation
//!   of the same key is discarded, which is safe because formulas are pure
//!
//! Formulas must say whether they hit a boundary or recursed ([`Eval`]). A per-thread
//! depth counter turns a formula without a terminating branch into an error instead of
//! a stack overflow.

use super::vector::Series;
use super::Month;
use crate::error::{EngineError, Result};
use std::cell::Cell;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError, RwLock};

/// Default limit on nested cell evaluations per thread.
///
/// Low enough to trip well inside a 2 MB worker stack. Models fill their caches in
/// time order, so legitimate evaluations stay far below it.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Result of running a cell formula once
#[derive(Debug, Clone, PartialEq)]
pub enum Eval {
    /// Value defined directly by the cell's boundary condition
    Boundary(Series),
    /// Value computed from other cells or other times
    Recursive(Series),
}

impl Eval {
    pub fn into_series(self) -> Series {
        match self {
            Eval::Boundary(s) | Eval::Recursive(s) => s,
        }
    }
}

/// What the cache needs to know about a key beyond equality
pub trait CellKey: Eq + Hash + Clone {
    fn time(&self) -> Month;
    fn label(&self) -> String;
}

thread_local! {
    static DEPTH: Cell<usize> = const { Cell::new(0) };
}

struct DepthGuard;

impl DepthGuard {
    fn enter(max_depth: usize) -> std::result::Result<Self, usize> {
        DEPTH.with(|d| {
            let depth = d.get() + 1;
            if depth > max_depth {
                Err(depth)
            } else {
                d.set(depth);
                Ok(DepthGuard)
            }
        })
    }
}

impl Drop for DepthGuard {
    fn drop(&mut self) {
        DEPTH.with(|d| d.set(d.get().saturating_sub(1)));
    }
}

/// Cache counters
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub boundary_evaluations: u64,
    pub recursive_evaluations: u64,
}

impl CacheStats {
    pub fn misses(&self) -> u64 {
        self.boundary_evaluations + self.recursive_evaluations
    }

    /// Get cache hit rate
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses();
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[derive(Debug)]
pub struct SeriesCache<K> {
    entries: RwLock<HashMap<K, Series>>,
    executions: Mutex<HashMap<K, u32>>,
    hits: AtomicU64,
    boundary: AtomicU64,
    recursive: AtomicU64,
    max_depth: usize,
}

impl<K: CellKey> Default for SeriesCache<K> {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DEPTH)
    }
}

impl<K: CellKey> SeriesCache<K> {
    pub fn new(max_depth: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            executions: Mutex::new(HashMap::new()),
            hits: AtomicU64::new(0),
            boundary: AtomicU64::new(0),
            recursive: AtomicU64::new(0),
            max_depth,
        }
    }

    /// Evaluate `key`, running `formula` only if no value has been published yet.
    ///
    /// Negative times are rejected before the formula or the cache is touched.
    pub fn evaluate<F>(&self, key: K, formula: F) -> Result<Series>
    where
        F: FnOnce() -> Result<Eval>,
    {
        let t = key.time();
        if t < 0 {
            return Err(EngineError::NegativeTime { cell: key.label(), t });
        }

        if let Some(hit) = self.lookup(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(hit);
        }

        let _guard = DepthGuard::enter(self.max_depth).map_err(|depth| {
            EngineError::RecursionLimit { cell: key.label(), t, depth }
        })?;

        let value = match formula()? {
            Eval::Boundary(v) => {
                self.boundary.fetch_add(1, Ordering::Relaxed);
                v
            }
            Eval::Recursive(v) => {
                self.recursive.fetch_add(1, Ordering::Relaxed);
                v
            }
        };

        *self
            .executions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(key.clone())
            .or_insert(0) += 1;

        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.entry(key).or_insert(value).clone())
    }

    /// Published value for `key`, if any
    pub fn lookup(&self, key: &K) -> Option<Series> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).contains_key(key)
    }

    /// Number of times the formula behind `key` has run
    pub fn executions(&self, key: &K) -> u32 {
        self.executions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .copied()
            .unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len(),
            hits: self.hits.load(Ordering::Relaxed),
            boundary_evaluations: self.boundary.load(Ordering::Relaxed),
            recursive_evaluations: self.recursive.load(Ordering::Relaxed),
        }
    }
}
