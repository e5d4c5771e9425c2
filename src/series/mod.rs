//! Time-indexed population vectors and their memo cache

mod cache;
mod vector;

pub use cache::{CacheStats, CellKey, Eval, SeriesCache, DEFAULT_MAX_DEPTH};
pub use vector::Series;

/// Month since projection origin; time point `t` is the end of month `t`
pub type Month = i32;
