//! Error taxonomy for the valuation engine

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// A cell was asked for a time before the projection origin.
    #[error("{cell} evaluated at negative time t={t}")]
    NegativeTime { cell: String, t: i32 },

    /// A recursive formula kept recursing past any boundary.
    #[error("{cell} exceeded recursion depth {depth} at t={t}; missing boundary condition")]
    RecursionLimit { cell: String, t: i32, depth: usize },

    /// Aggregation was requested over values that cannot be summed.
    #[error("series {series} is not additive and cannot be aggregated by cohort")]
    NonAdditive { series: String },

    #[error(
        "reconciliation failed for {component} ({check}) at t={t}, point {point_id}: \
         expected {expected}, got {actual}"
    )]
    Reconciliation {
        component: String,
        check: String,
        t: i32,
        point_id: u32,
        expected: f64,
        actual: f64,
    },

    #[error("table {table} not found{}", path.as_ref().map(|p| format!(" at {}", p.display())).unwrap_or_default())]
    MissingTable { table: String, path: Option<PathBuf> },

    #[error("table {table} has no entry for row {row}, column {column}")]
    MissingTableEntry { table: String, row: String, column: String },

    #[error("table {table} row {row}, column {column}: cannot parse {value:?}")]
    MalformedTableEntry {
        table: String,
        row: String,
        column: String,
        value: String,
    },

    #[error("unknown {kind} selector {value:?}")]
    InvalidSelector { kind: &'static str, value: String },

    #[error("invalid scenario matrix: {0}")]
    InvalidScenarioMatrix(String),

    #[error("invalid model point {point_id}: {reason}")]
    InvalidModelPoint { point_id: u32, reason: String },

    #[error("model point {point_id} has valuation month {month}; must be at least 1")]
    InvalidValuationMonth { point_id: u32, month: i32 },

    #[error("model point {0} not found in the model-point source")]
    UnknownPoint(u32),

    #[error("point selection is empty")]
    EmptySelection,

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error in {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EngineError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        EngineError::Io { path: path.into(), source }
    }

    pub(crate) fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        EngineError::Csv { path: path.into(), source }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
