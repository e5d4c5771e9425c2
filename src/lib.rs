//! IFRS 17 Engine - Recursive, memoised valuation and roll-forward for non-participating business
//!
//! This library provides:
//! - Monthly policy projections for expected, actual and rebased cashflow sources
//! - Present values, BEL, RA, CSM and loss component on locked, previous and current bases
//! - Analysis of change for BEL, RA, CSM, loss component and acquisition cashflows
//! - P&L presentation with an asset roll-forward that tracks the total liability
//! - Cohort aggregation, batched runs and CSV/JSON export

pub mod assumptions;
pub mod basis;
pub mod cohort;
pub mod error;
pub mod export;
pub mod pnl;
pub mod policy;
pub mod projection;
pub mod rollforward;
pub mod run;
pub mod series;
pub mod valuation;

// Re-export commonly used types
pub use assumptions::Assumptions;
pub use basis::{Assumption, Basis, CashflowSource, Context, ScenarioMatrix};
pub use error::{EngineError, Result};
pub use policy::{ModelPoint, PointSelection};
pub use projection::{Model, ModelSettings, ValuationPoint};
pub use rollforward::{Balance, Component, Movement, Tolerance};
pub use run::{run, ExportMode, RunConfig, RunResults};
pub use valuation::Measure;
