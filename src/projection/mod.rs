//! Policy projection: population, decrements and cashflow cells

mod cashflows;
mod cells;
mod decrements;
mod engine;
mod population;

pub use cells::{Cashflow, CellId, CellRef};
pub use engine::{Model, ModelSettings};
pub use population::{Population, ValuationPoint};

#[cfg(test)]
pub(crate) use engine::test_support;
