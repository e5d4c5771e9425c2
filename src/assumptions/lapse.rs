//! Lapse rates by policy year

use super::rates::YearTable;
use super::tables::TableProvider;
use crate::error::Result;

/// Annual lapse rates by policy year for one basis
#[derive(Debug, Clone, PartialEq)]
pub struct LapseTable {
    annual: YearTable,
}

impl LapseTable {
    pub fn new(annual: YearTable) -> Self {
        Self { annual }
    }

    pub fn flat(rate: f64) -> Self {
        Self { annual: YearTable::flat(rate) }
    }

    pub fn from_provider(provider: &impl TableProvider, table: &str, column: &str) -> Result<Self> {
        Ok(Self { annual: YearTable::from_provider(provider, table, column)? })
    }

    pub fn annual_rate(&self, policy_year: u32) -> f64 {
        self.annual.get(policy_year)
    }

    /// Monthly lapse probability, with the annual rate scaled by `multiplier`
    /// and spread evenly over the year.
    pub fn monthly_rate(&self, policy_year: u32, multiplier: f64) -> f64 {
        let annual = (self.annual_rate(policy_year) * multiplier).clamp(0.0, 1.0);
        1.0 - (1.0 - annual).powf(1.0 / 12.0)
    }
}
