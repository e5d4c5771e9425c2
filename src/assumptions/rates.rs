//! Yearly rate curves and policy-year tables

use super::tables::TableProvider;
use crate::error::{EngineError, Result};
use crate::series::Month;

/// Annual effective rates by projection year
///
/// Index 0 applies at `t = 0`, index `k` to months `12(k-1)+1 ..= 12k`; the last
/// point extends flat.
#[derive(Debug, Clone, PartialEq)]
pub struct RateCurve {
    annual: Vec<f64>,
}

impl RateCurve {
    pub fn new(annual: Vec<f64>) -> Self {
        debug_assert!(!annual.is_empty(), "rate curve needs at least one point");
        Self { annual }
    }

    pub fn flat(rate: f64) -> Self {
        Self { annual: vec![rate] }
    }

    /// Projection year of month `t`: ceil(t / 12)
    pub fn year_of(t: Month) -> usize {
        if t <= 0 {
            0
        } else {
            ((t + 11) / 12) as usize
        }
    }

    pub fn annual(&self, t: Month) -> f64 {
        let idx = Self::year_of(t).min(self.annual.len() - 1);
        self.annual[idx]
    }

    /// (1 + annual)^(1/12) - 1
    pub fn monthly(&self, t: Month) -> f64 {
        (1.0 + self.annual(t)).powf(1.0 / 12.0) - 1.0
    }

    /// Load from a table with numeric year rows and one column per basis name.
    pub fn from_provider(provider: &impl TableProvider, table: &str, column: &str) -> Result<Self> {
        let values = numbered_column(provider, table, column, 0)?;
        Ok(Self::new(values))
    }
}

/// Values by policy year, 1-indexed; years past the end use the last entry.
#[derive(Debug, Clone, PartialEq)]
pub struct YearTable {
    values: Vec<f64>,
}

impl YearTable {
    pub fn new(values: Vec<f64>) -> Self {
        debug_assert!(!values.is_empty(), "year table needs at least one year");
        Self { values }
    }

    pub fn flat(value: f64) -> Self {
        Self { values: vec![value] }
    }

    pub fn get(&self, policy_year: u32) -> f64 {
        let idx = (policy_year.max(1) as usize - 1).min(self.values.len() - 1);
        self.values[idx]
    }

    pub fn from_provider(provider: &impl TableProvider, table: &str, column: &str) -> Result<Self> {
        Ok(Self::new(numbered_column(provider, table, column, 1)?))
    }
}

/// Read a column whose rows are consecutive integers starting at `first`.
fn numbered_column(provider: &impl TableProvider, table: &str, column: &str, first: u32) -> Result<Vec<f64>> {
    let mut rows: Vec<(u32, String)> = provider
        .row_keys(table)?
        .into_iter()
        .map(|row| {
            row.trim()
                .parse::<u32>()
                .map(|n| (n, row.clone()))
                .map_err(|_| EngineError::MalformedTableEntry {
                    table: table.to_string(),
                    row: row.clone(),
                    column: column.to_string(),
                    value: row.clone(),
                })
        })
        .collect::<Result<_>>()?;
    rows.sort_by_key(|(n, _)| *n);

    let mut values = Vec::with_capacity(rows.len());
    for (offset, (n, label)) in rows.iter().enumerate() {
        let expected = first + offset as u32;
        if *n != expected {
            return Err(EngineError::MissingTableEntry {
                table: table.to_string(),
                row: expected.to_string(),
                column: column.to_string(),
            });
        }
        values.push(provider.lookup(table, label, column)?);
    }
    if values.is_empty() {
        return Err(EngineError::MissingTable { table: table.to_string(), path: None });
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assumptions::tables::{Table, TableSet};

    #[test]
    fn test_year_of_month() {
        assert_eq!(RateCurve::year_of(0), 0);
        assert_eq!(RateCurve::year_of(1), 1);
        assert_eq!(RateCurve::year_of(12), 1);
        assert_eq!(RateCurve::year_of(13), 2);
    }

    #[test]
    fn test_monthly_rate_compounds_to_annual() {
        let curve = RateCurve::flat(0.03);
        let m = curve.monthly(7);
        assert!(((1.0 + m).powi(12) - 1.03).abs() < 1e-12);
    }

    #[test]
    fn test_curve_extends_last_point() {
        let curve = RateCurve::new(vec![0.01, 0.02, 0.03]);
        assert_eq!(curve.annual(0), 0.01);
        assert_eq!(curve.annual(12), 0.02);
        assert_eq!(curve.annual(13), 0.03);
        assert_eq!(curve.annual(600), 0.03);
    }

    #[test]
    fn test_year_table() {
        let table = YearTable::new(vec![0.5, 0.1, 0.05]);
        assert_eq!(table.get(1), 0.5);
        assert_eq!(table.get(3), 0.05);
        assert_eq!(table.get(30), 0.05);
    }

    #[test]
    fn test_from_provider_orders_rows() {
        let mut t = Table::new(vec!["Rate".into()]);
        t.push_row("2", vec!["0.02".into()]);
        t.push_row("1", vec!["0.5".into()]);
        let mut set = TableSet::new();
        set.insert("commissions", t);

        let table = YearTable::from_provider(&set, "commissions", "Rate").unwrap();
        assert_eq!(table.get(1), 0.5);
        assert_eq!(table.get(2), 0.02);

        assert!(RateCurve::from_provider(&set, "commissions", "Rate").is_err());
    }
}
