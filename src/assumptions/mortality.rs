//! Mortality tables by attained age and sex
//!
//! One table per basis. Rates are annual; the conversion to monthly is chosen once
//! for the whole run.

use super::tables::TableProvider;
use crate::error::{EngineError, Result};
use crate::policy::Sex;

/// Ages covered by a full table (0..=120)
pub const TABLE_AGES: usize = 121;

/// Annual mortality rates indexed by age
#[derive(Debug, Clone, PartialEq)]
pub struct MortalityTable {
    /// Stored as (female_rate, male_rate)
    rates: Vec<(f64, f64)>,
}

/// Method for converting annual mortality rates to monthly
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MonthlyConversion {
    /// Standard actuarial: q_monthly = 1 - (1 - q_annual)^(1/12)
    #[default]
    Standard,
    /// Simple division: q_monthly = q_annual / 12
    SimpleDivision,
}

impl MonthlyConversion {
    pub fn monthly(&self, annual: f64) -> f64 {
        let annual = annual.clamp(0.0, 1.0);
        match self {
            MonthlyConversion::Standard => 1.0 - (1.0 - annual).powf(1.0 / 12.0),
            MonthlyConversion::SimpleDivision => annual / 12.0,
        }
    }
}

impl MortalityTable {
    pub fn new(rates: Vec<(f64, f64)>) -> Self {
        Self { rates }
    }

    /// Same rate at every age for both sexes
    pub fn flat(rate: f64) -> Self {
        Self { rates: vec![(rate, rate); TABLE_AGES] }
    }

    /// Load from a table with one row per age and `Female` / `Male` columns.
    ///
    /// Every age from 0 up to the highest listed age must be present.
    pub fn from_provider(provider: &impl TableProvider, table: &str) -> Result<Self> {
        let mut by_age: Vec<(usize, f64, f64)> = Vec::new();
        for row in provider.row_keys(table)? {
            let age: usize = row.trim().parse().map_err(|_| EngineError::MalformedTableEntry {
                table: table.to_string(),
                row: row.clone(),
                column: "Age".to_string(),
                value: row.clone(),
            })?;
            let female = provider.lookup(table, &row, "Female")?;
            let male = provider.lookup(table, &row, "Male")?;
            by_age.push((age, female, male));
        }
        by_age.sort_by_key(|&(age, _, _)| age);

        let mut rates = Vec::with_capacity(by_age.len());
        for (expected_age, (age, female, male)) in by_age.into_iter().enumerate() {
            if age != expected_age {
                return Err(EngineError::MissingTableEntry {
                    table: table.to_string(),
                    row: expected_age.to_string(),
                    column: "Female".to_string(),
                });
            }
            rates.push((female, male));
        }
        if rates.is_empty() {
            return Err(EngineError::MissingTable { table: table.to_string(), path: None });
        }
        Ok(Self { rates })
    }

    /// Copy with every rate multiplied by `factor`
    pub fn scaled(&self, factor: f64) -> Self {
        Self { rates: self.rates.iter().map(|&(f, m)| (f * factor, m * factor)).collect() }
    }

    pub fn max_age(&self) -> u32 {
        (self.rates.len() - 1) as u32
    }

    /// Annual rate; ages past the end of the table use the last row.
    pub fn annual_rate(&self, attained_age: u32, sex: Sex) -> f64 {
        let idx = (attained_age as usize).min(self.rates.len() - 1);
        let (female, male) = self.rates[idx];
        match sex {
            Sex::Female => female,
            Sex::Male => male,
        }
    }

    /// Monthly rate after scaling the annual rate by `multiplier`
    pub fn monthly_rate(&self, attained_age: u32, sex: Sex, multiplier: f64, conversion: MonthlyConversion) -> f64 {
        conversion.monthly(self.annual_rate(attained_age, sex) * multiplier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assumptions::tables::{Table, TableSet};

    #[test]
    fn test_flat_table_monthly_conversion() {
        let table = MortalityTable::flat(0.01);
        let q = table.monthly_rate(40, Sex::Male, 1.0, MonthlyConversion::Standard);
        assert!(((1.0 - q).powi(12) - 0.99).abs() < 1e-12);

        let simple = table.monthly_rate(40, Sex::Male, 1.0, MonthlyConversion::SimpleDivision);
        assert!((simple - 0.01 / 12.0).abs() < 1e-15);
    }

    #[test]
    fn test_multiplier_is_capped_at_certain_death() {
        let table = MortalityTable::flat(0.6);
        let q = table.monthly_rate(90, Sex::Female, 2.0, MonthlyConversion::Standard);
        assert!((q - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_from_provider_and_age_clamp() {
        let mut t = Table::new(vec!["Female".into(), "Male".into()]);
        t.push_row("1", vec!["0.002".into(), "0.003".into()]);
        t.push_row("0", vec!["0.001".into(), "0.0015".into()]);
        let mut set = TableSet::new();
        set.insert("mortality_locked", t);

        let table = MortalityTable::from_provider(&set, "mortality_locked").unwrap();
        assert_eq!(table.max_age(), 1);
        assert_eq!(table.annual_rate(0, Sex::Male), 0.0015);
        assert_eq!(table.annual_rate(75, Sex::Female), 0.002);
    }

    #[test]
    fn test_from_provider_rejects_gaps() {
        let mut t = Table::new(vec!["Female".into(), "Male".into()]);
        t.push_row("0", vec!["0.001".into(), "0.001".into()]);
        t.push_row("2", vec!["0.001".into(), "0.001".into()]);
        let mut set = TableSet::new();
        set.insert("mortality_current", t);

        assert!(matches!(
            MortalityTable::from_provider(&set, "mortality_current"),
            Err(EngineError::MissingTableEntry { .. })
        ));
    }
}
