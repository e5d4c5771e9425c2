//! Product terms: expenses, commissions, surrender values, maturity benefit and
//! risk-adjustment loadings

use super::rates::YearTable;
use super::tables::TableProvider;
use crate::error::Result;

/// Expense loading per policy
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ExpenseLoading {
    /// Fixed amount (annual for maintenance, per event otherwise)
    pub fixed: f64,
    /// Proportion of annual premium
    pub pct_premium: f64,
    /// Proportion of sum assured
    pub pct_sum_assured: f64,
}

impl ExpenseLoading {
    pub fn fixed(amount: f64) -> Self {
        Self { fixed: amount, ..Self::default() }
    }

    fn from_provider(provider: &impl TableProvider, row: &str) -> Result<Self> {
        Ok(Self {
            fixed: provider.lookup("expenses", row, "Fixed")?,
            pct_premium: provider.lookup("expenses", row, "PctPremium")?,
            pct_sum_assured: provider.lookup("expenses", row, "PctSumAssured")?,
        })
    }

    /// Amount per policy for the given annual premium and sum assured
    pub fn amount(&self, annual_premium: f64, sum_assured: f64) -> f64 {
        self.fixed + self.pct_premium * annual_premium + self.pct_sum_assured * sum_assured
    }
}

/// Product features used by the cashflow cells
#[derive(Debug, Clone, PartialEq)]
pub struct ProductTerms {
    /// Paid once, in the first policy month
    pub acquisition: ExpenseLoading,
    /// `fixed` is annual and inflated; `pct_premium` applies to each premium
    pub maintenance: ExpenseLoading,
    /// Per claim event (death, surrender, maturity), inflated
    pub claim: ExpenseLoading,
    /// Commission as a share of premium by policy year; year 1 is initial commission
    pub commission: YearTable,
    /// Risk-adjustment loading as a share of death benefit by policy year
    pub risk_adjustment: YearTable,
    /// Surrender value as a share of premiums paid by policy year
    pub surrender_value: YearTable,
    /// No surrender value is paid before this many months in force
    pub surrender_lock_in_months: u32,
    /// Maturity benefit as a share of sum assured
    pub maturity_factor: f64,
}

impl Default for ProductTerms {
    /// Pure protection: no expenses, commission, surrender value or maturity benefit
    fn default() -> Self {
        Self {
            acquisition: ExpenseLoading::default(),
            maintenance: ExpenseLoading::default(),
            claim: ExpenseLoading::default(),
            commission: YearTable::flat(0.0),
            risk_adjustment: YearTable::flat(0.0),
            surrender_value: YearTable::flat(0.0),
            surrender_lock_in_months: 0,
            maturity_factor: 0.0,
        }
    }
}

impl ProductTerms {
    pub fn from_provider(provider: &impl TableProvider) -> Result<Self> {
        Ok(Self {
            acquisition: ExpenseLoading::from_provider(provider, "Acquisition")?,
            maintenance: ExpenseLoading::from_provider(provider, "Maintenance")?,
            claim: ExpenseLoading::from_provider(provider, "Claim")?,
            commission: YearTable::from_provider(provider, "commissions", "Rate")?,
            risk_adjustment: YearTable::from_provider(provider, "risk_adjustment", "Factor")?,
            surrender_value: YearTable::from_provider(provider, "surrender_values", "Factor")?,
            surrender_lock_in_months: provider.lookup("product", "SurrenderLockInMonths", "Value")?.max(0.0) as u32,
            maturity_factor: provider.lookup("product", "MaturityFactor", "Value")?,
        })
    }

    /// Surrender value per policy at `duration` months in force.
    ///
    /// Share of premiums paid to date, capped at the sum assured.
    pub fn surrender_value(&self, duration: u32, prem_term_months: u32, monthly_premium: f64, sum_assured: f64) -> f64 {
        if duration <= self.surrender_lock_in_months {
            return 0.0;
        }
        let policy_year = (duration - 1) / 12 + 1;
        let paid = monthly_premium * duration.min(prem_term_months) as f64;
        (self.surrender_value.get(policy_year) * paid).min(sum_assured)
    }
}

/// Actual-to-expected experience ratios applied up to the valuation month
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Experience {
    pub mortality: f64,
    pub lapse: f64,
}

impl Default for Experience {
    fn default() -> Self {
        Self { mortality: 1.0, lapse: 1.0 }
    }
}

impl Experience {
    pub fn from_provider(provider: &impl TableProvider) -> Result<Self> {
        Ok(Self {
            mortality: provider.lookup("experience", "Mortality", "Ratio")?,
            lapse: provider.lookup("experience", "Lapse", "Ratio")?,
        })
    }
}
