//! Valuation assumptions: decrements, rate curves and product terms, per basis

mod lapse;
mod mortality;
mod product;
mod rates;
pub mod loader;
pub mod tables;

pub use lapse::LapseTable;
pub use mortality::{MonthlyConversion, MortalityTable};
pub use product::{Experience, ExpenseLoading, ProductTerms};
pub use rates::{RateCurve, YearTable};
pub use tables::{Table, TableProvider, TableSet};

use crate::basis::{Assumption, Basis, ByBasis, ScenarioMatrix, ScenarioRow};
use crate::error::{EngineError, Result};
use std::path::Path;

/// Container for all valuation assumptions
#[derive(Debug, Clone)]
pub struct Assumptions {
    pub mortality: ByBasis<MortalityTable>,
    pub mortality_conversion: MonthlyConversion,
    pub lapse: ByBasis<LapseTable>,
    pub discount: ByBasis<RateCurve>,
    pub asset_earned: ByBasis<RateCurve>,
    /// Annual expense inflation
    pub inflation: ByBasis<f64>,
    pub product: ProductTerms,
    pub experience: Experience,
    pub scenarios: ScenarioMatrix,
}

impl Assumptions {
    /// Flat mortality and discount on every basis, no lapses, expenses or
    /// rebasing. Used for quick checks and as a base for sensitivities.
    pub fn flat(annual_mortality: f64, discount_rate: f64) -> Self {
        Self {
            mortality: ByBasis::uniform(MortalityTable::flat(annual_mortality)),
            mortality_conversion: MonthlyConversion::Standard,
            lapse: ByBasis::uniform(LapseTable::flat(0.0)),
            discount: ByBasis::uniform(RateCurve::flat(discount_rate)),
            asset_earned: ByBasis::uniform(RateCurve::flat(discount_rate)),
            inflation: ByBasis::uniform(0.0),
            product: ProductTerms::default(),
            experience: Experience::default(),
            scenarios: ScenarioMatrix::unchanged(),
        }
    }

    pub fn with_discount(mut self, basis: Basis, curve: RateCurve) -> Self {
        match basis {
            Basis::Locked => self.discount.locked = curve,
            Basis::Previous => self.discount.previous = curve,
            Basis::Current => self.discount.current = curve,
        }
        self
    }

    pub fn with_mortality(mut self, basis: Basis, table: MortalityTable) -> Self {
        match basis {
            Basis::Locked => self.mortality.locked = table,
            Basis::Previous => self.mortality.previous = table,
            Basis::Current => self.mortality.current = table,
        }
        self
    }

    pub fn with_scenarios(mut self, scenarios: ScenarioMatrix) -> Self {
        self.scenarios = scenarios;
        self
    }

    /// Build typed assumptions from a table provider.
    ///
    /// Expected tables: `mortality_locked`, `mortality_previous`, `mortality_current`,
    /// `lapse`, `discount_rates`, `asset_earned_rates`, `inflation`, `expenses`,
    /// `commissions`, `risk_adjustment`, `surrender_values`, `product`, `experience`,
    /// `scenarios`.
    pub fn from_tables(provider: &impl TableProvider) -> Result<Self> {
        let mortality = ByBasis::try_from_fn(|b| {
            MortalityTable::from_provider(provider, &format!("mortality_{}", b.name().to_lowercase()))
        })?;
        let lapse = ByBasis::try_from_fn(|b| LapseTable::from_provider(provider, "lapse", b.name()))?;
        let discount = ByBasis::try_from_fn(|b| RateCurve::from_provider(provider, "discount_rates", b.name()))?;
        let asset_earned =
            ByBasis::try_from_fn(|b| RateCurve::from_provider(provider, "asset_earned_rates", b.name()))?;
        let inflation = ByBasis::try_from_fn(|b| provider.lookup("inflation", "Rate", b.name()))?;

        let mut rows = Vec::new();
        for key in provider.row_keys("scenarios")? {
            let basis = |a: Assumption| provider.parse::<Basis>("scenarios", &key, a.name());
            rows.push(ScenarioRow {
                mortality: basis(Assumption::Mortality)?,
                lapse: basis(Assumption::Lapse)?,
                inflation: basis(Assumption::Inflation)?,
            });
        }

        let mortality_scale = match provider.lookup("product", "MortalityScale", "Value") {
            Ok(scale) => scale,
            Err(EngineError::MissingTableEntry { .. }) => 1.0,
            Err(other) => return Err(other),
        };
        let mortality = if (mortality_scale - 1.0).abs() > f64::EPSILON {
            ByBasis {
                locked: mortality.locked.scaled(mortality_scale),
                previous: mortality.previous.scaled(mortality_scale),
                current: mortality.current.scaled(mortality_scale),
            }
        } else {
            mortality
        };

        Ok(Self {
            mortality,
            mortality_conversion: MonthlyConversion::Standard,
            lapse,
            discount,
            asset_earned,
            inflation,
            product: ProductTerms::from_provider(provider)?,
            experience: Experience::from_provider(provider)?,
            scenarios: ScenarioMatrix::new(rows)?,
        })
    }

    /// Load assumptions from CSV files in a specific directory
    pub fn from_csv_path(path: &Path) -> Result<Self> {
        let tables = loader::load_table_dir(path)?;
        Self::from_tables(&tables)
    }

    /// Load assumptions from CSV files in the default location (data/assumptions/)
    pub fn from_csv() -> Result<Self> {
        Self::from_csv_path(Path::new(loader::DEFAULT_ASSUMPTIONS_PATH))
    }

    /// Inflation factor for month `t`: (1 + i)^((t-1)/12), 1 at the origin
    pub fn inflation_factor(&self, t: i32, basis: Basis) -> f64 {
        if t <= 0 {
            1.0
        } else {
            (1.0 + self.inflation.get(basis)).powf((t - 1) as f64 / 12.0)
        }
    }
}

#[cfg(test)]
pub(crate) mod test_tables {
    use super::tables::{Table, TableSet};

    fn table(columns: &[&str], rows: &[(&str, &[&str])]) -> Table {
        let mut t = Table::new(columns.iter().map(|c| c.to_string()).collect());
        for (label, values) in rows {
            t.push_row(*label, values.iter().map(|v| v.to_string()).collect());
        }
        t
    }

    /// Small but complete set of tables
    pub fn sample_tables() -> TableSet {
        let bases = ["Locked", "Previous", "Current"];
        let mut set = TableSet::new();
        for (name, rate) in [("mortality_locked", "0.002"), ("mortality_previous", "0.0025"), ("mortality_current", "0.003")] {
            let rows: Vec<(String, [&str; 2])> = (0..=120).map(|age| (age.to_string(), [rate, rate])).collect();
            let mut t = Table::new(vec!["Female".into(), "Male".into()]);
            for (label, values) in rows {
                t.push_row(label, values.iter().map(|v| v.to_string()).collect());
            }
            set.insert(name, t);
        }
        set.insert("lapse", table(&bases, &[("1", &["0.05", "0.06", "0.07"]), ("2", &["0.03", "0.04", "0.05"])]));
        set.insert("discount_rates", table(&bases, &[("0", &["0.03", "0.03", "0.035"]), ("1", &["0.03", "0.032", "0.036"])]));
        set.insert("asset_earned_rates", table(&bases, &[("0", &["0.04", "0.04", "0.04"])]));
        set.insert("inflation", table(&bases, &[("Rate", &["0.02", "0.025", "0.03"])]));
        set.insert(
            "expenses",
            table(
                &["Fixed", "PctPremium", "PctSumAssured"],
                &[
                    ("Acquisition", &["200", "0.1", "0.001"]),
                    ("Maintenance", &["60", "0.02", "0"]),
                    ("Claim", &["50", "0", "0"]),
                ],
            ),
        );
        set.insert("commissions", table(&["Rate"], &[("1", &["0.3"]), ("2", &["0.05"])]));
        set.insert("risk_adjustment", table(&["Factor"], &[("1", &["0.05"])]));
        set.insert("surrender_values", table(&["Factor"], &[("1", &["0"]), ("2", &["0.5"]), ("3", &["0.8"])]));
        set.insert(
            "product",
            table(
                &["Value"],
                &[("MaturityFactor", &["0.5"]), ("SurrenderLockInMonths", &["12"]), ("MortalityScale", &["1"])],
            ),
        );
        set.insert("experience", table(&["Ratio"], &[("Mortality", &["1.5"]), ("Lapse", &["0.8"])]));
        set.insert(
            "scenarios",
            table(
                &["Mortality", "Lapse", "Inflation"],
                &[
                    ("0", &["Previous", "Previous", "Previous"]),
                    ("1", &["Current", "Previous", "Previous"]),
                    ("2", &["Current", "Current", "Previous"]),
                    ("3", &["Current", "Current", "Current"]),
                ],
            ),
        );
        set
    }
}
