//! Valuation bases, cashflow sources and the assumptions matrix
//!
//! Everything that used to be a string selector is a closed enum here. Text is parsed
//! once when tables are loaded, so an unknown basis name fails at construction time.

use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Named set of assumption curves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Basis {
    /// Rates locked in at initial recognition
    Locked,
    /// Rates at the previous valuation
    Previous,
    /// Rates at the current valuation
    Current,
}

impl Basis {
    pub const ALL: [Basis; 3] = [Basis::Locked, Basis::Previous, Basis::Current];

    pub fn name(&self) -> &'static str {
        match self {
            Basis::Locked => "Locked",
            Basis::Previous => "Previous",
            Basis::Current => "Current",
        }
    }
}

impl fmt::Display for Basis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Basis {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "Locked" | "locked" => Ok(Basis::Locked),
            "Previous" | "previous" => Ok(Basis::Previous),
            "Current" | "current" => Ok(Basis::Current),
            other => Err(EngineError::InvalidSelector { kind: "basis", value: other.to_string() }),
        }
    }
}

/// Assumption classes that can be rebased independently
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Assumption {
    Mortality,
    Lapse,
    Inflation,
}

impl Assumption {
    pub const ALL: [Assumption; 3] = [Assumption::Mortality, Assumption::Lapse, Assumption::Inflation];

    pub fn name(&self) -> &'static str {
        match self {
            Assumption::Mortality => "Mortality",
            Assumption::Lapse => "Lapse",
            Assumption::Inflation => "Inflation",
        }
    }
}

impl fmt::Display for Assumption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Assumption {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "Mortality" => Ok(Assumption::Mortality),
            "Lapse" => Ok(Assumption::Lapse),
            "Inflation" => Ok(Assumption::Inflation),
            other => Err(EngineError::InvalidSelector { kind: "assumption", value: other.to_string() }),
        }
    }
}

/// Which projection of cashflows a cell reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CashflowSource {
    /// Best estimate at locked assumptions, no experience
    Expected,
    /// Actual experience up to the valuation month, original assumptions after
    Actual,
    /// Actual experience up to the valuation month, scenario `n` assumptions after
    Rebased(u32),
}

impl CashflowSource {
    /// Scenario 0 is the original projection, so it is the same cells as `Actual`.
    pub fn rebased(n: u32) -> Self {
        if n == 0 {
            CashflowSource::Actual
        } else {
            CashflowSource::Rebased(n)
        }
    }

    pub fn normalized(self) -> Self {
        match self {
            CashflowSource::Rebased(0) => CashflowSource::Actual,
            other => other,
        }
    }

    /// Scenario row of the assumptions matrix used after the valuation month
    pub fn scenario(&self) -> Option<u32> {
        match self {
            CashflowSource::Expected => None,
            CashflowSource::Actual => Some(0),
            CashflowSource::Rebased(n) => Some(*n),
        }
    }

    /// Whether actual-experience adjustments apply to month `t`
    pub fn uses_experience(&self, before_valuation: bool) -> bool {
        before_valuation && !matches!(self, CashflowSource::Expected)
    }

    /// Basis an assumption is read on, for a month before or after the valuation month
    pub fn assumption_basis(
        &self,
        matrix: &ScenarioMatrix,
        assumption: Assumption,
        before_valuation: bool,
    ) -> Result<Basis> {
        match self.scenario() {
            None => Ok(Basis::Locked),
            Some(_) if before_valuation => Ok(Basis::Locked),
            Some(n) => matrix.basis(n, assumption),
        }
    }
}

impl fmt::Display for CashflowSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CashflowSource::Expected => f.write_str("Expected"),
            CashflowSource::Actual => f.write_str("Actual"),
            CashflowSource::Rebased(n) => write!(f, "Rebased({n})"),
        }
    }
}

/// Where within a month a cashflow falls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timing {
    /// Start of the month, discounted from `t - 1`
    Start,
    /// End of the month, discounted one extra month
    End,
}

/// Immutable valuation context passed explicitly to every valuation cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Context {
    pub source: CashflowSource,
    pub basis: Basis,
}

impl Context {
    pub fn new(source: CashflowSource, basis: Basis) -> Self {
        Self { source: source.normalized(), basis }
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.source, self.basis)
    }
}

/// One value per basis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ByBasis<T> {
    pub locked: T,
    pub previous: T,
    pub current: T,
}

impl<T> ByBasis<T> {
    pub fn get(&self, basis: Basis) -> &T {
        match basis {
            Basis::Locked => &self.locked,
            Basis::Previous => &self.previous,
            Basis::Current => &self.current,
        }
    }

    pub fn try_from_fn(mut f: impl FnMut(Basis) -> Result<T>) -> Result<Self> {
        Ok(Self {
            locked: f(Basis::Locked)?,
            previous: f(Basis::Previous)?,
            current: f(Basis::Current)?,
        })
    }
}

impl<T: Clone> ByBasis<T> {
    pub fn uniform(value: T) -> Self {
        Self { locked: value.clone(), previous: value.clone(), current: value }
    }
}

/// Basis choice per assumption for one scenario
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioRow {
    pub mortality: Basis,
    pub lapse: Basis,
    pub inflation: Basis,
}

impl ScenarioRow {
    pub fn uniform(basis: Basis) -> Self {
        Self { mortality: basis, lapse: basis, inflation: basis }
    }

    pub fn basis(&self, assumption: Assumption) -> Basis {
        match assumption {
            Assumption::Mortality => self.mortality,
            Assumption::Lapse => self.lapse,
            Assumption::Inflation => self.inflation,
        }
    }

    pub fn with(mut self, assumption: Assumption, basis: Basis) -> Self {
        match assumption {
            Assumption::Mortality => self.mortality = basis,
            Assumption::Lapse => self.lapse = basis,
            Assumption::Inflation => self.inflation = basis,
        }
        self
    }
}

/// Assumptions matrix: row 0 is the original projection, each later row rebases one
/// more assumption.
///
/// Rows must be cumulative and change exactly one assumption each, so that the
/// per-assumption changes telescope to the full rebasing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioMatrix {
    rows: Vec<ScenarioRow>,
}

impl ScenarioMatrix {
    pub fn new(rows: Vec<ScenarioRow>) -> Result<Self> {
        let matrix = Self { rows };
        matrix.validate()?;
        Ok(matrix)
    }

    /// Only the original projection: nothing is rebased.
    pub fn unchanged() -> Self {
        Self { rows: vec![ScenarioRow::uniform(Basis::Previous)] }
    }

    /// Previous assumptions, then mortality, lapse and inflation moved to Current in turn.
    pub fn sequential() -> Self {
        let mut rows = vec![ScenarioRow::uniform(Basis::Previous)];
        for assumption in Assumption::ALL {
            let last = rows[rows.len() - 1];
            rows.push(last.with(assumption, Basis::Current));
        }
        Self { rows }
    }

    fn validate(&self) -> Result<()> {
        if self.rows.is_empty() {
            return Err(EngineError::InvalidScenarioMatrix("no scenarios".into()));
        }
        let mut changed = Vec::new();
        for (n, pair) in self.rows.windows(2).enumerate() {
            let diffs: Vec<Assumption> = Assumption::ALL
                .into_iter()
                .filter(|&a| pair[0].basis(a) != pair[1].basis(a))
                .collect();
            if diffs.len() != 1 {
                return Err(EngineError::InvalidScenarioMatrix(format!(
                    "scenario {} changes {} assumptions; exactly one expected",
                    n + 1,
                    diffs.len()
                )));
            }
            if changed.contains(&diffs[0]) {
                return Err(EngineError::InvalidScenarioMatrix(format!(
                    "{} is rebased more than once",
                    diffs[0]
                )));
            }
            changed.push(diffs[0]);
        }
        Ok(())
    }

    /// Highest scenario id (the fully rebased projection)
    pub fn max_scenario(&self) -> u32 {
        (self.rows.len() - 1) as u32
    }

    pub fn rows(&self) -> &[ScenarioRow] {
        &self.rows
    }

    pub fn basis(&self, scenario: u32, assumption: Assumption) -> Result<Basis> {
        self.rows
            .get(scenario as usize)
            .map(|row| row.basis(assumption))
            .ok_or_else(|| EngineError::InvalidSelector {
                kind: "scenario",
                value: scenario.to_string(),
            })
    }

    /// First scenario in which `assumption` differs from the original projection
    pub fn assumption_change_run(&self, assumption: Assumption) -> Option<u32> {
        let original = self.rows[0].basis(assumption);
        self.rows
            .iter()
            .position(|row| row.basis(assumption) != original)
            .map(|n| n as u32)
    }

    /// Assumptions that are rebased somewhere in the matrix, in run order
    pub fn rebased_assumptions(&self) -> Vec<Assumption> {
        let mut list: Vec<(u32, Assumption)> = Assumption::ALL
            .into_iter()
            .filter_map(|a| self.assumption_change_run(a).map(|n| (n, a)))
            .collect();
        list.sort();
        list.into_iter().map(|(_, a)| a).collect()
    }
}

impl Default for ScenarioMatrix {
    fn default() -> Self {
        Self::sequential()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basis_parsing() {
        assert_eq!("Current".parse::<Basis>().unwrap(), Basis::Current);
        assert!(matches!(
            "Currnet".parse::<Basis>(),
            Err(EngineError::InvalidSelector { kind: "basis", .. })
        ));
    }

    #[test]
    fn test_rebased_zero_is_actual() {
        assert_eq!(CashflowSource::rebased(0), CashflowSource::Actual);
        assert_eq!(CashflowSource::Rebased(0).normalized(), CashflowSource::Actual);
        assert_eq!(
            Context::new(CashflowSource::Rebased(0), Basis::Locked),
            Context::new(CashflowSource::Actual, Basis::Locked)
        );
    }

    #[test]
    fn test_sequential_matrix() {
        let m = ScenarioMatrix::sequential();
        assert_eq!(m.max_scenario(), 3);
        assert_eq!(m.assumption_change_run(Assumption::Mortality), Some(1));
        assert_eq!(m.assumption_change_run(Assumption::Lapse), Some(2));
        assert_eq!(m.assumption_change_run(Assumption::Inflation), Some(3));
        assert_eq!(m.basis(3, Assumption::Lapse).unwrap(), Basis::Current);
        assert_eq!(m.basis(1, Assumption::Lapse).unwrap(), Basis::Previous);
        assert!(m.basis(4, Assumption::Lapse).is_err());
        assert_eq!(
            m.rebased_assumptions(),
            vec![Assumption::Mortality, Assumption::Lapse, Assumption::Inflation]
        );
    }

    #[test]
    fn test_matrix_rejects_double_change() {
        let rows = vec![
            ScenarioRow::uniform(Basis::Previous),
            ScenarioRow::uniform(Basis::Current),
        ];
        assert!(matches!(
            ScenarioMatrix::new(rows),
            Err(EngineError::InvalidScenarioMatrix(_))
        ));
    }

    #[test]
    fn test_matrix_rejects_repeat_rebasing() {
        let base = ScenarioRow::uniform(Basis::Previous);
        let rows = vec![
            base,
            base.with(Assumption::Mortality, Basis::Current),
            base.with(Assumption::Mortality, Basis::Locked),
        ];
        assert!(ScenarioMatrix::new(rows).is_err());
    }

    #[test]
    fn test_source_assumption_basis() {
        let m = ScenarioMatrix::sequential();
        let expected = CashflowSource::Expected;
        let rebased = CashflowSource::Rebased(1);

        assert_eq!(expected.assumption_basis(&m, Assumption::Mortality, false).unwrap(), Basis::Locked);
        assert_eq!(rebased.assumption_basis(&m, Assumption::Mortality, true).unwrap(), Basis::Locked);
        assert_eq!(rebased.assumption_basis(&m, Assumption::Mortality, false).unwrap(), Basis::Current);
        assert_eq!(
            CashflowSource::Actual.assumption_basis(&m, Assumption::Mortality, false).unwrap(),
            Basis::Previous
        );
        assert!(rebased.uses_experience(true));
        assert!(!expected.uses_experience(true));
    }
}
