//! Reconciliation checks over the whole ledger
//!
//! Run per model point for every month up to the horizon. The first failure is returned
//! as [`EngineError::Reconciliation`].

use super::{Balance, Component};
use crate::basis::{Basis, CashflowSource, Context};
use crate::error::{EngineError, Result};
use crate::pnl::AssetLine;
use crate::projection::Model;
use crate::series::{Month, Series};
use crate::valuation::Measure;
use log::debug;
use serde::{Deserialize, Serialize};

/// Absolute plus relative tolerance for comparing balances
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tolerance {
    pub absolute: f64,
    pub relative: f64,
}

impl Default for Tolerance {
    fn default() -> Self {
        Self { absolute: 1e-6, relative: 1e-6 }
    }
}

impl Tolerance {
    pub fn accepts(&self, expected: f64, actual: f64) -> bool {
        let scale = expected.abs().max(actual.abs());
        (expected - actual).abs() <= self.absolute + self.relative * scale
    }
}

impl Model {
    /// Run every reconciliation check for months `1..=horizon`.
    pub fn reconcile(&self) -> Result<()> {
        let locked = Context::new(CashflowSource::Expected, Basis::Locked);
        let current = Context::new(self.rebased_source(), Basis::Current);

        for t in 1..=self.horizon() {
            for component in Component::ALL {
                let mut summed = self.balance(component, Balance::Opening, t)?;
                for &movement in self.registry.movements(component) {
                    summed = &summed + &self.movement(component, movement, t)?;
                }
                let closing = self.balance(component, Balance::Closing, t)?;
                self.compare(component.code(), "registry identity", t, &summed, &closing)?;
            }

            // BEL and RA carry the locked expected value until the valuation month and
            // the fully rebased current value from it onwards
            let before: Vec<bool> = self.population.valuation_months().iter().map(|&v| t < v).collect();
            for (component, measure) in [(Component::Bel, Measure::Bel), (Component::Ra, Measure::Ra)] {
                let pv = Series::choose(
                    &before,
                    &self.measure(measure, t, locked)?,
                    &self.measure(measure, t, current)?,
                );
                let closing = self.balance(component, Balance::Closing, t)?;
                self.compare(component.code(), "closing equals present value", t, &pv, &closing)?;
            }

            let parts = Series::total(
                self.len(),
                &[
                    self.balance(Component::Bel, Balance::Closing, t)?,
                    self.balance(Component::Ra, Balance::Closing, t)?,
                    self.balance(Component::Csm, Balance::Closing, t)?,
                ],
            );
            let total = self.balance(Component::Total, Balance::Closing, t)?;
            self.compare(Component::Total.code(), "total decomposition", t, &parts, &total)?;

            for component in [Component::Csm, Component::LossComponent] {
                let closing = self.balance(component, Balance::Closing, t)?;
                let floored = closing.positive_part();
                self.compare(component.code(), "non-negative", t, &floored, &closing)?;
            }

            let assets = self.assets(AssetLine::Closing, t)?;
            self.compare("ASSETS", "assets equal total liability", t, &total, &assets)?;
        }

        debug!("Reconciled {} points over {} months", self.len(), self.horizon());
        Ok(())
    }

    fn compare(&self, component: &str, check: &str, t: Month, expected: &Series, actual: &Series) -> Result<()> {
        let tolerance = self.settings.tolerance;
        for i in 0..expected.len() {
            let (e, a) = (expected.get(i), actual.get(i));
            if !tolerance.accepts(e, a) {
                return Err(EngineError::Reconciliation {
                    component: component.to_string(),
                    check: check.to_string(),
                    t,
                    point_id: self.population.point_id(i),
                    expected: e,
                    actual: a,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assumptions::test_tables::sample_tables;
    use crate::assumptions::Assumptions;
    use crate::policy::{ModelPoint, Sex};
    use crate::projection::test_support::*;
    use crate::projection::{ModelSettings, ValuationPoint};
    use std::sync::Arc;

    fn portfolio() -> Vec<ModelPoint> {
        vec![
            single_point(),
            ModelPoint::new(2, 30, Sex::Female, 3, 2, 2_400.0, 50_000.0, 10.0, issue_date()),
            ModelPoint::new(3, 55, Sex::Male, 2, 2, 1_000.0, 200_000.0, 3.0, issue_date()).with_duration(5),
        ]
    }

    #[test]
    fn test_tolerance() {
        let tol = Tolerance::default();
        assert!(tol.accepts(1e9, 1e9 + 100.0));
        assert!(!tol.accepts(1.0, 1.001));
        assert!(tol.accepts(0.0, 5e-7));
    }

    #[test]
    fn test_full_ledger_reconciles() {
        let assumptions = Assumptions::from_tables(&sample_tables()).unwrap();
        for valuation in [1, 6, 12, 20] {
            let model = model(portfolio(), assumptions.clone(), valuation);
            model.prime_ledger().unwrap();
            model.reconcile().unwrap();
        }
    }

    #[test]
    fn test_tampered_tolerance_reports_the_point() {
        let assumptions = Assumptions::from_tables(&sample_tables()).unwrap();
        let settings = ModelSettings {
            valuation: ValuationPoint::Month(6),
            tolerance: Tolerance { absolute: -1.0, relative: 0.0 },
            ..ModelSettings::default()
        };
        let model = Model::new(portfolio(), Arc::new(assumptions), settings).unwrap();
        match model.reconcile() {
            Err(EngineError::Reconciliation { t, point_id, .. }) => {
                assert_eq!(t, 1);
                assert_eq!(point_id, 1);
            }
            other => panic!("expected a reconciliation failure, got {other:?}"),
        }
    }
}
