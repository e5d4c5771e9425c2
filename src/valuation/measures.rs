//! Liability measures built from present values

use super::pv::Stream;
use crate::basis::Context;
use crate::error::Result;
use crate::projection::{CellId, CellRef, Model};
use crate::series::{Eval, Month, Series};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Measure {
    /// Best estimate liability: outflows less inflows
    Bel,
    /// Risk adjustment for non-financial risk
    Ra,
    /// Contractual service margin, floored at zero
    Csm,
    /// Loss on an onerous group
    LossComponent,
    /// BEL + RA + CSM
    Total,
}

impl Measure {
    pub const ALL: [Measure; 5] = [Measure::Bel, Measure::Ra, Measure::Csm, Measure::LossComponent, Measure::Total];

    pub fn code(&self) -> &'static str {
        match self {
            Measure::Bel => "BEL",
            Measure::Ra => "RA",
            Measure::Csm => "CSM",
            Measure::LossComponent => "LOSS",
            Measure::Total => "TOTAL",
        }
    }
}

impl Model {
    /// Measure at time `t` in context `ctx`, valuing cashflows from month `t + 1`
    pub fn measure(&self, measure: Measure, t: Month, ctx: Context) -> Result<Series> {
        self.cell(CellRef::valued(CellId::Measure(measure), t, ctx), || {
            let value = match measure {
                Measure::Bel => {
                    let mut bel = self.zeros();
                    for stream in Stream::FULFILMENT {
                        let pv = self.present_value(stream, t + 1, ctx)?;
                        bel = if stream.is_inflow() { &bel - &pv } else { &bel + &pv };
                    }
                    bel
                }
                Measure::Ra => self.present_value(Stream::RiskAdjustment, t + 1, ctx)?,
                Measure::Csm => {
                    let fcf = self.fulfilment_cashflows(t, ctx)?;
                    (-&fcf).positive_part()
                }
                Measure::LossComponent => self.fulfilment_cashflows(t, ctx)?.positive_part(),
                Measure::Total => Series::total(
                    self.len(),
                    &[
                        self.measure(Measure::Bel, t, ctx)?,
                        self.measure(Measure::Ra, t, ctx)?,
                        self.measure(Measure::Csm, t, ctx)?,
                    ],
                ),
            };
            Ok(Eval::Recursive(value))
        })
    }

    /// BEL + RA
    fn fulfilment_cashflows(&self, t: Month, ctx: Context) -> Result<Series> {
        Ok(&self.measure(Measure::Bel, t, ctx)? + &self.measure(Measure::Ra, t, ctx)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assumptions::{Assumptions, MortalityTable, RateCurve};
    use crate::basis::{Basis, ByBasis, CashflowSource};
    use crate::projection::test_support::*;
    use crate::projection::Cashflow;
    use approx::assert_relative_eq;

    fn assumptions() -> Assumptions {
        Assumptions::flat(0.01, 0.03).with_discount(Basis::Current, RateCurve::flat(0.04))
    }

    /// Direct sum over months: premiums at the start, deaths at the end
    fn manual_bel(annual_rate: f64) -> f64 {
        let q = 1.0 - 0.99_f64.powf(1.0 / 12.0);
        let v = 1.0 / (1.0 + annual_rate).powf(1.0 / 12.0);
        let mut lives = 1.0;
        let mut bel = 0.0;
        for t in 1..=12 {
            let deaths = lives * q;
            bel += -1_000.0 * lives * v.powi(t - 1) + 100_000.0 * deaths * v.powi(t);
            lives -= deaths;
        }
        bel
    }

    #[test]
    fn test_single_policy_bel() {
        let model = model(vec![single_point()], assumptions(), 6);
        let locked = Context::new(CashflowSource::Expected, Basis::Locked);
        let current = Context::new(CashflowSource::Expected, Basis::Current);

        let bel = model.measure(Measure::Bel, 0, locked).unwrap().get(0);
        assert_relative_eq!(bel, manual_bel(0.03), epsilon = 1e-6);
        assert!(bel < 0.0, "profitable policy has a negative BEL");

        let csm = model.measure(Measure::Csm, 0, locked).unwrap().get(0);
        assert_relative_eq!(csm, -bel, epsilon = 1e-9);
        assert_eq!(model.measure(Measure::LossComponent, 0, locked).unwrap().get(0), 0.0);
        assert_relative_eq!(model.measure(Measure::Total, 0, locked).unwrap().get(0), 0.0, epsilon = 1e-9);

        let sensitivity = model.measure(Measure::Bel, 0, current).unwrap().get(0);
        assert_relative_eq!(sensitivity, manual_bel(0.04), epsilon = 1e-6);
        assert!((sensitivity - bel).abs() > 1.0);

        assert_eq!(model.measure(Measure::Bel, model.horizon(), locked).unwrap().get(0), 0.0);
        assert_eq!(model.measure(Measure::Bel, 400, locked).unwrap().get(0), 0.0);
    }

    #[test]
    fn test_every_cell_runs_once() {
        let model = model(vec![single_point()], assumptions(), 6);
        let ctx = Context::new(CashflowSource::Expected, Basis::Locked);
        let first = model.measure(Measure::Bel, 0, ctx).unwrap();
        let second = model.measure(Measure::Bel, 0, ctx).unwrap();
        assert_eq!(first, second);

        for t in 1..=model.horizon() + 1 {
            let pv = CellRef::valued(CellId::PresentValue(Stream::Premiums), t, ctx);
            assert_eq!(model.executions(&pv), 1);
        }
        for t in 0..model.horizon() {
            let pols = CellRef::projected(Cashflow::PolsIf, t, ctx.source);
            assert_eq!(model.executions(&pols), 1);
        }
        assert_eq!(model.executions(&CellRef::valued(CellId::Measure(Measure::Bel), 0, ctx)), 1);
    }

    #[test]
    fn test_projection_shared_across_bases() {
        let model = model(vec![single_point()], assumptions(), 6);
        let locked = Context::new(CashflowSource::Expected, Basis::Locked);
        let current = Context::new(CashflowSource::Expected, Basis::Current);

        let bel_locked = model.measure(Measure::Bel, 0, locked).unwrap();
        let pols_before = model.cashflow(Cashflow::PolsIf, 5, CashflowSource::Expected).unwrap();
        let bel_current = model.measure(Measure::Bel, 0, current).unwrap();
        let pols_after = model.cashflow(Cashflow::PolsIf, 5, CashflowSource::Expected).unwrap();

        assert_eq!(pols_before, pols_after);
        assert_ne!(bel_locked, bel_current);
        assert_eq!(model.executions(&CellRef::projected(Cashflow::PolsIf, 5, CashflowSource::Expected)), 1);
        // the cached locked value is not disturbed by the current-basis evaluation
        assert_eq!(model.measure(Measure::Bel, 0, locked).unwrap(), bel_locked);
    }

    #[test]
    fn test_onerous_policy_has_loss_component() {
        let mut a = assumptions();
        a.mortality = ByBasis::uniform(MortalityTable::flat(0.5));
        let model = model(vec![single_point()], a, 6);
        let ctx = Context::new(CashflowSource::Expected, Basis::Locked);

        let bel = model.measure(Measure::Bel, 0, ctx).unwrap().get(0);
        assert!(bel > 0.0);
        assert_eq!(model.measure(Measure::Csm, 0, ctx).unwrap().get(0), 0.0);
        assert_relative_eq!(model.measure(Measure::LossComponent, 0, ctx).unwrap().get(0), bel, epsilon = 1e-9);
    }

    #[test]
    fn test_identical_tables_give_identical_measures_on_every_basis() {
        use crate::basis::ScenarioMatrix;
        use crate::policy::{ModelPoint, Sex};
        use crate::rollforward::{Component, Movement};

        let uniform = Assumptions::flat(0.01, 0.03).with_scenarios(ScenarioMatrix::sequential());
        let rebased = uniform.scenarios.rebased_assumptions();
        let points = vec![
            single_point(),
            ModelPoint::new(2, 35, Sex::Female, 3, 2, 2_400.0, 50_000.0, 3.0, issue_date()),
        ];
        let model = model(points, uniform, 6);

        for source in [CashflowSource::Expected, CashflowSource::Actual, model.rebased_source()] {
            for measure in Measure::ALL {
                for t in [0, 1, 6, 12, 24] {
                    let locked = model.measure(measure, t, Context::new(source, Basis::Locked)).unwrap();
                    for basis in [Basis::Previous, Basis::Current] {
                        assert_eq!(model.measure(measure, t, Context::new(source, basis)).unwrap(), locked);
                    }
                }
            }
        }

        let mut movements = vec![
            Movement::ExperienceVarianceLocked,
            Movement::ExperienceVarianceCurrent,
            Movement::DiscountRateChange,
        ];
        for &a in &rebased {
            movements.push(Movement::AssumptionChangeLocked(a));
            movements.push(Movement::AssumptionChangeCurrent(a));
        }
        for component in [Component::Bel, Component::Ra] {
            for &movement in &movements {
                let value = model.movement(component, movement, 6).unwrap();
                for i in 0..value.len() {
                    assert_relative_eq!(value.get(i), 0.0, epsilon = 1e-9);
                }
            }
        }
    }
}
