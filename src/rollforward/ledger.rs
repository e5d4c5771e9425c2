//! Balance and movement cells shared by every component

use super::{Balance, Component, Movement};
use crate::basis::{Assumption, Basis, CashflowSource, Context};
use crate::error::Result;
use crate::projection::{Cashflow, CellId, CellRef, Model};
use crate::series::{Eval, Month, Series};
use crate::valuation::Measure;

impl Model {
    /// Opening or closing balance of a component at time `t`
    pub fn balance(&self, component: Component, balance: Balance, t: Month) -> Result<Series> {
        self.cell(CellRef::ledger(CellId::Balance(component, balance), t), || {
            if t == 0 {
                return Ok(Eval::Boundary(self.zeros()));
            }
            let value = match balance {
                Balance::Opening => self.balance(component, Balance::Closing, t - 1)?,
                Balance::Closing => {
                    let mut closing = self.balance(component, Balance::Opening, t)?;
                    for &movement in self.registry.movements(component) {
                        closing = &closing + &self.movement(component, movement, t)?;
                    }
                    closing
                }
            };
            Ok(Eval::Recursive(value))
        })
    }

    /// One movement of a component over month `t`; zero if the component has no such
    /// movement.
    pub fn movement(&self, component: Component, movement: Movement, t: Month) -> Result<Series> {
        self.cell(CellRef::ledger(CellId::Movement(component, movement), t), || {
            if t == 0 || !self.registry.movements(component).contains(&movement) {
                return Ok(Eval::Boundary(self.zeros()));
            }
            let value = match component {
                Component::Bel => self.bel_movement(movement, t)?,
                Component::Ra => self.ra_movement(movement, t)?,
                Component::Csm => self.csm_movement(movement, t)?,
                Component::LossComponent => self.loss_movement(movement, t)?,
                Component::AcquisitionCashflows => self.acquisition_movement(movement, t)?,
                Component::Total => self.total_movement(movement, t)?,
            };
            Ok(Eval::Recursive(value))
        })
    }

    /// Opening balance plus every movement registered ahead of `movement`
    pub(crate) fn subtotal_before(&self, component: Component, movement: Movement, t: Month) -> Result<Series> {
        let mut subtotal = self.balance(component, Balance::Opening, t)?;
        for &earlier in self.registry.preceding(component, movement) {
            subtotal = &subtotal + &self.movement(component, earlier, t)?;
        }
        Ok(subtotal)
    }

    /// Share of the remaining coverage provided in month `t`
    pub fn coverage_units(&self, t: Month) -> Result<Series> {
        self.cell(CellRef::ledger(CellId::CoverageUnits, t), || {
            if t == 0 {
                return Ok(Eval::Boundary(self.zeros()));
            }
            let units = |source: CashflowSource| -> Result<Series> {
                let covered = self.cashflow(Cashflow::PolsIf, t - 1, source)?.keep(&self.population.active(t));
                Ok(covered.ratio(&self.cashflow(Cashflow::FuturePolicies, t, source)?))
            };
            let flags = self.population.before_valuation(t);
            let value = Series::choose(&flags, &units(CashflowSource::Expected)?, &units(self.rebased_source())?);
            Ok(Eval::Recursive(value))
        })
    }

    /// Expected cashflows up to the valuation month, fully rebased ones after
    pub(crate) fn expected_mix(&self, cf: Cashflow, t: Month) -> Result<Series> {
        self.mix(CashflowSource::Expected, cf, t)
    }

    /// Actual cashflows up to the valuation month, fully rebased ones after
    pub(crate) fn actual_mix(&self, cf: Cashflow, t: Month) -> Result<Series> {
        self.mix(CashflowSource::Actual, cf, t)
    }

    fn mix(&self, before: CashflowSource, cf: Cashflow, t: Month) -> Result<Series> {
        let flags = self.population.before_valuation(t);
        let after = self.rebased_source();
        if flags.iter().all(|&f| f) {
            return self.cashflow(cf, t, before);
        }
        Ok(Series::choose(&flags, &self.cashflow(cf, t, before)?, &self.cashflow(cf, t, after)?))
    }

    /// Model points with a positive CSM at initial recognition
    pub fn profitable_at_recognition(&self) -> Result<Vec<bool>> {
        let csm = self.measure(Measure::Csm, 0, Context::new(CashflowSource::Expected, Basis::Locked))?;
        Ok(csm.values().iter().map(|&v| v > 0.0).collect())
    }

    /// Measure at time 0 on expected cashflows and locked rates, booked in month 1
    pub(crate) fn new_business(&self, measure: Measure, t: Month) -> Result<Series> {
        if t != 1 {
            return Ok(self.zeros());
        }
        self.measure(measure, 0, Context::new(CashflowSource::Expected, Basis::Locked))
    }

    /// Locked-rate accretion on the opening balance and new business
    pub(crate) fn locked_accretion(&self, component: Component, t: Month, extra: &[Series]) -> Result<Series> {
        let mut base = &self.balance(component, Balance::Opening, t)? + &self.movement(component, Movement::NewBusiness, t)?;
        for value in extra {
            base = &base + value;
        }
        Ok(base.scale(self.discount_rate(t, Basis::Locked)))
    }

    /// Change in a fulfilment measure at the valuation month, attributed to one step
    /// of the rebasing: experience, discount rates, or one assumption.
    pub(crate) fn fcf_change(&self, measure: Measure, movement: Movement, t: Month) -> Result<Series> {
        let at_valuation = self.population.at_valuation(t);
        if !at_valuation.iter().any(|&v| v) {
            return Ok(self.zeros());
        }

        let diff = |from: Context, to: Context| -> Result<Series> {
            Ok(&self.measure(measure, t, to)? - &self.measure(measure, t, from)?)
        };
        let actual = |basis| Context::new(CashflowSource::Actual, basis);

        let value = match movement {
            Movement::ExperienceVarianceLocked => {
                diff(Context::new(CashflowSource::Expected, Basis::Locked), actual(Basis::Locked))?
            }
            Movement::ExperienceVarianceCurrent => diff(actual(Basis::Locked), actual(Basis::Previous))?,
            Movement::DiscountRateChange => diff(actual(Basis::Previous), actual(Basis::Current))?,
            Movement::AssumptionChangeLocked(a) => match self.change_step(a) {
                Some((from, to)) => diff(Context::new(from, Basis::Locked), Context::new(to, Basis::Locked))?,
                None => self.zeros(),
            },
            Movement::AssumptionChangeCurrent(a) => match self.change_step(a) {
                Some((from, to)) => {
                    let current = diff(Context::new(from, Basis::Current), Context::new(to, Basis::Current))?;
                    let locked = diff(Context::new(from, Basis::Locked), Context::new(to, Basis::Locked))?;
                    &current - &locked
                }
                None => self.zeros(),
            },
            _ => self.zeros(),
        };
        Ok(value.keep(&at_valuation))
    }

    /// Projections just before and just after `assumption` is rebased
    fn change_step(&self, assumption: Assumption) -> Option<(CashflowSource, CashflowSource)> {
        self.assumptions
            .scenarios
            .assumption_change_run(assumption)
            .map(|n| (CashflowSource::rebased(n - 1), CashflowSource::rebased(n)))
    }

    /// BEL + RA changes at locked rates: experience and every assumption
    pub(crate) fn locked_fcf_change(&self, t: Month) -> Result<Series> {
        let mut movements = vec![Movement::ExperienceVarianceLocked];
        movements.extend(
            self.assumptions
                .scenarios
                .rebased_assumptions()
                .into_iter()
                .map(Movement::AssumptionChangeLocked),
        );

        let mut total = self.zeros();
        for movement in movements {
            for component in [Component::Bel, Component::Ra] {
                total = &total + &self.movement(component, movement, t)?;
            }
        }
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use crate::assumptions::test_tables::sample_tables;
    use crate::assumptions::Assumptions;
    use crate::pnl::AssetLine;
    use crate::policy::{ModelPoint, Sex};
    use crate::projection::test_support::*;
    use crate::rollforward::{Balance, Component};
    use approx::assert_relative_eq;

    #[test]
    fn test_coverage_units_release_everything_by_term_end() {
        let model = model(vec![single_point()], Assumptions::flat(0.01, 0.03), 6);
        let mut remaining = 1.0;
        for t in 1..=12 {
            let share = model.coverage_units(t).unwrap().get(0);
            assert!(share > 0.0 && share <= 1.0);
            remaining *= 1.0 - share;
        }
        assert_relative_eq!(remaining, 0.0, epsilon = 1e-12);
        assert_relative_eq!(model.coverage_units(12).unwrap().get(0), 1.0, epsilon = 1e-12);
        assert_eq!(model.coverage_units(13).unwrap().get(0), 0.0);
    }

    #[test]
    fn test_balances_are_zero_at_origin_and_after_horizon() {
        let model = model(vec![single_point()], Assumptions::flat(0.01, 0.03), 6);
        for component in Component::ALL {
            assert_eq!(model.balance(component, Balance::Closing, 0).unwrap().get(0), 0.0);
            assert_eq!(model.balance(component, Balance::Closing, model.horizon() + 5).unwrap().get(0), 0.0);
        }
    }

    #[test]
    fn test_cold_ledger_on_forty_year_policy() {
        let long = || ModelPoint::new(1, 30, Sex::Female, 40, 40, 2_400.0, 200_000.0, 1.0, issue_date());
        let assumptions = || Assumptions::from_tables(&sample_tables()).unwrap();

        let cold = model(vec![long()], assumptions(), 12);
        assert_eq!(cold.horizon(), 481);
        let closing = cold.balance(Component::Total, Balance::Closing, cold.horizon()).unwrap();

        let primed = model(vec![long()], assumptions(), 12);
        primed.prime_ledger().unwrap();
        let expected = primed.balance(Component::Total, Balance::Closing, primed.horizon()).unwrap();
        assert_relative_eq!(closing.get(0), expected.get(0), epsilon = 1e-9);

        for t in [13, 240, 480] {
            let cold_assets = cold.assets(AssetLine::Closing, t).unwrap().get(0);
            let primed_assets = primed.assets(AssetLine::Closing, t).unwrap().get(0);
            assert_relative_eq!(cold_assets, primed_assets, epsilon = 1e-9, max_relative = 1e-12);
        }
        cold.reconcile().unwrap();
    }
}
