//! Loss component movements
//!
//! Tracks the loss recognised on onerous groups alongside the liability. It is not part
//! of the total, and its balance never goes below zero.

use super::{Component, Movement};
use crate::error::Result;
use crate::projection::Model;
use crate::series::{Month, Series};
use crate::valuation::Measure;

impl Model {
    pub(super) fn loss_movement(&self, movement: Movement, t: Month) -> Result<Series> {
        Ok(match movement {
            Movement::NewBusiness => {
                let onerous: Vec<bool> = self.profitable_at_recognition()?.iter().map(|&p| !p).collect();
                self.new_business(Measure::LossComponent, t)?.keep(&onerous)
            }
            Movement::FinanceEffect => self.locked_accretion(Component::LossComponent, t, &[])?,
            Movement::OnerousTransfer => self.movement(Component::Csm, Movement::OnerousTransfer, t)?,
            Movement::FcfChange => {
                let raw = self.onerous_fcf_change(t)?;
                let mask = self.population.at_valuation(t);
                let floor = -&self.subtotal_before(Component::LossComponent, movement, t)?;
                raw.keep(&mask).zip_with(&floor, f64::max)
            }
            Movement::Release => {
                let balance = self.subtotal_before(Component::LossComponent, movement, t)?;
                -&(&balance * &self.coverage_units(t)?)
            }
            _ => self.zeros(),
        })
    }

    /// Locked-rate fulfilment cashflow changes of groups onerous at recognition
    pub(crate) fn onerous_fcf_change(&self, t: Month) -> Result<Series> {
        let onerous: Vec<bool> = self.profitable_at_recognition()?.iter().map(|&p| !p).collect();
        Ok(self.locked_fcf_change(t)?.keep(&onerous))
    }
}

#[cfg(test)]
mod tests {
    use crate::assumptions::{Assumptions, MortalityTable};
    use crate::basis::ScenarioMatrix;
    use crate::projection::test_support::*;
    use crate::rollforward::{Balance, Component, Movement};
    use approx::assert_relative_eq;

    fn onerous() -> Assumptions {
        let mut a = Assumptions::flat(0.3, 0.03).with_scenarios(ScenarioMatrix::sequential());
        a.mortality.current = MortalityTable::flat(0.01);
        a
    }

    #[test]
    fn test_onerous_group_books_loss_at_recognition() {
        let model = model(vec![single_point()], onerous(), 4);
        let nb = model.movement(Component::LossComponent, Movement::NewBusiness, 1).unwrap().get(0);
        assert!(nb > 0.0);
        assert_eq!(model.movement(Component::Csm, Movement::NewBusiness, 1).unwrap().get(0), 0.0);

        for t in 1..=model.horizon() {
            assert!(model.balance(Component::LossComponent, Balance::Closing, t).unwrap().get(0) >= -1e-9);
        }
    }

    #[test]
    fn test_favourable_change_reverses_loss_but_not_below_zero() {
        let model = model(vec![single_point()], onerous(), 4);
        let before = model.subtotal_before(Component::LossComponent, Movement::FcfChange, 4).unwrap().get(0);
        let change = model.movement(Component::LossComponent, Movement::FcfChange, 4).unwrap().get(0);
        let raw = model.onerous_fcf_change(4).unwrap().get(0);

        assert!(raw < -before, "mortality improvement exceeds the remaining loss");
        assert_relative_eq!(change, -before);
        assert_eq!(model.movement(Component::LossComponent, Movement::FcfChange, 5).unwrap().get(0), 0.0);
    }
}
