//! Risk adjustment movements

use super::{Balance, Component, Movement};
use crate::basis::Basis;
use crate::error::Result;
use crate::projection::{Cashflow, Model};
use crate::series::{Month, Series};
use crate::valuation::Measure;

impl Model {
    pub(super) fn ra_movement(&self, movement: Movement, t: Month) -> Result<Series> {
        Ok(match movement {
            Movement::NewBusiness => self.new_business(Measure::Ra, t)?,
            Movement::FinanceEffect => {
                let base = &self.balance(Component::Ra, Balance::Opening, t)?
                    + &self.movement(Component::Ra, Movement::NewBusiness, t)?;
                &base * &self.accretion_rate(t, Basis::Locked, Basis::Current)
            }
            Movement::ExperienceVarianceLocked
            | Movement::ExperienceVarianceCurrent
            | Movement::DiscountRateChange
            | Movement::AssumptionChangeLocked(_)
            | Movement::AssumptionChangeCurrent(_) => self.fcf_change(Measure::Ra, movement, t)?,
            Movement::Release => -&self.expected_mix(Cashflow::RaCf, t)?,
            _ => self.zeros(),
        })
    }
}
