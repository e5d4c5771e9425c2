//! Insurance acquisition cashflows, amortised over the coverage period

use super::{Component, Movement};
use crate::error::Result;
use crate::projection::{Cashflow, Model};
use crate::series::{Month, Series};

impl Model {
    pub(super) fn acquisition_movement(&self, movement: Movement, t: Month) -> Result<Series> {
        Ok(match movement {
            Movement::AcquisitionCashflow => self.expected_mix(Cashflow::ExpsAcq, t)?,
            Movement::FinanceEffect => {
                let paid = self.movement(Component::AcquisitionCashflows, Movement::AcquisitionCashflow, t)?;
                self.locked_accretion(Component::AcquisitionCashflows, t, &[paid])?
            }
            Movement::Release => {
                let balance = self.subtotal_before(Component::AcquisitionCashflows, movement, t)?;
                -&(&balance * &self.coverage_units(t)?)
            }
            _ => self.zeros(),
        })
    }
}
