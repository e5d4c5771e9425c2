//! Best estimate liability movements

use super::{Balance, Component, Movement};
use crate::basis::Basis;
use crate::error::Result;
use crate::projection::{Cashflow, Model};
use crate::series::{Month, Series};
use crate::valuation::Measure;

impl Model {
    pub(super) fn bel_movement(&self, movement: Movement, t: Month) -> Result<Series> {
        Ok(match movement {
            Movement::NewBusiness => self.new_business(Measure::Bel, t)?,
            Movement::ExpectedInflow => self.expected_mix(Cashflow::Prem, t)?,
            Movement::ExpectedInsuranceOutflow => {
                let service = self.expected_mix(Cashflow::InsuranceServiceOutflow, t)?;
                -&(&service + &self.expected_mix(Cashflow::ExpsAcq, t)?)
            }
            Movement::ExpectedInvestmentOutflow => -&self.expected_mix(Cashflow::InvComp, t)?,
            Movement::FinanceEffect => {
                // premiums and start-of-month outgo accrete for the whole month
                let base = Series::total(
                    self.len(),
                    &[
                        self.balance(Component::Bel, Balance::Opening, t)?,
                        self.movement(Component::Bel, Movement::NewBusiness, t)?,
                        self.expected_mix(Cashflow::Prem, t)?,
                        -&self.expected_mix(Cashflow::StartOutflow, t)?,
                    ],
                );
                &base * &self.accretion_rate(t, Basis::Locked, Basis::Current)
            }
            Movement::ExperienceVarianceLocked
            | Movement::ExperienceVarianceCurrent
            | Movement::DiscountRateChange
            | Movement::AssumptionChangeLocked(_)
            | Movement::AssumptionChangeCurrent(_) => self.fcf_change(Measure::Bel, movement, t)?,
            _ => self.zeros(),
        })
    }
}
