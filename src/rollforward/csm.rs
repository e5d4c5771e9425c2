//! Contractual service margin movements
//!
//! The CSM absorbs experience and locked-rate changes in fulfilment cashflows for groups
//! that were profitable at recognition. A shortfall below zero moves to the loss
//! component.

use super::{Component, Movement};
use crate::error::Result;
use crate::projection::{Cashflow, Model};
use crate::series::{Month, Series};
use crate::valuation::Measure;

impl Model {
    pub(super) fn csm_movement(&self, movement: Movement, t: Month) -> Result<Series> {
        let profitable = self.profitable_at_recognition()?;
        let within = |flags: Vec<bool>| -> Vec<bool> { flags.iter().zip(&profitable).map(|(&f, &p)| f && p).collect() };

        Ok(match movement {
            Movement::NewBusiness => self.new_business(Measure::Csm, t)?.keep(&profitable),
            Movement::FinanceEffect => self.locked_accretion(Component::Csm, t, &[])?,
            Movement::PremiumExperience => {
                let gap = &self.actual_mix(Cashflow::Prem, t)? - &self.expected_mix(Cashflow::Prem, t)?;
                gap.keep(&within(self.population.before_valuation(t)))
            }
            Movement::InvestmentExperience => {
                let expected = &self.expected_mix(Cashflow::InvComp, t)? + &self.expected_mix(Cashflow::ExpsAcq, t)?;
                let actual = &self.actual_mix(Cashflow::InvComp, t)? + &self.actual_mix(Cashflow::ExpsAcq, t)?;
                (&expected - &actual).keep(&within(self.population.before_valuation(t)))
            }
            Movement::ExperienceVarianceLocked | Movement::AssumptionChangeLocked(_) => {
                let fcf = &self.movement(Component::Bel, movement, t)? + &self.movement(Component::Ra, movement, t)?;
                (-&fcf).keep(&profitable)
            }
            Movement::OnerousTransfer => (-&self.subtotal_before(Component::Csm, movement, t)?).positive_part(),
            Movement::Release => {
                let balance = self.subtotal_before(Component::Csm, movement, t)?;
                -&(&balance * &self.coverage_units(t)?)
            }
            _ => self.zeros(),
        })
    }
}
