//! Per-policy assumption lookups for a cashflow source

use super::engine::Model;
use crate::basis::{Assumption, Basis, CashflowSource};
use crate::error::Result;
use crate::series::{Month, Series};

impl Model {
    /// Basis each model point reads `assumption` on in month `t`
    fn assumption_bases(&self, assumption: Assumption, t: Month, source: CashflowSource) -> Result<Vec<Basis>> {
        let matrix = &self.assumptions.scenarios;
        self.population
            .before_valuation(t)
            .into_iter()
            .map(|before| source.assumption_basis(matrix, assumption, before))
            .collect()
    }

    /// Monthly mortality in month `t`
    pub(crate) fn mortality_rate(&self, t: Month, source: CashflowSource) -> Result<Series> {
        let bases = self.assumption_bases(Assumption::Mortality, t, source)?;
        let before = self.population.before_valuation(t);
        let ages = self.population.attained_age(t);
        let sex = self.population.sex();
        let conversion = self.assumptions.mortality_conversion;
        let experience = self.assumptions.experience.mortality;

        Ok(Series::from_fn(self.population.len(), |i| {
            let multiplier = if source.uses_experience(before[i]) { experience } else { 1.0 };
            self.assumptions
                .mortality
                .get(bases[i])
                .monthly_rate(ages[i], sex[i], multiplier, conversion)
        }))
    }

    /// Monthly lapse in month `t`
    pub(crate) fn lapse_rate(&self, t: Month, source: CashflowSource) -> Result<Series> {
        let bases = self.assumption_bases(Assumption::Lapse, t, source)?;
        let before = self.population.before_valuation(t);
        let years = self.population.policy_year(t);
        let experience = self.assumptions.experience.lapse;

        Ok(Series::from_fn(self.population.len(), |i| {
            let multiplier = if source.uses_experience(before[i]) { experience } else { 1.0 };
            self.assumptions.lapse.get(bases[i]).monthly_rate(years[i], multiplier)
        }))
    }

    /// Expense inflation factor in month `t`
    pub(crate) fn inflation_factor(&self, t: Month, source: CashflowSource) -> Result<Series> {
        let bases = self.assumption_bases(Assumption::Inflation, t, source)?;
        Ok(Series::from_fn(self.population.len(), |i| {
            self.assumptions.inflation_factor(t, bases[i])
        }))
    }

    /// Monthly discount rate for month `t`, the same for every model point
    pub fn discount_rate(&self, t: Month, basis: Basis) -> f64 {
        self.assumptions.discount.get(basis).monthly(t)
    }

    /// Monthly asset earned rate for month `t`
    pub fn asset_earned_rate(&self, t: Month, basis: Basis) -> f64 {
        self.assumptions.asset_earned.get(basis).monthly(t)
    }

    /// Per-policy monthly rate: `before` where month `t` is on or before the valuation
    /// month, `after` otherwise
    pub(crate) fn accretion_rate(&self, t: Month, before: Basis, after: Basis) -> Series {
        let (before, after) = (self.discount_rate(t, before), self.discount_rate(t, after));
        let flags = self.population.before_valuation(t);
        Series::from_fn(flags.len(), |i| if flags[i] { before } else { after })
    }
}
