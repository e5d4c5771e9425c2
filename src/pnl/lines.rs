//! P&L line cells

use super::{AssetLine, PnlLine, PnlSection};
use crate::error::Result;
use crate::projection::{Cashflow, CellId, CellRef, Model};
use crate::rollforward::{Component, Movement};
use crate::series::{Eval, Month, Series};

impl Model {
    pub fn pnl(&self, line: PnlLine, t: Month) -> Result<Series> {
        self.cell(CellRef::ledger(CellId::Pnl(line), t), || {
            if t == 0 {
                return Ok(Eval::Boundary(self.zeros()));
            }
            let movement = |c: Component, m: Movement| self.movement(c, m, t);

            let value = match line {
                PnlLine::CsmRelease => -&movement(Component::Csm, Movement::Release)?,
                PnlLine::LossComponentRelease => movement(Component::LossComponent, Movement::Release)?,
                PnlLine::RaRelease => -&movement(Component::Ra, Movement::Release)?,
                PnlLine::ExpectedInsuranceOutflow => self.expected_mix(Cashflow::InsuranceServiceOutflow, t)?,
                PnlLine::AcquisitionRecovery => -&movement(Component::AcquisitionCashflows, Movement::Release)?,

                PnlLine::ActualInsuranceOutflow => -&self.actual_mix(Cashflow::InsuranceServiceOutflow, t)?,
                PnlLine::LossEstablishment => {
                    let loss = &movement(Component::LossComponent, Movement::NewBusiness)?
                        + &movement(Component::Csm, Movement::OnerousTransfer)?;
                    -&loss
                }
                PnlLine::OnerousFcfChange => -&self.onerous_fcf_change(t)?,
                PnlLine::OnerousExperience => {
                    let gap = |cf: Cashflow| -> Result<Series> {
                        Ok(&self.actual_mix(cf, t)? - &self.expected_mix(cf, t)?)
                    };
                    let experience = &(&gap(Cashflow::Prem)? - &gap(Cashflow::ExpsAcq)?) - &gap(Cashflow::InvComp)?;
                    let profitable = self.profitable_at_recognition()?;
                    let mask: Vec<bool> = self
                        .population
                        .before_valuation(t)
                        .iter()
                        .zip(&profitable)
                        .map(|(&before, &p)| before && !p)
                        .collect();
                    experience.keep(&mask)
                }
                PnlLine::LossComponentReversal => -&movement(Component::LossComponent, Movement::Release)?,
                PnlLine::AcquisitionAmortisation => movement(Component::AcquisitionCashflows, Movement::Release)?,

                PnlLine::InvestmentIncome => self.assets(AssetLine::InvestmentIncome, t)?,
                PnlLine::InsuranceFinanceExpense => {
                    let mut parts = vec![
                        (Component::Bel, Movement::FinanceEffect),
                        (Component::Ra, Movement::FinanceEffect),
                        (Component::Csm, Movement::FinanceEffect),
                    ];
                    for component in [Component::Bel, Component::Ra] {
                        parts.push((component, Movement::ExperienceVarianceCurrent));
                        parts.push((component, Movement::DiscountRateChange));
                        for a in self.assumptions.scenarios.rebased_assumptions() {
                            parts.push((component, Movement::AssumptionChangeCurrent(a)));
                        }
                    }
                    let mut expense = self.zeros();
                    for (component, m) in parts {
                        expense = &expense - &movement(component, m)?;
                    }
                    expense
                }
            };
            Ok(Eval::Recursive(value))
        })
    }

    pub fn pnl_section(&self, section: PnlSection, t: Month) -> Result<Series> {
        self.cell(CellRef::ledger(CellId::PnlSection(section), t), || {
            let lines = section
                .lines()
                .iter()
                .map(|&line| self.pnl(line, t))
                .collect::<Result<Vec<_>>>()?;
            Ok(Eval::Recursive(Series::total(self.len(), &lines)))
        })
    }

    /// Revenue + expense + financial result for month `t`
    pub fn profit(&self, t: Month) -> Result<Series> {
        self.cell(CellRef::ledger(CellId::Profit, t), || {
            let sections = PnlSection::ALL
                .iter()
                .map(|&section| self.pnl_section(section, t))
                .collect::<Result<Vec<_>>>()?;
            Ok(Eval::Recursive(Series::total(self.len(), &sections)))
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::assumptions::test_tables::sample_tables;
    use crate::assumptions::Assumptions;
    use crate::pnl::{PnlLine, PnlSection};
    use crate::projection::test_support::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_presentation_pairs_net_to_zero() {
        let assumptions = Assumptions::from_tables(&sample_tables()).unwrap();
        let model = model(vec![single_point()], assumptions, 6);
        for t in 1..=model.horizon() {
            let at = |line| model.pnl(line, t).unwrap().get(0);
            assert_relative_eq!(at(PnlLine::LossComponentRelease) + at(PnlLine::LossComponentReversal), 0.0);
            assert_relative_eq!(at(PnlLine::AcquisitionRecovery) + at(PnlLine::AcquisitionAmortisation), 0.0);
        }
    }

    #[test]
    fn test_profit_is_sum_of_sections() {
        let assumptions = Assumptions::from_tables(&sample_tables()).unwrap();
        let model = model(vec![single_point()], assumptions, 6);
        let mut lifetime = 0.0;
        for t in 1..=model.horizon() {
            let sections: f64 = PnlSection::ALL.iter().map(|&s| model.pnl_section(s, t).unwrap().get(0)).sum();
            let profit = model.profit(t).unwrap().get(0);
            assert_relative_eq!(profit, sections, epsilon = 1e-9);
            lifetime += profit;
        }
        assert!(lifetime.is_finite());
    }
}
