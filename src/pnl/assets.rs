//! Assets backing the liability

use super::AssetLine;
use crate::basis::Basis;
use crate::error::Result;
use crate::projection::{Cashflow, CellId, CellRef, Model};
use crate::series::{Eval, Month, Series};

impl Model {
    /// Asset roll-forward line for month `t`.
    ///
    /// Actual cashflows go in and out of the assets, which earn the current asset rate
    /// on the opening balance plus start-of-month cashflow. Profit is paid away at the
    /// end of the month.
    pub fn assets(&self, line: AssetLine, t: Month) -> Result<Series> {
        self.cell(CellRef::ledger(CellId::Assets(line), t), || {
            if t == 0 {
                return Ok(Eval::Boundary(self.zeros()));
            }
            let value = match line {
                AssetLine::Opening => self.assets(AssetLine::Closing, t - 1)?,
                AssetLine::Cashflow => {
                    &self.actual_mix(Cashflow::Prem, t)? - &self.actual_mix(Cashflow::StartOutflow, t)?
                }
                AssetLine::InvestmentIncome => {
                    let invested = &self.assets(AssetLine::Opening, t)? + &self.assets(AssetLine::Cashflow, t)?;
                    invested.scale(self.asset_earned_rate(t, Basis::Current))
                }
                AssetLine::Benefits => -&self.actual_mix(Cashflow::EndOutflow, t)?,
                AssetLine::ProfitRelease => -&self.profit(t)?,
                AssetLine::Closing => {
                    let parts = AssetLine::ALL[..5]
                        .iter()
                        .map(|&part| self.assets(part, t))
                        .collect::<Result<Vec<_>>>()?;
                    Series::total(self.len(), &parts)
                }
            };
            Ok(Eval::Recursive(value))
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::assumptions::test_tables::sample_tables;
    use crate::assumptions::{Assumptions, MortalityTable};
    use crate::basis::ScenarioMatrix;
    use crate::pnl::AssetLine;
    use crate::policy::{ModelPoint, Sex};
    use crate::projection::test_support::*;
    use crate::rollforward::{Balance, Component};
    use approx::assert_relative_eq;

    fn check_assets_track_liability(assumptions: Assumptions, valuation: i32) {
        let points = vec![
            single_point(),
            ModelPoint::new(2, 30, Sex::Female, 3, 2, 2_400.0, 50_000.0, 10.0, issue_date()),
        ];
        let model = model(points, assumptions, valuation);
        model.prime_ledger().unwrap();
        for t in 0..=model.horizon() + 1 {
            let assets = model.assets(AssetLine::Closing, t).unwrap();
            let total = model.balance(Component::Total, Balance::Closing, t).unwrap();
            for i in 0..assets.len() {
                assert_relative_eq!(assets.get(i), total.get(i), epsilon = 1e-6, max_relative = 1e-9);
            }
        }
    }

    #[test]
    fn test_assets_equal_total_liability() {
        check_assets_track_liability(Assumptions::from_tables(&sample_tables()).unwrap(), 6);
    }

    #[test]
    fn test_assets_equal_total_liability_for_onerous_business() {
        let mut a = Assumptions::from_tables(&sample_tables()).unwrap();
        a.mortality.locked = MortalityTable::flat(0.4);
        a.mortality.current = MortalityTable::flat(0.05);
        check_assets_track_liability(a.with_scenarios(ScenarioMatrix::sequential()), 9);
    }
}
