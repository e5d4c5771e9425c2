//! Policy decrements and cashflows per source
//!
//! Month `t` runs from time `t - 1` to time `t`. In-force counts are end-of-month
//! values; premiums, commission, acquisition and maintenance expenses and maturity
//! benefits fall at the start of a month, death and surrender claims at the end.

use super::cells::{Cashflow, CellRef};
use super::engine::Model;
use crate::basis::CashflowSource;
use crate::error::Result;
use crate::series::{Eval, Month, Series};

impl Model {
    /// Projection cell `cf` for month `t` under `source`
    pub fn cashflow(&self, cf: Cashflow, t: Month, source: CashflowSource) -> Result<Series> {
        let source = source.normalized();
        self.cell(CellRef::projected(cf, t, source), || {
            if t == 0 {
                let value = match cf {
                    Cashflow::PolsIf => self.population.policy_count().clone(),
                    _ => self.zeros(),
                };
                return Ok(Eval::Boundary(value));
            }
            self.cashflow_formula(cf, t, source).map(Eval::Recursive)
        })
    }

    fn cashflow_formula(&self, cf: Cashflow, t: Month, source: CashflowSource) -> Result<Series> {
        let pop = &self.population;
        let product = &self.assumptions.product;
        let n = pop.len();
        let flow = |c: Cashflow| self.cashflow(c, t, source);
        let in_force = || self.cashflow(Cashflow::PolsIf, t - 1, source);

        let value = match cf {
            Cashflow::PolsIf => {
                let opening = in_force()?;
                let exits = Series::total(
                    n,
                    &[flow(Cashflow::PolsDth)?, flow(Cashflow::PolsLapse)?, flow(Cashflow::PolsMat)?],
                );
                &opening - &exits
            }
            Cashflow::PolsDth => (&in_force()? * &self.mortality_rate(t, source)?).keep(&pop.active(t)),
            Cashflow::PolsLapse => {
                let survivors = &in_force()? - &flow(Cashflow::PolsDth)?;
                (&survivors * &self.lapse_rate(t, source)?).keep(&pop.active(t))
            }
            Cashflow::PolsMat => in_force()?.keep(&pop.maturing(t)),

            Cashflow::Prem => {
                let paying: Vec<bool> =
                    pop.premium_paying(t).iter().zip(pop.active(t)).map(|(&p, a)| p && a).collect();
                (&in_force()? * pop.monthly_premium()).keep(&paying)
            }
            Cashflow::DthBen => &flow(Cashflow::PolsDth)? * pop.sum_assured(),
            Cashflow::SurrBen => &flow(Cashflow::PolsLapse)? * &self.surrender_values(t),
            Cashflow::MatBen => (&flow(Cashflow::PolsMat)? * pop.sum_assured()).scale(product.maturity_factor),

            Cashflow::CommInit | Cashflow::CommRen => {
                let years = pop.policy_year(t);
                let initial = matches!(cf, Cashflow::CommInit);
                let rates = Series::from_fn(n, |i| {
                    if (years[i] == 1) == initial {
                        product.commission.get(years[i])
                    } else {
                        0.0
                    }
                });
                &flow(Cashflow::Prem)? * &rates
            }

            Cashflow::ExpsAcq => {
                let per_policy = pop.annual_premium().zip_with(pop.sum_assured(), |ap, sa| {
                    product.acquisition.amount(ap, sa)
                });
                (&in_force()? * &per_policy).keep(&pop.issuing(t))
            }
            Cashflow::ExpsMaint => {
                let loading = &product.maintenance;
                let inflation = self.inflation_factor(t, source)?;
                let durations = pop.duration(t);
                let active = pop.active(t);
                let mask: Vec<bool> = (0..n).map(|i| active[i] && durations[i] > 1).collect();
                let per_policy = Series::from_fn(n, |i| {
                    loading.fixed / 12.0 * inflation.get(i)
                        + loading.pct_premium * pop.monthly_premium().get(i)
                        + loading.pct_sum_assured * pop.sum_assured().get(i) / 12.0
                });
                (&in_force()? * &per_policy).keep(&mask)
            }
            Cashflow::ExpsClaimDth => &flow(Cashflow::PolsDth)? * &self.claim_expense(t, source)?,
            Cashflow::ExpsClaimSurr => {
                let payable: Vec<bool> = self.surrender_values(t).values().iter().map(|&sv| sv > 0.0).collect();
                (&flow(Cashflow::PolsLapse)? * &self.claim_expense(t, source)?).keep(&payable)
            }
            Cashflow::ExpsClaimMat => {
                if product.maturity_factor > 0.0 {
                    &flow(Cashflow::PolsMat)? * &self.claim_expense(t, source)?
                } else {
                    self.zeros()
                }
            }

            Cashflow::RaCf => {
                let years = pop.policy_year(t);
                let factors = Series::from_fn(n, |i| product.risk_adjustment.get(years[i]));
                &flow(Cashflow::DthBen)? * &factors
            }
            Cashflow::InsComp => {
                let at_risk = pop.sum_assured().zip_with(&self.surrender_values(t), |sa, sv| (sa - sv).max(0.0));
                &flow(Cashflow::PolsDth)? * &at_risk
            }
            Cashflow::InvComp => {
                let benefits = Series::total(
                    n,
                    &[flow(Cashflow::DthBen)?, flow(Cashflow::SurrBen)?, flow(Cashflow::MatBen)?],
                );
                &benefits - &flow(Cashflow::InsComp)?
            }

            Cashflow::InsuranceServiceOutflow => Series::total(
                n,
                &[
                    flow(Cashflow::InsComp)?,
                    flow(Cashflow::ExpsClaimDth)?,
                    flow(Cashflow::ExpsClaimSurr)?,
                    flow(Cashflow::ExpsClaimMat)?,
                    flow(Cashflow::ExpsMaint)?,
                    flow(Cashflow::CommInit)?,
                    flow(Cashflow::CommRen)?,
                ],
            ),
            Cashflow::StartOutflow => Series::total(
                n,
                &[
                    flow(Cashflow::ExpsAcq)?,
                    flow(Cashflow::ExpsMaint)?,
                    flow(Cashflow::CommInit)?,
                    flow(Cashflow::CommRen)?,
                    flow(Cashflow::MatBen)?,
                    flow(Cashflow::ExpsClaimMat)?,
                ],
            ),
            Cashflow::EndOutflow => Series::total(
                n,
                &[
                    flow(Cashflow::DthBen)?,
                    flow(Cashflow::SurrBen)?,
                    flow(Cashflow::ExpsClaimDth)?,
                    flow(Cashflow::ExpsClaimSurr)?,
                ],
            ),

            Cashflow::FuturePolicies => {
                let covered = in_force()?.keep(&pop.active(t));
                &covered + &self.cashflow(Cashflow::FuturePolicies, t + 1, source)?
            }
        };
        Ok(value)
    }

    /// Surrender value per policy for a lapse in month `t`
    fn surrender_values(&self, t: Month) -> Series {
        let pop = &self.population;
        let durations = pop.duration(t);
        let prem_terms = pop.prem_term_months();
        Series::from_fn(pop.len(), |i| {
            self.assumptions.product.surrender_value(
                durations[i],
                prem_terms[i],
                pop.monthly_premium().get(i),
                pop.sum_assured().get(i),
            )
        })
    }

    /// Inflated expense per claim event
    fn claim_expense(&self, t: Month, source: CashflowSource) -> Result<Series> {
        let pop = &self.population;
        let claim = &self.assumptions.product.claim;
        let base = pop.annual_premium().zip_with(pop.sum_assured(), |ap, sa| claim.amount(ap, sa));
        Ok(&base * &self.inflation_factor(t, source)?)
    }
}

#[cfg(test)]
mod tests {
    use super::super::engine::test_support::*;
    use super::*;
    use crate::assumptions::{Assumptions, ExpenseLoading, LapseTable, ProductTerms, YearTable};
    use crate::basis::ByBasis;
    use crate::policy::{ModelPoint, Sex};
    use approx::assert_relative_eq;

    fn q(annual: f64) -> f64 {
        1.0 - (1.0 - annual).powf(1.0 / 12.0)
    }

    #[test]
    fn test_single_policy_decrements() {
        let model = model(vec![single_point()], Assumptions::flat(0.01, 0.03), 6);
        let src = CashflowSource::Expected;

        let mut lives = 1.0;
        for t in 1..=12 {
            let deaths = model.cashflow(Cashflow::PolsDth, t, src).unwrap().get(0);
            assert_relative_eq!(deaths, lives * q(0.01), epsilon = 1e-12);
            assert_relative_eq!(model.cashflow(Cashflow::Prem, t, src).unwrap().get(0), lives * 1_000.0, epsilon = 1e-9);
            assert_relative_eq!(model.cashflow(Cashflow::DthBen, t, src).unwrap().get(0), deaths * 100_000.0, epsilon = 1e-9);
            lives -= deaths;
            assert_relative_eq!(model.cashflow(Cashflow::PolsIf, t, src).unwrap().get(0), lives, epsilon = 1e-12);
        }
        assert_relative_eq!(lives, 0.99, epsilon = 1e-12);

        // term ends: everything left matures in month 13, nothing is paid for it here
        assert_relative_eq!(model.cashflow(Cashflow::PolsMat, 13, src).unwrap().get(0), lives, epsilon = 1e-12);
        assert_eq!(model.cashflow(Cashflow::PolsIf, 13, src).unwrap().get(0), 0.0);
        assert_eq!(model.cashflow(Cashflow::MatBen, 13, src).unwrap().get(0), 0.0);
        assert_eq!(model.cashflow(Cashflow::Prem, 13, src).unwrap().get(0), 0.0);
    }

    #[test]
    fn test_zero_beyond_horizon_and_error_before_origin() {
        let model = model(vec![single_point()], Assumptions::flat(0.01, 0.03), 6);
        let src = CashflowSource::Actual;
        assert_eq!(model.cashflow(Cashflow::PolsIf, 500, src).unwrap().values(), &[0.0]);
        assert!(matches!(
            model.cashflow(Cashflow::PolsIf, -1, src),
            Err(crate::error::EngineError::NegativeTime { t: -1, .. })
        ));
    }

    #[test]
    fn test_cashflow_identities() {
        let mut a = Assumptions::flat(0.01, 0.03);
        a.lapse = ByBasis::uniform(LapseTable::flat(0.1));
        a.inflation = ByBasis::uniform(0.02);
        a.product = ProductTerms {
            acquisition: ExpenseLoading { fixed: 200.0, pct_premium: 0.1, pct_sum_assured: 0.0 },
            maintenance: ExpenseLoading { fixed: 60.0, pct_premium: 0.02, pct_sum_assured: 0.0 },
            claim: ExpenseLoading::fixed(50.0),
            commission: YearTable::new(vec![0.3, 0.05]),
            risk_adjustment: YearTable::flat(0.05),
            surrender_value: YearTable::new(vec![0.0, 0.5]),
            surrender_lock_in_months: 12,
            maturity_factor: 0.5,
        };
        let point = ModelPoint::new(7, 35, Sex::Female, 3, 2, 2_400.0, 50_000.0, 10.0, issue_date());
        let model = model(vec![point], a, 12);
        let src = CashflowSource::Actual;
        let at = |cf, t| model.cashflow(cf, t, src).unwrap().get(0);

        for t in 1..=model.horizon() {
            let start = at(Cashflow::ExpsAcq, t)
                + at(Cashflow::ExpsMaint, t)
                + at(Cashflow::CommInit, t)
                + at(Cashflow::CommRen, t)
                + at(Cashflow::MatBen, t)
                + at(Cashflow::ExpsClaimMat, t);
            let end = at(Cashflow::DthBen, t)
                + at(Cashflow::SurrBen, t)
                + at(Cashflow::ExpsClaimDth, t)
                + at(Cashflow::ExpsClaimSurr, t);
            let split = at(Cashflow::InsuranceServiceOutflow, t) + at(Cashflow::ExpsAcq, t) + at(Cashflow::InvComp, t);
            assert_relative_eq!(start + end, split, epsilon = 1e-8);
        }

        assert!(at(Cashflow::ExpsAcq, 1) > 0.0);
        assert_eq!(at(Cashflow::ExpsAcq, 2), 0.0);
        assert_eq!(at(Cashflow::ExpsMaint, 1), 0.0);
        assert!(at(Cashflow::CommInit, 12) > 0.0);
        assert_eq!(at(Cashflow::CommRen, 12), 0.0);
        // no surrender value inside the lock-in, then half of premiums paid
        assert_eq!(at(Cashflow::SurrBen, 12), 0.0);
        assert_relative_eq!(at(Cashflow::SurrBen, 13), at(Cashflow::PolsLapse, 13) * 0.5 * 200.0 * 13.0, epsilon = 1e-8);
        // premiums stop after two years
        assert_eq!(at(Cashflow::Prem, 25), 0.0);
        assert!(at(Cashflow::MatBen, 37) > 0.0);
    }

    #[test]
    fn test_future_policies_sum_remaining_in_force() {
        let model = model(vec![single_point()], Assumptions::flat(0.01, 0.03), 6);
        let src = CashflowSource::Expected;
        let direct: f64 = (1..=12).map(|t| model.cashflow(Cashflow::PolsIf, t - 1, src).unwrap().get(0)).sum();
        assert_relative_eq!(model.cashflow(Cashflow::FuturePolicies, 1, src).unwrap().get(0), direct, epsilon = 1e-12);
        assert_eq!(model.cashflow(Cashflow::FuturePolicies, 13, src).unwrap().get(0), 0.0);
    }
}
