//! Model points as parallel vectors

use crate::error::{EngineError, Result};
use crate::policy::{ModelPoint, Sex};
use crate::series::{Month, Series};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// When the valuation happens, per policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValuationPoint {
    /// Same projection month for every model point
    Month(Month),
    /// Calendar date; each model point gets its own month from its issue date
    Date(NaiveDate),
}

impl Default for ValuationPoint {
    fn default() -> Self {
        ValuationPoint::Month(12)
    }
}

/// Selected model points, one entry per point in every vector
#[derive(Debug, Clone)]
pub struct Population {
    points: Vec<ModelPoint>,
    issue_age: Vec<u32>,
    sex: Vec<Sex>,
    duration: Vec<u32>,
    term_months: Vec<u32>,
    prem_term_months: Vec<u32>,
    projection_length: Vec<Month>,
    valuation_month: Vec<Month>,
    annual_premium: Series,
    monthly_premium: Series,
    sum_assured: Series,
    policy_count: Series,
}

impl Population {
    pub fn new(points: Vec<ModelPoint>, valuation: ValuationPoint) -> Result<Self> {
        if points.is_empty() {
            return Err(EngineError::EmptySelection);
        }
        for point in &points {
            point.validate()?;
        }

        let valuation_month = points
            .iter()
            .map(|p| {
                let month = match valuation {
                    ValuationPoint::Month(m) => m,
                    ValuationPoint::Date(date) => p.months_to(date),
                };
                if month < 1 {
                    Err(EngineError::InvalidValuationMonth { point_id: p.point_id, month })
                } else {
                    Ok(month)
                }
            })
            .collect::<Result<Vec<_>>>()?;

        let column = |f: fn(&ModelPoint) -> f64| Series::from_vec(points.iter().map(f).collect());

        Ok(Self {
            issue_age: points.iter().map(|p| p.issue_age as u32).collect(),
            sex: points.iter().map(|p| p.sex).collect(),
            duration: points.iter().map(|p| p.duration_months).collect(),
            term_months: points.iter().map(|p| p.term_months()).collect(),
            prem_term_months: points.iter().map(|p| p.prem_term_months()).collect(),
            projection_length: points.iter().map(|p| p.projection_length()).collect(),
            valuation_month,
            annual_premium: column(|p| p.annual_premium),
            monthly_premium: column(|p| p.monthly_premium()),
            sum_assured: column(|p| p.sum_assured),
            policy_count: column(|p| p.policy_count),
            points,
        })
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[ModelPoint] {
        &self.points
    }

    pub fn point_id(&self, i: usize) -> u32 {
        self.points[i].point_id
    }

    pub fn sex(&self) -> &[Sex] {
        &self.sex
    }

    pub fn annual_premium(&self) -> &Series {
        &self.annual_premium
    }

    pub fn monthly_premium(&self) -> &Series {
        &self.monthly_premium
    }

    pub fn sum_assured(&self) -> &Series {
        &self.sum_assured
    }

    pub fn policy_count(&self) -> &Series {
        &self.policy_count
    }

    pub fn prem_term_months(&self) -> &[u32] {
        &self.prem_term_months
    }

    pub fn valuation_months(&self) -> &[Month] {
        &self.valuation_month
    }

    /// Longest projection length, maturity month included
    pub fn max_projection_length(&self) -> Month {
        self.projection_length.iter().copied().max().unwrap_or(0)
    }

    /// Policy month (1-based) that month `t` of the projection falls in
    pub fn duration(&self, t: Month) -> Vec<u32> {
        self.duration.iter().map(|&d| (d as Month + t).max(0) as u32).collect()
    }

    pub fn policy_year(&self, t: Month) -> Vec<u32> {
        self.duration(t).into_iter().map(|d| d.saturating_sub(1) / 12 + 1).collect()
    }

    pub fn attained_age(&self, t: Month) -> Vec<u32> {
        self.duration(t)
            .into_iter()
            .zip(&self.issue_age)
            .map(|(d, &age)| age + d.saturating_sub(1) / 12)
            .collect()
    }

    /// Month `t` is within the policy term
    pub fn active(&self, t: Month) -> Vec<bool> {
        self.duration(t)
            .into_iter()
            .zip(&self.term_months)
            .map(|(d, &term)| t >= 1 && d <= term)
            .collect()
    }

    /// Month `t` is within the premium paying term
    pub fn premium_paying(&self, t: Month) -> Vec<bool> {
        self.duration(t)
            .into_iter()
            .zip(&self.prem_term_months)
            .map(|(d, &term)| t >= 1 && d <= term)
            .collect()
    }

    /// Maturity benefit is paid at the start of month `t`
    pub fn maturing(&self, t: Month) -> Vec<bool> {
        self.duration(t)
            .into_iter()
            .zip(&self.term_months)
            .map(|(d, &term)| t >= 1 && d == term + 1)
            .collect()
    }

    /// First policy month
    pub fn issuing(&self, t: Month) -> Vec<bool> {
        self.duration(t).into_iter().map(|d| t >= 1 && d == 1).collect()
    }

    /// `t <= VAL_M`: expected and actual cashflows apply
    pub fn before_valuation(&self, t: Month) -> Vec<bool> {
        self.valuation_month.iter().map(|&v| t <= v).collect()
    }

    /// `t == VAL_M`: experience and assumption changes fire
    pub fn at_valuation(&self, t: Month) -> Vec<bool> {
        self.valuation_month.iter().map(|&v| t == v).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn points() -> Vec<ModelPoint> {
        let issue = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        vec![
            ModelPoint::new(1, 30, Sex::Male, 1, 1, 12_000.0, 100_000.0, 1.0, issue),
            ModelPoint::new(2, 45, Sex::Female, 2, 1, 6_000.0, 50_000.0, 2.0, issue).with_duration(11),
        ]
    }

    #[test]
    fn test_vectors() {
        let pop = Population::new(points(), ValuationPoint::Month(3)).unwrap();
        assert_eq!(pop.len(), 2);
        assert_eq!(pop.max_projection_length(), 14);
        assert_eq!(pop.duration(1), vec![1, 12]);
        assert_eq!(pop.policy_year(2), vec![1, 2]);
        assert_eq!(pop.attained_age(2), vec![30, 46]);
        assert_eq!(pop.premium_paying(2), vec![true, false]);
        assert_eq!(pop.maturing(13), vec![true, false]);
        assert_eq!(pop.issuing(1), vec![true, false]);
        assert_eq!(pop.at_valuation(3), vec![true, true]);
        assert_eq!(pop.monthly_premium().values(), &[1_000.0, 500.0]);
    }

    #[test]
    fn test_valuation_date() {
        let date = NaiveDate::from_ymd_opt(2023, 7, 1).unwrap();
        let pop = Population::new(points(), ValuationPoint::Date(date));
        // second point is 11 months in force at the origin, so its valuation falls before it
        assert!(matches!(pop, Err(EngineError::InvalidValuationMonth { point_id: 2, month: -5 })));

        let later = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let pop = Population::new(points(), ValuationPoint::Date(later)).unwrap();
        assert_eq!(pop.valuation_months(), &[14, 3]);
    }

    #[test]
    fn test_empty_population_is_rejected() {
        assert!(matches!(
            Population::new(vec![], ValuationPoint::default()),
            Err(EngineError::EmptySelection)
        ));
    }
}
