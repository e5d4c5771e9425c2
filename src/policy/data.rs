//! Model-point records and point selection

use crate::error::{EngineError, Result};
use crate::series::Month;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Sex of the insured life
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::Male => "M",
            Sex::Female => "F",
        }
    }
}

/// A single model point from the model-point file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelPoint {
    /// Unique model-point identifier
    pub point_id: u32,

    /// Age at entry
    pub issue_age: u8,

    pub sex: Sex,

    /// Policy term in years
    pub policy_term: u32,

    /// Premium paying term in years
    pub prem_term: u32,

    /// Annual premium per policy
    pub annual_premium: f64,

    /// Death benefit per policy
    pub sum_assured: f64,

    /// Number of policies represented (fractional for weighted points)
    pub policy_count: f64,

    /// Elapsed duration in months at the projection origin
    #[serde(default)]
    pub duration_months: u32,

    pub issue_date: NaiveDate,

    /// Reporting cohort; derived from issue year and profitability when absent
    #[serde(default)]
    pub cohort: Option<String>,
}

impl ModelPoint {
    /// Create a new-business model point with required fields
    pub fn new(
        point_id: u32,
        issue_age: u8,
        sex: Sex,
        policy_term: u32,
        prem_term: u32,
        annual_premium: f64,
        sum_assured: f64,
        policy_count: f64,
        issue_date: NaiveDate,
    ) -> Self {
        Self {
            point_id,
            issue_age,
            sex,
            policy_term,
            prem_term,
            annual_premium,
            sum_assured,
            policy_count,
            duration_months: 0,
            issue_date,
            cohort: None,
        }
    }

    pub fn with_cohort(mut self, cohort: impl Into<String>) -> Self {
        self.cohort = Some(cohort.into());
        self
    }

    pub fn with_duration(mut self, months: u32) -> Self {
        self.duration_months = months;
        self
    }

    pub fn term_months(&self) -> u32 {
        self.policy_term * 12
    }

    pub fn prem_term_months(&self) -> u32 {
        self.prem_term * 12
    }

    pub fn monthly_premium(&self) -> f64 {
        self.annual_premium / 12.0
    }

    /// Months until maturity is paid, counted from the projection origin
    pub fn projection_length(&self) -> Month {
        self.term_months() as Month - self.duration_months as Month + 1
    }

    pub fn issue_year(&self) -> i32 {
        self.issue_date.year()
    }

    /// Whole months from the projection origin to `date`
    pub fn months_to(&self, date: NaiveDate) -> Month {
        let issue = self.issue_date;
        let mut months = (date.year() - issue.year()) * 12 + date.month() as i32 - issue.month() as i32;
        if date.day() < issue.day() {
            months -= 1;
        }
        months - self.duration_months as Month
    }

    pub fn validate(&self) -> Result<()> {
        let fail = |reason: &str| {
            Err(EngineError::InvalidModelPoint { point_id: self.point_id, reason: reason.to_string() })
        };
        if self.policy_term == 0 {
            return fail("policy term must be positive");
        }
        if self.prem_term > self.policy_term {
            return fail("premium term exceeds policy term");
        }
        if self.policy_count < 0.0 || !self.policy_count.is_finite() {
            return fail("policy count must be a non-negative number");
        }
        if self.annual_premium < 0.0 || self.sum_assured < 0.0 {
            return fail("premium and sum assured must be non-negative");
        }
        if self.duration_months >= self.term_months() {
            return fail("elapsed duration is beyond the policy term");
        }
        Ok(())
    }
}

/// Which model points a run covers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PointSelection {
    #[default]
    All,
    Single(u32),
    List(Vec<u32>),
}

impl PointSelection {
    /// Apply the selection, preserving the order of `points` for `All` and the order
    /// of the requested ids otherwise.
    pub fn apply(&self, points: &[ModelPoint]) -> Result<Vec<ModelPoint>> {
        let find = |id: u32| {
            points
                .iter()
                .find(|p| p.point_id == id)
                .cloned()
                .ok_or(EngineError::UnknownPoint(id))
        };
        let selected = match self {
            PointSelection::All => points.to_vec(),
            PointSelection::Single(id) => vec![find(*id)?],
            PointSelection::List(ids) => ids.iter().map(|&id| find(id)).collect::<Result<Vec<_>>>()?,
        };
        if selected.is_empty() {
            return Err(EngineError::EmptySelection);
        }
        Ok(selected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_point() -> ModelPoint {
        ModelPoint::new(
            7,
            40,
            Sex::Female,
            10,
            5,
            1_200.0,
            100_000.0,
            2.0,
            NaiveDate::from_ymd_opt(2020, 3, 15).unwrap(),
        )
    }

    #[test]
    fn test_terms() {
        let p = test_point();
        assert_eq!(p.term_months(), 120);
        assert_eq!(p.prem_term_months(), 60);
        assert_eq!(p.projection_length(), 121);
        assert_eq!(p.clone().with_duration(24).projection_length(), 97);
        assert!((p.monthly_premium() - 100.0).abs() < 1e-12);
    }

    #[test]
    fn test_months_to_valuation_date() {
        let p = test_point();
        assert_eq!(p.months_to(NaiveDate::from_ymd_opt(2021, 3, 15).unwrap()), 12);
        assert_eq!(p.months_to(NaiveDate::from_ymd_opt(2021, 3, 14).unwrap()), 11);
        assert_eq!(p.clone().with_duration(6).months_to(NaiveDate::from_ymd_opt(2021, 3, 31).unwrap()), 6);
    }

    #[test]
    fn test_validation() {
        assert!(test_point().validate().is_ok());

        let mut bad = test_point();
        bad.prem_term = 11;
        assert!(matches!(bad.validate(), Err(EngineError::InvalidModelPoint { point_id: 7, .. })));

        assert!(test_point().with_duration(120).validate().is_err());
    }

    #[test]
    fn test_selection() {
        let mut second = test_point();
        second.point_id = 8;
        let points = vec![test_point(), second];

        assert_eq!(PointSelection::All.apply(&points).unwrap().len(), 2);
        assert_eq!(PointSelection::Single(8).apply(&points).unwrap()[0].point_id, 8);

        let listed = PointSelection::List(vec![8, 7]).apply(&points).unwrap();
        assert_eq!(listed.iter().map(|p| p.point_id).collect::<Vec<_>>(), vec![8, 7]);

        assert!(matches!(PointSelection::Single(99).apply(&points), Err(EngineError::UnknownPoint(99))));
        assert!(matches!(PointSelection::List(vec![]).apply(&points), Err(EngineError::EmptySelection)));
    }
}
