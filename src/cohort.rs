//! Grouping of per-policy results by cohort

use crate::error::{EngineError, Result};
use crate::projection::Model;
use crate::series::Series;
use std::collections::{BTreeMap, BTreeSet};

/// A per-policy value offered for aggregation
#[derive(Debug, Clone, PartialEq)]
pub enum ReportValue {
    Numeric(Series),
    /// Descriptive per-policy values; these cannot be summed
    Labels(Vec<String>),
}

/// Sums per-policy vectors into cohorts; output keys are always sorted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CohortAggregator {
    keys: Vec<String>,
}

impl CohortAggregator {
    /// `keys[i]` is the cohort of model point `i`
    pub fn new(keys: Vec<String>) -> Self {
        Self { keys }
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Distinct cohorts in sorted order
    pub fn cohorts(&self) -> Vec<String> {
        self.keys.iter().cloned().collect::<BTreeSet<_>>().into_iter().collect()
    }

    /// Grouped sum of one value.
    ///
    /// Labels are not additive and return [`EngineError::NonAdditive`]; callers decide
    /// what to report instead.
    pub fn sum(&self, name: &str, value: &ReportValue) -> Result<BTreeMap<String, f64>> {
        let series = match value {
            ReportValue::Numeric(series) => series,
            ReportValue::Labels(_) => return Err(EngineError::NonAdditive { series: name.to_string() }),
        };
        debug_assert_eq!(series.len(), self.keys.len(), "cohort keys must cover the population");

        let mut totals = BTreeMap::new();
        for (key, value) in self.keys.iter().zip(series.values()) {
            *totals.entry(key.clone()).or_insert(0.0) += value;
        }
        Ok(totals)
    }

    /// Grouped sum at every time step, one vector per cohort
    pub fn sum_series(&self, name: &str, steps: &[ReportValue]) -> Result<BTreeMap<String, Vec<f64>>> {
        let mut grouped: BTreeMap<String, Vec<f64>> =
            self.cohorts().into_iter().map(|c| (c, vec![0.0; steps.len()])).collect();
        for (t, value) in steps.iter().enumerate() {
            for (cohort, total) in self.sum(name, value)? {
                if let Some(series) = grouped.get_mut(&cohort) {
                    series[t] = total;
                }
            }
        }
        Ok(grouped)
    }

    /// Model points per cohort
    pub fn count(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for key in &self.keys {
            *counts.entry(key.clone()).or_insert(0) += 1;
        }
        counts
    }

    /// Sorted distinct labels per cohort
    pub fn distinct_labels(&self, labels: &[String]) -> BTreeMap<String, Vec<String>> {
        let mut grouped: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for (key, label) in self.keys.iter().zip(labels) {
            grouped.entry(key.clone()).or_default().insert(label.clone());
        }
        grouped.into_iter().map(|(k, v)| (k, v.into_iter().collect())).collect()
    }
}

impl Model {
    /// Cohort of every model point: the point's own code, or issue year and whether it
    /// was profitable at recognition
    pub fn cohort_keys(&self) -> Result<Vec<String>> {
        let profitable = self.profitable_at_recognition()?;
        Ok(self
            .population
            .points()
            .iter()
            .zip(profitable)
            .map(|(point, p)| match &point.cohort {
                Some(code) => code.clone(),
                None => format!("COH_{}_{}", point.issue_year(), u8::from(p)),
            })
            .collect())
    }

    pub fn cohort_aggregator(&self) -> Result<CohortAggregator> {
        Ok(CohortAggregator::new(self.cohort_keys()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assumptions::Assumptions;
    use crate::policy::{ModelPoint, Sex};
    use crate::projection::test_support::*;
    use crate::rollforward::{Balance, Component};
    use approx::assert_relative_eq;

    fn aggregator() -> CohortAggregator {
        CohortAggregator::new(vec!["B".into(), "A".into(), "B".into()])
    }

    #[test]
    fn test_sum_is_sorted_and_additive() {
        let value = ReportValue::Numeric(Series::from_vec(vec![1.0, 2.0, 4.0]));
        let sums = aggregator().sum("PREM", &value).unwrap();
        assert_eq!(sums.keys().collect::<Vec<_>>(), vec!["A", "B"]);
        assert_eq!(sums["B"], 5.0);
        assert_eq!(sums.values().sum::<f64>(), 7.0);
    }

    #[test]
    fn test_labels_are_not_additive() {
        let agg = aggregator();
        let labels = vec!["M".to_string(), "F".to_string(), "F".to_string()];
        match agg.sum("SEX", &ReportValue::Labels(labels.clone())) {
            Err(EngineError::NonAdditive { series }) => assert_eq!(series, "SEX"),
            other => panic!("expected NonAdditive, got {other:?}"),
        }
        let distinct = agg.distinct_labels(&labels);
        assert_eq!(distinct["B"], vec!["F".to_string(), "M".to_string()]);
        assert_eq!(agg.count()["B"], 2);
    }

    #[test]
    fn test_cohort_series_add_up_to_population() {
        let points = vec![
            single_point(),
            ModelPoint::new(2, 50, Sex::Female, 2, 2, 3_000.0, 80_000.0, 4.0, issue_date()).with_cohort("LEGACY"),
            ModelPoint::new(3, 60, Sex::Male, 1, 1, 500.0, 200_000.0, 2.0, issue_date()),
        ];
        let model = model(points, Assumptions::flat(0.01, 0.03), 6);
        let agg = model.cohort_aggregator().unwrap();
        assert_eq!(agg.cohorts(), vec!["COH_2023_0", "COH_2023_1", "LEGACY"]);

        let steps: Vec<ReportValue> = (0..=model.horizon())
            .map(|t| ReportValue::Numeric(model.balance(Component::Bel, Balance::Closing, t).unwrap()))
            .collect();
        let grouped = agg.sum_series("BEL.CLOSING", &steps).unwrap();
        for (t, step) in steps.iter().enumerate() {
            let ReportValue::Numeric(series) = step else { unreachable!() };
            let by_cohort: f64 = grouped.values().map(|v| v[t]).sum();
            assert_relative_eq!(by_cohort, series.sum(), epsilon = 1e-9, max_relative = 1e-12);
        }
    }
}
