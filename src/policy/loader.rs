//! Load model points from a CSV file

use super::{ModelPoint, Sex};
use crate::error::{EngineError, Result};
use chrono::NaiveDate;
use csv::Reader;
use std::path::Path;

/// Raw CSV row matching the model-point file columns
#[derive(Debug, serde::Deserialize)]
struct CsvRow {
    #[serde(rename = "PointId")]
    point_id: u32,
    #[serde(rename = "IssueAge")]
    issue_age: u8,
    #[serde(rename = "Sex")]
    sex: String,
    #[serde(rename = "PolicyTerm")]
    policy_term: u32,
    #[serde(rename = "PremPayingTerm")]
    prem_term: u32,
    #[serde(rename = "AnnualPremium")]
    annual_premium: f64,
    #[serde(rename = "SumAssured")]
    sum_assured: f64,
    #[serde(rename = "PolicyCount")]
    policy_count: f64,
    #[serde(rename = "Duration", default)]
    duration_months: u32,
    #[serde(rename = "IssueDate")]
    issue_date: String,
    #[serde(rename = "Cohort", default)]
    cohort: Option<String>,
}

impl CsvRow {
    fn to_model_point(self) -> Result<ModelPoint> {
        let invalid = |reason: String| EngineError::InvalidModelPoint { point_id: self.point_id, reason };

        let sex = match self.sex.as_str() {
            "M" | "Male" => Sex::Male,
            "F" | "Female" => Sex::Female,
            other => return Err(invalid(format!("unknown sex {other:?}"))),
        };

        let issue_date = NaiveDate::parse_from_str(&self.issue_date, "%Y-%m-%d")
            .map_err(|e| invalid(format!("bad issue date {:?}: {e}", self.issue_date)))?;

        let point = ModelPoint {
            point_id: self.point_id,
            issue_age: self.issue_age,
            sex,
            policy_term: self.policy_term,
            prem_term: self.prem_term,
            annual_premium: self.annual_premium,
            sum_assured: self.sum_assured,
            policy_count: self.policy_count,
            duration_months: self.duration_months,
            issue_date,
            cohort: self.cohort.filter(|c| !c.trim().is_empty()),
        };
        point.validate()?;
        Ok(point)
    }
}

/// Load all model points from a CSV file
pub fn load_model_points<P: AsRef<Path>>(path: P) -> Result<Vec<ModelPoint>> {
    let path = path.as_ref();
    let reader = Reader::from_path(path).map_err(|e| EngineError::csv(path, e))?;
    read_rows(reader, path)
}

/// Load model points from any reader (e.g., string buffer)
pub fn load_model_points_from_reader<R: std::io::Read>(reader: R) -> Result<Vec<ModelPoint>> {
    read_rows(Reader::from_reader(reader), Path::new("<reader>"))
}

fn read_rows<R: std::io::Read>(mut reader: Reader<R>, path: &Path) -> Result<Vec<ModelPoint>> {
    let mut points = Vec::new();
    for result in reader.deserialize() {
        let row: CsvRow = result.map_err(|e| EngineError::csv(path, e))?;
        points.push(row.to_model_point()?);
    }
    log::debug!("loaded {} model points from {}", points.len(), path.display());
    Ok(points)
}
