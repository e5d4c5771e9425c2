//! CSV and JSON output of run results

use crate::error::{EngineError, Result};
use crate::run::RunResults;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Population totals: one row per month, one column per series
pub fn write_csv(path: &Path, results: &RunResults) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| EngineError::csv(path, e))?;

    let mut header = vec!["Month".to_string()];
    header.extend(results.series.keys().cloned());
    writer.write_record(&header).map_err(|e| EngineError::csv(path, e))?;

    for t in 0..results.months() {
        let mut row = vec![t.to_string()];
        for values in results.series.values() {
            row.push(format!("{:.6}", values.get(t).copied().unwrap_or(0.0)));
        }
        writer.write_record(&row).map_err(|e| EngineError::csv(path, e))?;
    }
    writer.flush().map_err(|e| EngineError::io(path, e))?;
    log::info!("Wrote {} series to {}", results.series.len(), path.display());
    Ok(())
}

/// Cohort totals in long format: series, cohort, month, value
pub fn write_cohort_csv(path: &Path, results: &RunResults) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| EngineError::csv(path, e))?;
    writer
        .write_record(["Series", "Cohort", "Month", "Value"])
        .map_err(|e| EngineError::csv(path, e))?;

    for (name, cohorts) in &results.cohort_series {
        for (cohort, values) in cohorts {
            for (t, value) in values.iter().enumerate() {
                writer
                    .write_record([name.as_str(), cohort.as_str(), &t.to_string(), &format!("{value:.6}")])
                    .map_err(|e| EngineError::csv(path, e))?;
            }
        }
    }
    writer.flush().map_err(|e| EngineError::io(path, e))?;
    Ok(())
}

/// `results.csv` -> `results_cohorts.csv`
pub fn cohort_path(path: &Path) -> PathBuf {
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("results");
    path.with_file_name(format!("{stem}_cohorts.csv"))
}

/// Everything, population and cohort level, as one JSON document
pub fn write_json(path: &Path, results: &RunResults) -> Result<()> {
    let file = File::create(path).map_err(|e| EngineError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, results)?;
    writer.flush().map_err(|e| EngineError::io(path, e))?;
    log::info!("Wrote results to {}", path.display());
    Ok(())
}
