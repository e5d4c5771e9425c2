//! Run driver: selection, batching, reporting and export

use crate::assumptions::Assumptions;
use crate::basis::CashflowSource;
use crate::cohort::ReportValue;
use crate::error::{EngineError, Result};
use crate::export;
use crate::pnl::{AssetLine, PnlSection};
use crate::policy::{ModelPoint, PointSelection};
use crate::projection::{Cashflow, CellId, Model, ModelSettings, ValuationPoint};
use crate::rollforward::{Balance, Component, Tolerance};
use crate::series::{Month, Series};
use crate::valuation::Measure;
use log::{info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

/// Where results go once a run completes
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ExportMode {
    #[default]
    InMemory,
    /// Population totals to this file, cohort totals next to it
    Csv(PathBuf),
    Json(PathBuf),
}

/// Configuration for a valuation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub selection: PointSelection,

    /// Model points per batch; each batch gets its own model and cache
    pub batch_size: usize,

    pub valuation: ValuationPoint,

    pub tolerance: Tolerance,

    /// Run the reconciliation checks on every batch
    pub verify: bool,

    pub export: ExportMode,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            selection: PointSelection::All,
            batch_size: 1_000,
            valuation: ValuationPoint::default(),
            tolerance: Tolerance::default(),
            verify: true,
            export: ExportMode::InMemory,
        }
    }
}

/// Population and cohort totals of every reported series, by month
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunResults {
    pub points: usize,
    /// Series name to values for months `0..=horizon`
    pub series: BTreeMap<String, Vec<f64>>,
    /// Series name to cohort to values
    pub cohort_series: BTreeMap<String, BTreeMap<String, Vec<f64>>>,
    pub cohort_counts: BTreeMap<String, usize>,
    /// Descriptive fields per cohort, which are listed rather than summed
    pub cohort_labels: BTreeMap<String, BTreeMap<String, Vec<String>>>,
}

impl RunResults {
    /// Months covered, origin included
    pub fn months(&self) -> usize {
        self.series.values().map(Vec::len).max().unwrap_or(0)
    }

    pub fn get(&self, name: &str) -> Option<&[f64]> {
        self.series.get(name).map(Vec::as_slice)
    }

    /// Combine the results of two disjoint batches.
    ///
    /// Every reported series is a sum over model points, so batches add; shorter series
    /// are padded with zeros.
    pub fn merge(mut self, other: RunResults) -> RunResults {
        self.points += other.points;
        for (name, values) in other.series {
            add_padded(self.series.entry(name).or_default(), &values);
        }
        for (name, cohorts) in other.cohort_series {
            let target = self.cohort_series.entry(name).or_default();
            for (cohort, values) in cohorts {
                add_padded(target.entry(cohort).or_default(), &values);
            }
        }
        for (cohort, count) in other.cohort_counts {
            *self.cohort_counts.entry(cohort).or_insert(0) += count;
        }
        for (name, cohorts) in other.cohort_labels {
            let target = self.cohort_labels.entry(name).or_default();
            for (cohort, labels) in cohorts {
                let merged: BTreeSet<String> =
                    target.remove(&cohort).unwrap_or_default().into_iter().chain(labels).collect();
                target.insert(cohort, merged.into_iter().collect());
            }
        }
        self
    }
}

fn add_padded(target: &mut Vec<f64>, values: &[f64]) {
    if target.len() < values.len() {
        target.resize(values.len(), 0.0);
    }
    for (t, v) in target.iter_mut().zip(values) {
        *t += v;
    }
}

/// Select model points, run them in batches and export the merged results.
pub fn run(points: &[ModelPoint], assumptions: Arc<Assumptions>, config: &RunConfig) -> Result<RunResults> {
    let start = Instant::now();
    let selected = config.selection.apply(points)?;
    if config.batch_size == 0 {
        warn!("Batch size 0 requested; running a single batch");
    }
    let batch_size = if config.batch_size == 0 { selected.len() } else { config.batch_size };
    let batches: Vec<&[ModelPoint]> = selected.chunks(batch_size).collect();
    info!("Running {} model points in {} batches", selected.len(), batches.len());

    let settings = ModelSettings {
        valuation: config.valuation,
        tolerance: config.tolerance,
        ..ModelSettings::default()
    };

    let results = batches
        .par_iter()
        .enumerate()
        .map(|(i, batch)| {
            let batch_start = Instant::now();
            let model = Model::new(batch.to_vec(), Arc::clone(&assumptions), settings)?;
            model.prime_ledger()?;
            if config.verify {
                model.reconcile()?;
            }
            let results = report(&model)?;
            let stats = model.cache_stats();
            info!(
                "Batch {} ({} points) done in {:?}: {} cells, {:.1}% cache hits",
                i + 1,
                batch.len(),
                batch_start.elapsed(),
                stats.entries,
                stats.hit_rate() * 100.0
            );
            Ok(results)
        })
        .collect::<Result<Vec<RunResults>>>()?;

    let merged = results.into_iter().fold(RunResults::default(), RunResults::merge);
    info!("Run complete in {:?}", start.elapsed());

    match &config.export {
        ExportMode::InMemory => {}
        ExportMode::Csv(path) => {
            export::write_csv(path, &merged)?;
            export::write_cohort_csv(&export::cohort_path(path), &merged)?;
        }
        ExportMode::Json(path) => export::write_json(path, &merged)?,
    }
    Ok(merged)
}

type CellFn<'a> = Box<dyn Fn(Month) -> Result<Series> + 'a>;

/// A reported field: a numeric cell evaluated month by month, or per-policy labels
enum Field<'a> {
    Cell(CellFn<'a>),
    Labels(Vec<String>),
}

/// Every reported field of a primed model, by name
fn reported_fields(model: &Model) -> Vec<(String, Field<'_>)> {
    let mut cells: Vec<(String, CellFn<'_>)> = Vec::new();

    let mut sources = vec![CashflowSource::Expected, CashflowSource::Actual];
    if model.rebased_source() != CashflowSource::Actual {
        sources.push(model.rebased_source());
    }
    for source in sources {
        for cf in Cashflow::REPORTED {
            cells.push((format!("{source}.{}", cf.code()), Box::new(move |t: Month| model.cashflow(cf, t, source))));
        }
    }

    for ctx in model.ledger_contexts() {
        for measure in Measure::ALL {
            let name = format!("{}[{ctx}]", CellId::Measure(measure));
            cells.push((name, Box::new(move |t: Month| model.measure(measure, t, ctx))));
        }
    }

    for component in Component::ALL {
        for balance in [Balance::Opening, Balance::Closing] {
            let name = CellId::Balance(component, balance).to_string();
            cells.push((name, Box::new(move |t: Month| model.balance(component, balance, t))));
        }
        for &movement in model.registry().movements(component) {
            let name = CellId::Movement(component, movement).to_string();
            cells.push((name, Box::new(move |t: Month| model.movement(component, movement, t))));
        }
    }

    for section in PnlSection::ALL {
        for &line in section.lines() {
            cells.push((CellId::Pnl(line).to_string(), Box::new(move |t: Month| model.pnl(line, t))));
        }
        cells.push((CellId::PnlSection(section).to_string(), Box::new(move |t: Month| model.pnl_section(section, t))));
    }
    cells.push((CellId::Profit.to_string(), Box::new(move |t: Month| model.profit(t))));

    for line in AssetLine::ALL {
        cells.push((CellId::Assets(line).to_string(), Box::new(move |t: Month| model.assets(line, t))));
    }

    let points = model.population().points();
    let labels: [(&str, Vec<String>); 3] = [
        ("POINT_ID", points.iter().map(|p| p.point_id.to_string()).collect()),
        ("SEX", points.iter().map(|p| p.sex.as_str().to_string()).collect()),
        ("ISSUE_DATE", points.iter().map(|p| p.issue_date.to_string()).collect()),
    ];
    cells
        .into_iter()
        .map(|(name, cell)| (name, Field::Cell(cell)))
        .chain(labels.into_iter().map(|(name, values)| (name.to_string(), Field::Labels(values))))
        .collect()
}

/// Population and cohort totals for one model
pub fn report(model: &Model) -> Result<RunResults> {
    let aggregator = model.cohort_aggregator()?;
    let months: Vec<Month> = (0..=model.horizon()).collect();
    let ledger_prefixes: Vec<String> = Component::ALL
        .iter()
        .map(|c| format!("{}.", c.code()))
        .chain(["PNL.".to_string(), "ASSETS.".to_string()])
        .collect();

    let mut results = RunResults { points: model.len(), ..RunResults::default() };
    results.cohort_counts = aggregator.count();
    for (name, field) in reported_fields(model) {
        let steps = match field {
            Field::Cell(cell) => months
                .iter()
                .map(|&t| cell(t).map(ReportValue::Numeric))
                .collect::<Result<Vec<_>>>()?,
            Field::Labels(labels) => vec![ReportValue::Labels(labels)],
        };
        match aggregator.sum_series(&name, &steps) {
            Ok(by_cohort) => {
                let totals: Vec<f64> = (0..steps.len())
                    .map(|t| by_cohort.values().map(|v| v[t]).sum::<f64>())
                    .collect();
                if ledger_prefixes.iter().any(|p| name.starts_with(p.as_str())) {
                    results.cohort_series.insert(name.clone(), by_cohort);
                }
                results.series.insert(name, totals);
            }
            Err(EngineError::NonAdditive { .. }) => {
                for step in &steps {
                    if let ReportValue::Labels(labels) = step {
                        results.cohort_labels.insert(name.clone(), aggregator.distinct_labels(labels));
                    }
                }
            }
            Err(other) => return Err(other),
        }
    }
    Ok(results)
}
