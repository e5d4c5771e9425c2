//! IFRS 17 Engine CLI
//!
//! Runs a valuation and roll-forward over a model-point file and writes the results

use anyhow::{bail, Context as _};
use chrono::NaiveDate;
use clap::{Parser, ValueEnum};
use ifrs17_engine::assumptions::loader::DEFAULT_ASSUMPTIONS_PATH;
use ifrs17_engine::policy::load_model_points;
use ifrs17_engine::{run, Assumptions, ExportMode, PointSelection, RunConfig, Tolerance, ValuationPoint};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Csv,
    Json,
}

/// Recursive, memoised IFRS 17 valuation and roll-forward
#[derive(Parser, Debug)]
#[command(name = "ifrs17", version)]
struct Cli {
    /// Model-point CSV file
    #[arg(long, default_value = "data/model_points.csv")]
    model_points: PathBuf,

    /// Directory of assumption tables
    #[arg(long, default_value = DEFAULT_ASSUMPTIONS_PATH)]
    assumptions: PathBuf,

    /// Run only these model points (repeatable)
    #[arg(long = "point")]
    points: Vec<u32>,

    /// Model points per batch
    #[arg(long, default_value_t = 1000)]
    batch_size: usize,

    /// Valuation month, counted from each point's projection origin
    #[arg(long, default_value_t = 12, conflicts_with = "valuation_date")]
    valuation_month: i32,

    /// Valuation date (YYYY-MM-DD); overrides the valuation month
    #[arg(long)]
    valuation_date: Option<NaiveDate>,

    /// Absolute reconciliation tolerance
    #[arg(long, default_value_t = 1e-6)]
    abs_tolerance: f64,

    /// Relative reconciliation tolerance
    #[arg(long, default_value_t = 1e-6)]
    rel_tolerance: f64,

    /// Skip the reconciliation checks
    #[arg(long)]
    no_verify: bool,

    /// Output file; cohort totals go next to it for CSV output
    #[arg(long, short)]
    output: Option<PathBuf>,

    #[arg(long, value_enum, default_value = "csv")]
    format: OutputFormat,
}

impl Cli {
    fn run_config(&self) -> anyhow::Result<RunConfig> {
        if self.batch_size == 0 {
            bail!("--batch-size must be positive");
        }
        let selection = match self.points.as_slice() {
            [] => PointSelection::All,
            [id] => PointSelection::Single(*id),
            ids => PointSelection::List(ids.to_vec()),
        };
        let valuation = match self.valuation_date {
            Some(date) => ValuationPoint::Date(date),
            None => ValuationPoint::Month(self.valuation_month),
        };
        let export = match (&self.output, self.format) {
            (None, _) => ExportMode::InMemory,
            (Some(path), OutputFormat::Csv) => ExportMode::Csv(path.clone()),
            (Some(path), OutputFormat::Json) => ExportMode::Json(path.clone()),
        };
        Ok(RunConfig {
            selection,
            batch_size: self.batch_size,
            valuation,
            tolerance: Tolerance { absolute: self.abs_tolerance, relative: self.rel_tolerance },
            verify: !self.no_verify,
            export,
        })
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let config = cli.run_config()?;

    let start = Instant::now();
    let points = load_model_points(&cli.model_points)
        .with_context(|| format!("loading model points from {}", cli.model_points.display()))?;
    let assumptions = Assumptions::from_csv_path(&cli.assumptions)
        .with_context(|| format!("loading assumptions from {}", cli.assumptions.display()))?;
    println!("Loaded {} model points in {:?}", points.len(), start.elapsed());

    let results = run(&points, Arc::new(assumptions), &config).context("valuation run failed")?;

    println!("\nPortfolio summary ({} points, {} months):", results.points, results.months());
    println!("{:>5} {:>16} {:>16} {:>16} {:>16} {:>16}", "Month", "BEL", "RA", "CSM", "LC", "Profit");
    let column = |name: &str, t: usize| results.get(name).and_then(|v| v.get(t)).copied().unwrap_or(0.0);
    for t in (0..results.months()).step_by(12) {
        println!(
            "{:>5} {:>16.2} {:>16.2} {:>16.2} {:>16.2} {:>16.2}",
            t,
            column("BEL.CLOSING", t),
            column("RA.CLOSING", t),
            column("CSM.CLOSING", t),
            column("LC.CLOSING", t),
            column("PNL.PROFIT", t),
        );
    }
    for (cohort, count) in &results.cohort_counts {
        println!("  {cohort}: {count} points");
    }

    match &config.export {
        ExportMode::InMemory => {}
        ExportMode::Csv(path) | ExportMode::Json(path) => println!("\nOutput written to {}", path.display()),
    }
    println!("Total time: {:?}", start.elapsed());
    Ok(())
}
