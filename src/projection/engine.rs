//! The model: one population, one set of assumptions, one cell cache

use super::cells::{Cashflow, CellId, CellRef};
use super::population::{Population, ValuationPoint};
use crate::assumptions::Assumptions;
use crate::basis::{Basis, CashflowSource, Context};
use crate::error::Result;
use crate::policy::ModelPoint;
use crate::pnl::AssetLine;
use crate::rollforward::{Balance, Component, LedgerRegistry, Tolerance};
use crate::series::{CacheStats, Eval, Month, Series, SeriesCache, DEFAULT_MAX_DEPTH};
use crate::valuation::{Measure, Stream};
use log::debug;
use rayon::prelude::*;
use std::collections::{BTreeSet, HashSet};
use std::hash::Hash;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

/// Configuration for one model
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelSettings {
    /// Valuation month, or a date converted per model point
    pub valuation: ValuationPoint,

    /// Limit on nested cell evaluations per thread
    pub max_depth: usize,

    /// Tolerance used by the reconciliation checks
    pub tolerance: Tolerance,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            valuation: ValuationPoint::default(),
            max_depth: DEFAULT_MAX_DEPTH,
            tolerance: Tolerance::default(),
        }
    }
}

/// Valuation and roll-forward model over a batch of model points
///
/// Every quantity is a cell keyed by time and context. Cells are evaluated on demand and
/// memoised for the lifetime of the model, which is one run or one batch.
#[derive(Debug)]
pub struct Model {
    pub(crate) population: Population,
    pub(crate) assumptions: Arc<Assumptions>,
    pub(crate) settings: ModelSettings,
    pub(crate) registry: LedgerRegistry,
    horizon: Month,
    cache: SeriesCache<CellRef>,
    /// Sources whose projection has been filled forward in time
    projected: RwLock<HashSet<CashflowSource>>,
    /// Contexts whose present values have been filled backward in time
    valued: RwLock<HashSet<Context>>,
    /// Last month whose ledger cells are all cached, `-1` before any
    ledger_filled: AtomicI32,
}

impl Model {
    pub fn new(points: Vec<ModelPoint>, assumptions: Arc<Assumptions>, settings: ModelSettings) -> Result<Self> {
        let population = Population::new(points, settings.valuation)?;
        let horizon = population.max_projection_length();
        let registry = LedgerRegistry::new(&assumptions.scenarios);
        debug!(
            "Model over {} points, horizon {} months, {} rebased assumptions",
            population.len(),
            horizon,
            assumptions.scenarios.rebased_assumptions().len()
        );

        Ok(Self {
            population,
            assumptions,
            settings,
            registry,
            horizon,
            cache: SeriesCache::new(settings.max_depth),
            projected: RwLock::new(HashSet::new()),
            valued: RwLock::new(HashSet::new()),
            ledger_filled: AtomicI32::new(-1),
        })
    }

    pub fn population(&self) -> &Population {
        &self.population
    }

    pub fn assumptions(&self) -> &Assumptions {
        &self.assumptions
    }

    pub fn settings(&self) -> &ModelSettings {
        &self.settings
    }

    pub fn registry(&self) -> &LedgerRegistry {
        &self.registry
    }

    /// Last month with a non-zero projection; every cell is zero after it
    pub fn horizon(&self) -> Month {
        self.horizon
    }

    pub fn len(&self) -> usize {
        self.population.len()
    }

    pub fn is_empty(&self) -> bool {
        self.population.is_empty()
    }

    pub fn zeros(&self) -> Series {
        Series::zeros(self.population.len())
    }

    /// Fully rebased projection used after the valuation month
    pub fn rebased_source(&self) -> CashflowSource {
        CashflowSource::rebased(self.assumptions.scenarios.max_scenario())
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// How many times the formula behind `key` has run
    pub fn executions(&self, key: &CellRef) -> u32 {
        self.cache.executions(key)
    }

    /// Evaluate a cell through the cache; beyond the horizon every cell is zero.
    ///
    /// On a miss the cells it depends on are filled first, in an order where each
    /// evaluation recurses at most a few steps: projections forward in time, present
    /// values backward, the ledger forward. A cold request for a late month on a long
    /// policy therefore never recurses through the whole horizon.
    pub(crate) fn cell<F>(&self, key: CellRef, formula: F) -> Result<Series>
    where
        F: FnOnce() -> Result<Eval>,
    {
        let t = key.t;
        if t >= 0 && !self.cache.contains(&key) {
            match (key.source, key.basis) {
                (Some(source), None) => self.ensure_projected(source)?,
                (Some(source), Some(basis)) => self.ensure_valued(Context::new(source, basis))?,
                _ => self.ensure_ledger(t)?,
            }
        }
        self.cache.evaluate(key, || {
            if t > self.horizon {
                Ok(Eval::Boundary(self.zeros()))
            } else {
                formula()
            }
        })
    }

    /// Claim `item` for filling; false if it is already filled or being filled
    fn claim<T: Eq + Hash + Copy>(set: &RwLock<HashSet<T>>, item: T) -> bool {
        if set.read().unwrap_or_else(PoisonError::into_inner).contains(&item) {
            return false;
        }
        set.write().unwrap_or_else(PoisonError::into_inner).insert(item)
    }

    fn release<T: Eq + Hash>(set: &RwLock<HashSet<T>>, item: &T) {
        set.write().unwrap_or_else(PoisonError::into_inner).remove(item);
    }

    /// Project `source` forward from the origin, once per model
    fn ensure_projected(&self, source: CashflowSource) -> Result<()> {
        let source = source.normalized();
        if !Self::claim(&self.projected, source) {
            return Ok(());
        }
        let filled = self.project_forward(source);
        if filled.is_err() {
            Self::release(&self.projected, &source);
        }
        filled
    }

    fn project_forward(&self, source: CashflowSource) -> Result<()> {
        for t in 0..=self.horizon {
            for cf in Cashflow::REPORTED {
                self.cashflow(cf, t, source)?;
            }
        }
        for t in (0..=self.horizon).rev() {
            self.cashflow(Cashflow::FuturePolicies, t, source)?;
        }
        Ok(())
    }

    /// Value `ctx` backward from the horizon, once per model
    fn ensure_valued(&self, ctx: Context) -> Result<()> {
        if !Self::claim(&self.valued, ctx) {
            return Ok(());
        }
        let filled = self.value_backward(ctx);
        if filled.is_err() {
            Self::release(&self.valued, &ctx);
        }
        filled
    }

    fn value_backward(&self, ctx: Context) -> Result<()> {
        self.ensure_projected(ctx.source)?;
        for t in (0..=self.horizon + 1).rev() {
            for stream in Stream::ALL {
                self.present_value(stream, t, ctx)?;
            }
        }
        for t in 0..=self.horizon {
            for measure in Measure::ALL {
                self.measure(measure, t, ctx)?;
            }
        }
        Ok(())
    }

    /// Fill the ledger for every month before `t`, oldest first
    fn ensure_ledger(&self, t: Month) -> Result<()> {
        let target = (t - 1).min(self.horizon);
        let filled = self.ledger_filled.load(Ordering::Acquire);
        if target <= filled {
            return Ok(());
        }
        self.prime(&self.ledger_contexts())?;
        for s in filled + 1..=target {
            self.coverage_units(s)?;
            for component in Component::ALL {
                self.balance(component, Balance::Closing, s)?;
            }
            self.profit(s)?;
            self.assets(AssetLine::Closing, s)?;
            self.ledger_filled.fetch_max(s, Ordering::AcqRel);
        }
        Ok(())
    }

    /// Every valuation context the roll-forward reads
    pub fn ledger_contexts(&self) -> Vec<Context> {
        let mut contexts = BTreeSet::new();
        for basis in Basis::ALL {
            contexts.insert((CashflowSource::Actual, basis));
        }
        contexts.insert((CashflowSource::Expected, Basis::Locked));
        for n in 1..=self.assumptions.scenarios.max_scenario() {
            contexts.insert((CashflowSource::Rebased(n), Basis::Locked));
            contexts.insert((CashflowSource::Rebased(n), Basis::Current));
        }
        contexts.into_iter().map(|(s, b)| Context::new(s, b)).collect()
    }

    /// Evaluate projections and present values ahead of the ledger.
    ///
    /// Projection cells run forward in time per source, present values backward per
    /// context, so no evaluation recurses further than one step. Sources, then
    /// contexts, are independent and run in parallel.
    pub fn prime(&self, contexts: &[Context]) -> Result<()> {
        let sources: BTreeSet<CashflowSource> = contexts.iter().map(|c| c.source).collect();
        sources.into_par_iter().try_for_each(|source| self.ensure_projected(source))?;
        contexts.par_iter().try_for_each(|&ctx| self.ensure_valued(ctx))?;

        let stats = self.cache.stats();
        debug!(
            "Primed {} contexts: {} cells, {:.1}% hit rate",
            contexts.len(),
            stats.entries,
            stats.hit_rate() * 100.0
        );
        Ok(())
    }

    /// Prime every context the ledger needs, then the ledger itself in time order.
    pub fn prime_ledger(&self) -> Result<()> {
        self.ensure_ledger(self.horizon + 1)?;
        debug!("Ledger primed to month {}", self.horizon);
        Ok(())
    }

    /// Cached value of any cell already evaluated, mostly for inspection
    pub fn lookup(&self, cell: CellId, t: Month, ctx: Option<Context>) -> Option<Series> {
        let key = match ctx {
            Some(ctx) => CellRef::valued(cell, t, ctx),
            None => CellRef::ledger(cell, t),
        };
        self.cache.lookup(&key)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::policy::Sex;
    use chrono::NaiveDate;

    pub fn issue_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 1, 1).unwrap()
    }

    /// SA 100,000, annual premium 12,000, one-year term, one policy
    pub fn single_point() -> ModelPoint {
        ModelPoint::new(1, 40, Sex::Male, 1, 1, 12_000.0, 100_000.0, 1.0, issue_date())
    }

    pub fn model(points: Vec<ModelPoint>, assumptions: Assumptions, valuation_month: Month) -> Model {
        let settings = ModelSettings { valuation: ValuationPoint::Month(valuation_month), ..ModelSettings::default() };
        Model::new(points, Arc::new(assumptions), settings).unwrap()
    }
}
