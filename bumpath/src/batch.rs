//! Sequential multi-package runs.
//!
//! Each package gets a fresh session on the same engine: reset, index,
//! select, scan, rewrite. Packages run one after another, never
//! concurrently. The cancellation flag is only checked between packages; a
//! package that has started always runs to completion or to its first error.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{info, warn};

use crate::engine::{BumOptions, BumReport, BumpathEngine};
use crate::error::{BumError, BumResult};

/// One package to repath.
#[derive(Debug, Clone)]
pub struct BatchJob {
    /// Display name, usually the package directory name.
    pub name: String,

    /// Source directories, highest priority first.
    pub sources: Vec<PathBuf>,

    /// Selection globs. Empty selects every container.
    pub select: Vec<String>,

    pub output_root: PathBuf,
}

/// Options shared by every job in a batch.
#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    pub ignore_missing: bool,
    pub combine_linked: bool,

    /// Prefix for every record; the engine default when `None`.
    pub prefix: Option<String>,
}

/// Result of one job.
#[derive(Debug)]
pub struct BatchItemOutcome {
    pub name: String,
    pub result: BumResult<BumReport>,
}

impl BatchItemOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Results of a whole batch.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// One entry per job that ran, in job order.
    pub items: Vec<BatchItemOutcome>,

    /// Whether the batch stopped early because of cancellation.
    pub cancelled: bool,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.items.iter().filter(|i| i.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.items.len() - self.succeeded()
    }
}

/// Run `jobs` one after another.
///
/// `on_progress` is called after each job with the number of jobs finished
/// and the job's outcome. A failing job does not stop the batch.
pub fn run_batch<F>(
    engine: &mut BumpathEngine,
    jobs: &[BatchJob],
    options: &BatchOptions,
    cancel: &AtomicBool,
    mut on_progress: F,
) -> BatchReport
where
    F: FnMut(usize, &BatchItemOutcome),
{
    let mut report = BatchReport::default();

    for (index, job) in jobs.iter().enumerate() {
        if cancel.load(Ordering::SeqCst) {
            warn!(remaining = jobs.len() - index, "Batch cancelled");
            report.cancelled = true;
            break;
        }

        let result = run_job(engine, job, options);
        match &result {
            Ok(bum) => info!(package = %job.name, copied = bum.copied, "Package done"),
            Err(e) => warn!(package = %job.name, kind = e.kind(), error = %e, "Package failed"),
        }

        let outcome = BatchItemOutcome {
            name: job.name.clone(),
            result,
        };
        on_progress(index + 1, &outcome);
        report.items.push(outcome);
    }

    engine.reset();
    report
}

fn run_job(
    engine: &mut BumpathEngine,
    job: &BatchJob,
    options: &BatchOptions,
) -> Result<BumReport, BumError> {
    engine.reset();
    engine.add_directories(&job.sources)?;

    if job.select.is_empty() {
        engine.select_all();
    } else {
        for pattern in &job.select {
            engine.select_matching(pattern)?;
        }
    }

    engine.scan()?;
    if let Some(prefix) = &options.prefix {
        engine.set_prefix_all(prefix)?;
    }

    engine.bum(
        &BumOptions::new(&job.output_root)
            .ignore_missing(options.ignore_missing)
            .combine_linked(options.combine_linked),
    )
}
