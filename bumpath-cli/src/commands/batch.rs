//! Batch command - repath several packages one after another.
//!
//! Each package directory is processed in its own session and written to
//! `<output>/<package name>`. Ctrl+C stops the batch after the package that
//! is currently running.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bumpath::batch::{run_batch, BatchJob, BatchOptions};
use bumpath::config::ConfigFile;
use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use super::common::{new_engine, package_name, resolve_select};
use super::run::resolve_output;
use crate::error::CliError;

/// Arguments for the batch command.
#[derive(Debug, Args)]
pub struct BatchArgs {
    /// Package directory; repeat for each package
    #[arg(long = "package", required = true)]
    pub packages: Vec<PathBuf>,

    /// Shared override directory searched after each package
    #[arg(long = "shared")]
    pub shared: Vec<PathBuf>,

    /// Output directory; each package gets a subdirectory (default from config)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Glob selecting containers to scan (default from config)
    #[arg(long)]
    pub select: Vec<String>,

    /// Prefix for every record (default from config)
    #[arg(short, long)]
    pub prefix: Option<String>,

    /// Skip references to files that do not exist
    #[arg(long)]
    pub ignore_missing: bool,

    /// Merge linked containers into their roots
    #[arg(long)]
    pub combine_linked: bool,

    /// Directory holding the hash tables
    #[arg(long)]
    pub hashes: Option<PathBuf>,
}

/// Build one job per package directory.
pub fn build_jobs(args: &BatchArgs, output: &std::path::Path, select: &[String]) -> Vec<BatchJob> {
    args.packages
        .iter()
        .map(|package| {
            let name = package_name(package);
            let mut sources = vec![package.clone()];
            sources.extend(args.shared.iter().cloned());
            BatchJob {
                output_root: output.join(&name),
                name,
                sources,
                select: select.to_vec(),
            }
        })
        .collect()
}

/// Run the batch command.
pub fn run(args: BatchArgs, config: &ConfigFile) -> Result<(), CliError> {
    let output = resolve_output(args.output.clone(), config)?;
    let select = resolve_select(&args.select, config);
    let jobs = build_jobs(&args, &output, &select);
    let mut engine = new_engine(config, args.hashes.as_ref())?;

    let options = BatchOptions {
        ignore_missing: args.ignore_missing || config.repath.ignore_missing,
        combine_linked: args.combine_linked || config.repath.combine_linked,
        prefix: args.prefix.clone(),
    };

    let cancel = Arc::new(AtomicBool::new(false));
    let cancel_handler = cancel.clone();
    ctrlc::set_handler(move || {
        cancel_handler.store(true, Ordering::SeqCst);
    })
    .map_err(|e| CliError::Config(format!("Failed to set signal handler: {}", e)))?;

    let progress = ProgressBar::new(jobs.len() as u64);
    progress.set_style(
        ProgressStyle::with_template("{spinner} [{bar:30}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    );

    let report = run_batch(&mut engine, &jobs, &options, &cancel, |done, item| {
        match &item.result {
            Ok(bum) => progress.println(format!(
                "{} {} ({} files)",
                style("ok").green(),
                item.name,
                bum.copied
            )),
            Err(e) => progress.println(format!("{} {}: {}", style("failed").red(), item.name, e)),
        }
        progress.set_message(item.name.clone());
        progress.set_position(done as u64);
    });
    progress.finish_and_clear();

    println!(
        "{} succeeded, {} failed, {} total",
        report.succeeded(),
        report.failed(),
        jobs.len()
    );

    if report.cancelled {
        return Err(CliError::Cancelled {
            completed: report.items.len(),
            total: jobs.len(),
        });
    }
    if report.failed() > 0 {
        return Err(CliError::BatchFailed {
            failed: report.failed(),
            total: jobs.len(),
        });
    }
    Ok(())
}
