//! Run command - scan, rewrite and optionally merge one package.

use std::path::PathBuf;

use bumpath::config::ConfigFile;
use bumpath::engine::BumReport;
use bumpath::{BumOptions, BumpathEngine};
use clap::Args;
use console::style;

use super::common::{parse_record_prefix, prepare_engine, SourceArgs};
use crate::error::CliError;

/// Arguments for the run command.
#[derive(Debug, Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Output directory (default from config)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Prefix for every record (default from config)
    #[arg(short, long)]
    pub prefix: Option<String>,

    /// Prefix for one record, as KEY_OR_NAME=PREFIX; repeatable
    #[arg(long = "record-prefix", value_parser = parse_record_prefix)]
    pub record_prefixes: Vec<(String, String)>,

    /// Skip references to files that do not exist
    #[arg(long)]
    pub ignore_missing: bool,

    /// Merge linked containers into their roots
    #[arg(long)]
    pub combine_linked: bool,
}

/// Resolve the output directory: CLI, then config.
pub fn resolve_output(cli: Option<PathBuf>, config: &ConfigFile) -> Result<PathBuf, CliError> {
    cli.or_else(|| config.paths.output_dir.clone()).ok_or_else(|| {
        CliError::Usage(
            "no output directory; use --output or set paths.output_dir in config.ini".to_string(),
        )
    })
}

/// Apply the global prefix, then per-record overrides.
pub fn apply_prefixes(
    engine: &mut BumpathEngine,
    prefix: Option<&str>,
    record_prefixes: &[(String, String)],
) -> Result<(), CliError> {
    if let Some(prefix) = prefix {
        engine.set_prefix_all(prefix)?;
    }

    for (record, prefix) in record_prefixes {
        let key = engine
            .find_record(record)
            .ok_or_else(|| CliError::Usage(format!("no scanned record matches '{}'", record)))?;
        engine.set_prefix(&[key], prefix)?;
    }
    Ok(())
}

/// Run the run command.
pub fn run(args: RunArgs, config: &ConfigFile) -> Result<(), CliError> {
    let output = resolve_output(args.output, config)?;
    let mut engine = prepare_engine(&args.source, config)?;

    let scan = engine.scan()?;
    println!(
        "Scanned {} records in {} containers ({} missing)",
        scan.records.len(),
        engine.scan_state().roots().len(),
        scan.missing_count()
    );

    apply_prefixes(&mut engine, args.prefix.as_deref(), &args.record_prefixes)?;

    let options = BumOptions::new(&output)
        .ignore_missing(args.ignore_missing || config.repath.ignore_missing)
        .combine_linked(args.combine_linked || config.repath.combine_linked);
    let report = engine.bum(&options)?;

    print_summary(&report, &output);
    Ok(())
}

/// Print the results of a rewrite.
pub fn print_summary(report: &BumReport, output: &std::path::Path) {
    println!();
    println!("{} {}", style("Output:").bold(), output.display());
    println!("  Copied:               {}", report.copied);
    println!("  Containers rewritten: {}", report.containers_rewritten);
    if report.skipped_missing > 0 {
        println!(
            "  Missing (skipped):    {}",
            style(report.skipped_missing).yellow()
        );
    }
    for merge in &report.merged {
        println!(
            "  Merged into {}: {} containers, {} records{}",
            merge.root,
            merge.absorbed,
            merge.records_added,
            if merge.skipped > 0 {
                format!(", {} unreadable", merge.skipped)
            } else {
                String::new()
            }
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_falls_back_to_config() {
        let mut config = ConfigFile::default();
        assert!(resolve_output(None, &config).is_err());

        config.paths.output_dir = Some(PathBuf::from("/cfg/out"));
        assert_eq!(
            resolve_output(None, &config).unwrap(),
            PathBuf::from("/cfg/out")
        );
        assert_eq!(
            resolve_output(Some(PathBuf::from("/cli")), &config).unwrap(),
            PathBuf::from("/cli")
        );
    }
}
