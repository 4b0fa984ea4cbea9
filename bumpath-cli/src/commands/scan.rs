//! Scan command - list records and their asset references.

use bumpath::config::ConfigFile;
use bumpath::engine::{ReferenceReport, ScanReport};
use clap::Args;
use console::style;

use super::common::{prepare_engine, SourceArgs};
use crate::error::CliError;

/// Arguments for the scan command.
#[derive(Debug, Args)]
pub struct ScanArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,

    /// Only list missing references
    #[arg(long)]
    pub missing_only: bool,
}

/// Run the scan command.
pub fn run(args: ScanArgs, config: &ConfigFile) -> Result<(), CliError> {
    let mut engine = prepare_engine(&args.source, config)?;
    let report = engine.scan()?;

    if args.json {
        let json = serde_json::to_string_pretty(&report)
            .map_err(|e| CliError::Output(e.to_string()))?;
        println!("{}", json);
        return Ok(());
    }

    print_report(&report, args.missing_only);

    let roots = engine.scan_state().roots().to_vec();
    if !roots.is_empty() {
        println!();
        println!("{}", style("Linked closures").bold());
        for root in &roots {
            let closure = engine.closure_of(root);
            let name = engine
                .scan_state()
                .all_containers()
                .get(root)
                .map(|r| r.raw.as_str())
                .unwrap_or(root.as_str());
            println!("  {} ({} linked)", name, closure.len());
            for linked in closure {
                println!("    {}", linked);
            }
        }
    }

    Ok(())
}

fn print_report(report: &ScanReport, missing_only: bool) {
    println!(
        "{} records, {} containers, {} missing",
        report.records.len(),
        report.containers.len(),
        report.missing_count()
    );

    for record in &report.records {
        let references: Vec<&ReferenceReport> = record
            .references
            .iter()
            .filter(|r| !missing_only || !r.exists)
            .collect();
        if missing_only && references.is_empty() {
            continue;
        }

        println!();
        println!(
            "{} {} [{}] prefix={}",
            style(&record.key).dim(),
            style(record.name.as_deref().unwrap_or(&record.key)).bold(),
            record.type_name.as_deref().unwrap_or("?"),
            style(&record.prefix).cyan()
        );
        for reference in references {
            print_reference(reference);
        }
    }

    println!();
    println!("{}", style("Containers").bold());
    for container in report
        .containers
        .iter()
        .filter(|r| !missing_only || !r.exists)
    {
        print_reference(container);
    }
}

fn print_reference(reference: &ReferenceReport) {
    let status = if reference.exists {
        style("ok").green()
    } else {
        style("missing").red()
    };
    println!(
        "  [{}] {} ({})",
        status,
        reference.raw,
        style(&reference.unified).dim()
    );
}
