//! Arguments and helpers shared across commands.

use std::path::PathBuf;

use bumpath::codec::JsonCodec;
use bumpath::config::ConfigFile;
use bumpath::hashtables::HashTables;
use bumpath::BumpathEngine;
use clap::Args;
use tracing::warn;

use crate::error::CliError;

/// Where to read packages from and what to scan.
#[derive(Debug, Clone, Args)]
pub struct SourceArgs {
    /// Source directory; repeat for overrides, highest priority first
    #[arg(short, long = "source", required = true)]
    pub sources: Vec<PathBuf>,

    /// Glob selecting containers to scan (default from config)
    #[arg(long)]
    pub select: Vec<String>,

    /// Scan every container
    #[arg(long, conflicts_with = "select")]
    pub all: bool,

    /// Directory holding hashes.binentries.txt and hashes.bintypes.txt
    #[arg(long)]
    pub hashes: Option<PathBuf>,
}

/// Selection globs: CLI first, then config.
pub fn resolve_select(cli: &[String], config: &ConfigFile) -> Vec<String> {
    if cli.is_empty() {
        config.repath.select.clone()
    } else {
        cli.to_vec()
    }
}

/// Load hash tables from the CLI directory or the configured one.
///
/// No directory at all means empty tables.
pub fn load_hash_tables(
    cli: Option<&PathBuf>,
    config: &ConfigFile,
) -> Result<HashTables, CliError> {
    match cli.or(config.paths.hash_dir.as_ref()) {
        Some(dir) => HashTables::load_dir(dir).map_err(CliError::HashTables),
        None => Ok(HashTables::new()),
    }
}

/// Create an engine configured from `config`.
pub fn new_engine(config: &ConfigFile, hashes: Option<&PathBuf>) -> Result<BumpathEngine, CliError> {
    let tables = load_hash_tables(hashes, config)?;
    Ok(
        BumpathEngine::new(Box::new(JsonCodec::new()), config.engine_settings())
            .with_hash_tables(tables),
    )
}

/// Create an engine, index the sources and apply the selection.
pub fn prepare_engine(args: &SourceArgs, config: &ConfigFile) -> Result<BumpathEngine, CliError> {
    let mut engine = new_engine(config, args.hashes.as_ref())?;

    for source in &args.sources {
        if !source.is_dir() {
            return Err(CliError::Usage(format!(
                "source directory not found: {}",
                source.display()
            )));
        }
    }
    engine.add_directories(&args.sources)?;

    if args.all {
        engine.select_all();
    } else {
        let mut matched = 0;
        for pattern in resolve_select(&args.select, config) {
            matched += engine.select_matching(&pattern)?;
        }
        if matched == 0 {
            warn!("No containers matched the selection");
        }
    }

    Ok(engine)
}

/// Parse `KEY_OR_NAME=PREFIX`.
pub fn parse_record_prefix(s: &str) -> Result<(String, String), String> {
    match s.rsplit_once('=') {
        Some((record, prefix)) if !record.is_empty() && !prefix.is_empty() => {
            Ok((record.to_string(), prefix.to_string()))
        }
        _ => Err(format!("expected KEY_OR_NAME=PREFIX, got '{}'", s)),
    }
}

/// Package name used for batch output directories.
pub fn package_name(dir: &std::path::Path) -> String {
    dir.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "package".to_string())
}
