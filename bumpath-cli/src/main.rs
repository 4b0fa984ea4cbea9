//! Bumpath CLI - Command-line interface
//!
//! Drives the bumpath library: scan mod packages, repath their assets under a
//! prefix, and optionally merge linked containers into their roots.

mod commands;
mod error;

use std::process;

use bumpath::config::ConfigFile;
use bumpath::logging::{init_logging, LoggingConfig};
use clap::{Parser, Subcommand};
use console::style;

use commands::batch::BatchArgs;
use commands::config::ConfigCommands;
use commands::run::RunArgs;
use commands::scan::ScanArgs;
use error::CliError;

#[derive(Debug, Parser)]
#[command(name = "bumpath")]
#[command(version = bumpath::VERSION)]
#[command(about = "Repath mod assets so multiple packages can be installed together")]
struct Cli {
    /// Mirror log output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Scan containers and list their asset references
    Scan(ScanArgs),

    /// Scan, then copy and rewrite assets under a prefix
    Run(RunArgs),

    /// Repath several packages one after another
    Batch(BatchArgs),

    /// View or change configuration
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },

    /// Create the configuration file
    Init,
}

fn main() {
    let cli = Cli::parse();

    let config = match ConfigFile::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} {}", style("warning:").yellow().bold(), e);
            ConfigFile::default()
        }
    };

    let logging = LoggingConfig::new(&config.logging.directory).with_verbose(cli.verbose);
    let guard = match init_logging(&logging) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!(
                "{} logging disabled, cannot create {}: {}",
                style("warning:").yellow().bold(),
                logging.directory.display(),
                e
            );
            None
        }
    };

    tracing::info!(version = bumpath::VERSION, "bumpath started");

    if let Err(e) = run(cli.command, &config) {
        tracing::error!(error = %e, "Command failed");
        eprintln!("{} {}", style("error:").red().bold(), e);
        drop(guard);
        process::exit(1);
    }
}

fn run(command: Commands, config: &ConfigFile) -> Result<(), CliError> {
    match command {
        Commands::Scan(args) => commands::scan::run(args, config),
        Commands::Run(args) => commands::run::run(args, config),
        Commands::Batch(args) => commands::batch::run(args, config),
        Commands::Config { action } => commands::config::run(action),
        Commands::Init => commands::init::run(),
    }
}
