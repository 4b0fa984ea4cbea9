//! Init command - create the configuration file.

use bumpath::config::{config_file_path, ConfigFile};
use bumpath::hashtables::{ENTRIES_FILE, TYPES_FILE};
use dialoguer::Confirm;

use crate::error::CliError;

/// Run the init command.
pub fn run() -> Result<(), CliError> {
    let path = config_file_path();

    if path.exists() {
        let overwrite = Confirm::new()
            .with_prompt(format!(
                "{} already exists. Reset it to defaults?",
                path.display()
            ))
            .default(false)
            .interact()
            .unwrap_or(false);
        if !overwrite {
            println!("Keeping existing configuration.");
            return Ok(());
        }
    }

    let config = ConfigFile::default();
    config.save()?;

    println!("Configuration file: {}", path.display());
    println!("Log directory:      {}", config.logging.directory.display());
    println!();
    println!(
        "Set paths.hash_dir to a directory containing {} and {}",
        ENTRIES_FILE, TYPES_FILE
    );
    println!("to show record names instead of hashes:");
    println!("  bumpath config set paths.hash_dir <DIR>");
    println!();
    println!("CLI arguments override config file values when specified.");
    Ok(())
}
