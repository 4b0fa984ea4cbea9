//! `bumpath config` - inspect and edit `~/.bumpath/config.ini`.

use std::fmt::Write as _;

use bumpath::config::{config_file_path, ConfigFile, ConfigKey};
use clap::Subcommand;
use console::style;

use crate::error::CliError;

#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Print one value, e.g. `repath.prefix`
    Get { key: String },

    /// Validate and store one value
    Set { key: String, value: String },

    /// Show every setting grouped by section
    List {
        /// Only show settings that differ from the defaults
        #[arg(long)]
        changed: bool,
    },

    /// Print the configuration file location
    Path,
}

pub fn run(command: ConfigCommands) -> Result<(), CliError> {
    match command {
        ConfigCommands::Get { key } => {
            let key = lookup(&key)?;
            let config = ConfigFile::load()?;
            println!("{}", shown_value(key, &config));
        }
        ConfigCommands::Set { key, value } => {
            let key = lookup(&key)?;
            let mut config = ConfigFile::load()?;
            key.set(&mut config, &value)?;
            config.save()?;
            println!("{} = {}", key.name(), shown_value(key, &config));
        }
        ConfigCommands::List { changed } => {
            let config = ConfigFile::load()?;
            print!("{}", render_sections(&config, changed));
        }
        ConfigCommands::Path => println!("{}", config_file_path().display()),
    }
    Ok(())
}

fn lookup(key: &str) -> Result<ConfigKey, CliError> {
    let valid: Vec<String> = ConfigKey::all().iter().map(ConfigKey::name).collect();
    key.parse().map_err(|_| {
        CliError::Config(format!(
            "unknown key '{}' (expected one of: {})",
            key,
            valid.join(", ")
        ))
    })
}

fn shown_value(key: ConfigKey, config: &ConfigFile) -> String {
    let value = key.get(config);
    if value.is_empty() {
        "(not set)".to_string()
    } else {
        value
    }
}

/// `[section]` blocks in file order, each key followed by its help text.
/// Keys holding a non-default value are starred.
fn render_sections(config: &ConfigFile, changed_only: bool) -> String {
    let mut out = String::new();
    let mut section = None;

    for &key in ConfigKey::all() {
        let is_default = key.is_default(config);
        if changed_only && is_default {
            continue;
        }
        if section != Some(key.section()) {
            if section.is_some() {
                out.push('\n');
            }
            let _ = writeln!(out, "{}", style(format!("[{}]", key.section())).bold());
            section = Some(key.section());
        }
        let marker = if is_default { ' ' } else { '*' };
        let _ = writeln!(
            out,
            "{} {:<15} = {:<24} {}",
            marker,
            key.key_name(),
            shown_value(key, config),
            style(format!("# {}", key.description())).dim()
        );
    }

    if section.is_none() {
        out.push_str("All settings are at their defaults.\n");
    }
    out
}
