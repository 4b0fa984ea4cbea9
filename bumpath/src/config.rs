//! Persistent configuration.
//!
//! Settings live in an INI file at `~/.bumpath/config.ini`:
//!
//! ```ini
//! [repath]
//! prefix = bum
//! ignore_missing = false
//! combine_linked = false
//! asset_markers = assets/,data/
//! select = data/characters/*/skins/*.bin
//!
//! [paths]
//! hash_dir = ~/.bumpath/hashes
//! output_dir = ~/mods/out
//!
//! [logging]
//! directory = ~/.bumpath/logs
//! ```
//!
//! A missing file means defaults. Command-line arguments override values
//! read from the file.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use ini::Ini;
use thiserror::Error;

use crate::settings::{validate_prefix, EngineSettings, DEFAULT_ASSET_MARKERS, DEFAULT_PREFIX};

/// Directory holding the config file and logs, relative to the home directory.
pub const CONFIG_DIR_NAME: &str = ".bumpath";

/// Config file name.
pub const CONFIG_FILE_NAME: &str = "config.ini";

/// Default container selection glob.
pub const DEFAULT_SELECT: &str = "data/characters/*/skins/*.bin";

/// Errors reading or writing the config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to access config file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config file {}: {reason}", path.display())]
    Parse { path: PathBuf, reason: String },

    #[error("unknown configuration key '{0}'")]
    UnknownKey(String),

    #[error("invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
}

/// Path of the config directory (`~/.bumpath`).
pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR_NAME)
}

/// Path of the config file (`~/.bumpath/config.ini`).
pub fn config_file_path() -> PathBuf {
    config_dir().join(CONFIG_FILE_NAME)
}

/// Expand a leading `~/` to the home directory.
pub fn expand_tilde(value: &str) -> PathBuf {
    match value.strip_prefix("~/") {
        Some(rest) => match dirs::home_dir() {
            Some(home) => home.join(rest),
            None => PathBuf::from(value),
        },
        None => PathBuf::from(value),
    }
}

/// `[repath]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepathSection {
    pub prefix: String,
    pub ignore_missing: bool,
    pub combine_linked: bool,
    pub asset_markers: Vec<String>,
    pub select: Vec<String>,
}

impl Default for RepathSection {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
            ignore_missing: false,
            combine_linked: false,
            asset_markers: DEFAULT_ASSET_MARKERS.iter().map(|m| m.to_string()).collect(),
            select: vec![DEFAULT_SELECT.to_string()],
        }
    }
}

/// `[paths]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathsSection {
    /// Directory holding the hash tables.
    pub hash_dir: Option<PathBuf>,

    /// Default output directory.
    pub output_dir: Option<PathBuf>,
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingSection {
    pub directory: PathBuf,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            directory: config_dir().join("logs"),
        }
    }
}

/// Contents of the config file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigFile {
    pub repath: RepathSection,
    pub paths: PathsSection,
    pub logging: LoggingSection,
}

impl ConfigFile {
    /// Load from the default location. A missing file yields defaults.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&config_file_path())
    }

    /// Load from `path`. A missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let mut config = Self::default();
        for key in ConfigKey::all() {
            let value = ini
                .section(Some(key.section()))
                .and_then(|section| section.get(key.key_name()));
            if let Some(value) = value {
                key.set(&mut config, value)?;
            }
        }
        Ok(config)
    }

    /// Save to the default location, creating the directory if needed.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&config_file_path())
    }

    /// Save to `path`, creating the parent directory if needed.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let mut ini = Ini::new();
        for key in ConfigKey::all() {
            let value = key.get(self);
            if !value.is_empty() {
                ini.with_section(Some(key.section()))
                    .set(key.key_name(), value);
            }
        }

        ini.write_to_file(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Engine settings derived from the `[repath]` section.
    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings::default()
            .with_default_prefix(self.repath.prefix.clone())
            .with_asset_markers(self.repath.asset_markers.iter().cloned())
    }
}

/// A settable configuration key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    RepathPrefix,
    RepathIgnoreMissing,
    RepathCombineLinked,
    RepathAssetMarkers,
    RepathSelect,
    PathsHashDir,
    PathsOutputDir,
    LoggingDirectory,
}

impl ConfigKey {
    /// Every key, in file order.
    pub fn all() -> &'static [ConfigKey] {
        &[
            ConfigKey::RepathPrefix,
            ConfigKey::RepathIgnoreMissing,
            ConfigKey::RepathCombineLinked,
            ConfigKey::RepathAssetMarkers,
            ConfigKey::RepathSelect,
            ConfigKey::PathsHashDir,
            ConfigKey::PathsOutputDir,
            ConfigKey::LoggingDirectory,
        ]
    }

    pub fn section(&self) -> &'static str {
        match self {
            ConfigKey::RepathPrefix
            | ConfigKey::RepathIgnoreMissing
            | ConfigKey::RepathCombineLinked
            | ConfigKey::RepathAssetMarkers
            | ConfigKey::RepathSelect => "repath",
            ConfigKey::PathsHashDir | ConfigKey::PathsOutputDir => "paths",
            ConfigKey::LoggingDirectory => "logging",
        }
    }

    pub fn key_name(&self) -> &'static str {
        match self {
            ConfigKey::RepathPrefix => "prefix",
            ConfigKey::RepathIgnoreMissing => "ignore_missing",
            ConfigKey::RepathCombineLinked => "combine_linked",
            ConfigKey::RepathAssetMarkers => "asset_markers",
            ConfigKey::RepathSelect => "select",
            ConfigKey::PathsHashDir => "hash_dir",
            ConfigKey::PathsOutputDir => "output_dir",
            ConfigKey::LoggingDirectory => "directory",
        }
    }

    /// One-line help shown by `config list`.
    pub fn description(&self) -> &'static str {
        match self {
            ConfigKey::RepathPrefix => "prefix inserted after the asset marker",
            ConfigKey::RepathIgnoreMissing => "skip references to absent files",
            ConfigKey::RepathCombineLinked => "merge linked containers into their roots",
            ConfigKey::RepathAssetMarkers => "leading folders that mark asset paths",
            ConfigKey::RepathSelect => "globs selecting root containers",
            ConfigKey::PathsHashDir => "directory holding the hash-name tables",
            ConfigKey::PathsOutputDir => "default output directory",
            ConfigKey::LoggingDirectory => "directory for bumpath.log",
        }
    }

    /// Whether `config` holds the default value for this key.
    pub fn is_default(&self, config: &ConfigFile) -> bool {
        self.get(config) == self.get(&ConfigFile::default())
    }

    /// Full `section.key` name.
    pub fn name(&self) -> String {
        format!("{}.{}", self.section(), self.key_name())
    }

    /// Current value as a string; empty when unset.
    pub fn get(&self, config: &ConfigFile) -> String {
        match self {
            ConfigKey::RepathPrefix => config.repath.prefix.clone(),
            ConfigKey::RepathIgnoreMissing => config.repath.ignore_missing.to_string(),
            ConfigKey::RepathCombineLinked => config.repath.combine_linked.to_string(),
            ConfigKey::RepathAssetMarkers => config.repath.asset_markers.join(","),
            ConfigKey::RepathSelect => config.repath.select.join(","),
            ConfigKey::PathsHashDir => display_path(config.paths.hash_dir.as_deref()),
            ConfigKey::PathsOutputDir => display_path(config.paths.output_dir.as_deref()),
            ConfigKey::LoggingDirectory => display_path(Some(&config.logging.directory)),
        }
    }

    /// Validate and store `value`.
    pub fn set(&self, config: &mut ConfigFile, value: &str) -> Result<(), ConfigError> {
        let value = value.trim();
        match self {
            ConfigKey::RepathPrefix => {
                validate_prefix(value).map_err(|e| self.invalid(value, e.to_string()))?;
                config.repath.prefix = value.to_string();
            }
            ConfigKey::RepathIgnoreMissing => {
                config.repath.ignore_missing = self.parse_bool(value)?;
            }
            ConfigKey::RepathCombineLinked => {
                config.repath.combine_linked = self.parse_bool(value)?;
            }
            ConfigKey::RepathAssetMarkers => {
                let markers = split_list(value);
                if markers.is_empty() {
                    return Err(self.invalid(value, "at least one marker is required"));
                }
                config.repath.asset_markers = markers;
            }
            ConfigKey::RepathSelect => {
                let patterns = split_list(value);
                for pattern in &patterns {
                    glob::Pattern::new(pattern).map_err(|e| self.invalid(value, e.to_string()))?;
                }
                config.repath.select = patterns;
            }
            ConfigKey::PathsHashDir => config.paths.hash_dir = optional_path(value),
            ConfigKey::PathsOutputDir => config.paths.output_dir = optional_path(value),
            ConfigKey::LoggingDirectory => {
                if value.is_empty() {
                    return Err(self.invalid(value, "directory cannot be empty"));
                }
                config.logging.directory = expand_tilde(value);
            }
        }
        Ok(())
    }

    fn parse_bool(&self, value: &str) -> Result<bool, ConfigError> {
        match value.to_lowercase().as_str() {
            "true" | "yes" | "1" | "on" => Ok(true),
            "false" | "no" | "0" | "off" => Ok(false),
            _ => Err(self.invalid(value, "expected true or false")),
        }
    }

    fn invalid(&self, value: &str, reason: impl Into<String>) -> ConfigError {
        ConfigError::InvalidValue {
            key: self.name(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

impl FromStr for ConfigKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        ConfigKey::all()
            .iter()
            .copied()
            .find(|key| key.name() == wanted)
            .ok_or_else(|| ConfigError::UnknownKey(s.to_string()))
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn optional_path(value: &str) -> Option<PathBuf> {
    if value.is_empty() {
        None
    } else {
        Some(expand_tilde(value))
    }
}

fn display_path(path: Option<&Path>) -> String {
    path.map(|p| p.display().to_string()).unwrap_or_default()
}
