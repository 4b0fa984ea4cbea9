//! Engine settings shared by the scanner and the rewriter.

use crate::error::{BumError, BumResult};
use crate::overlay::CONTAINER_EXTENSION;

/// Prefix assigned to every record until reassigned.
pub const DEFAULT_PREFIX: &str = "bum";

/// Substrings marking a string value as an asset reference.
pub const DEFAULT_ASSET_MARKERS: &[&str] = &["assets/", "data/"];

/// Tunables for one engine session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    /// Prefix given to newly scanned records.
    pub default_prefix: String,

    /// Lower-case asset-root markers; a string containing any of them is
    /// treated as an asset reference.
    pub asset_markers: Vec<String>,

    /// Container file extension, including the dot.
    pub container_extension: String,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            default_prefix: DEFAULT_PREFIX.to_string(),
            asset_markers: DEFAULT_ASSET_MARKERS.iter().map(|m| m.to_string()).collect(),
            container_extension: CONTAINER_EXTENSION.to_string(),
        }
    }
}

impl EngineSettings {
    /// Set the default prefix.
    pub fn with_default_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.default_prefix = prefix.into();
        self
    }

    /// Replace the asset-root markers.
    pub fn with_asset_markers<I, S>(mut self, markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.asset_markers = markers
            .into_iter()
            .map(|m| m.into().to_lowercase())
            .filter(|m| !m.is_empty())
            .collect();
        self
    }

    /// Check if a string value looks like an asset reference.
    pub fn is_asset_reference(&self, value: &str) -> bool {
        let lowered = value.to_lowercase().replace('\\', "/");
        self.asset_markers
            .iter()
            .any(|marker| lowered.contains(marker.as_str()))
    }
}

/// Check that a prefix can be inserted as a single path segment.
pub fn validate_prefix(prefix: &str) -> BumResult<()> {
    let valid = !prefix.is_empty()
        && prefix != "."
        && prefix != ".."
        && !prefix.contains(['/', '\\'])
        && !prefix.chars().any(char::is_whitespace);
    if valid {
        Ok(())
    } else {
        Err(BumError::InvalidPrefix(prefix.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_markers_are_case_insensitive() {
        let settings = EngineSettings::default();
        assert!(settings.is_asset_reference("ASSETS/Characters/Ahri/ahri.dds"));
        assert!(settings.is_asset_reference("Data\\Characters\\Ahri\\Ahri.bin"));
        assert!(!settings.is_asset_reference("Play_sfx_Ahri_Attack"));
    }

    #[test]
    fn test_custom_markers() {
        let settings = EngineSettings::default().with_asset_markers(["Sounds/", ""]);
        assert_eq!(settings.asset_markers, vec!["sounds/".to_string()]);
        assert!(settings.is_asset_reference("sounds/foo.bnk"));
        assert!(!settings.is_asset_reference("assets/foo.dds"));
    }

    #[test]
    fn test_validate_prefix() {
        assert!(validate_prefix("bum").is_ok());
        assert!(validate_prefix("bum7").is_ok());
        assert!(validate_prefix("").is_err());
        assert!(validate_prefix("a/b").is_err());
        assert!(validate_prefix("a\\b").is_err());
        assert!(validate_prefix("..").is_err());
        assert!(validate_prefix("a b").is_err());
    }
}
