//! Application settings loaded from config.toml
//!
//! The file carries the approver list, the default timezone for new campaigns,
//! where uploaded images are stored, and the campaign categories used to seed
//! the database on startup.

use crate::core::campaign::{ALLOWED_TIMEZONES, DEFAULT_TIMEZONE};
use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Config {
    /// Discord user IDs allowed to review campaigns
    #[serde(default)]
    pub approvers: Vec<String>,
    /// Timezone preselected for new campaigns
    #[serde(default = "default_timezone")]
    pub default_timezone: String,
    /// Directory uploaded images are written under
    #[serde(default = "default_media_root")]
    pub media_root: String,
    /// Categories to seed
    #[serde(default)]
    pub categories: Vec<CategoryConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            approvers: Vec::new(),
            default_timezone: default_timezone(),
            media_root: default_media_root(),
            categories: Vec::new(),
        }
    }
}

/// Configuration for a single campaign category
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct CategoryConfig {
    /// Category name, unique
    pub name: String,
    /// Optional description shown alongside the name
    pub description: Option<String>,
}

fn default_timezone() -> String {
    DEFAULT_TIMEZONE.to_string()
}

fn default_media_root() -> String {
    "data/media".to_string()
}

/// Parses configuration from TOML text and checks it.
pub fn parse_config(contents: &str) -> Result<Config> {
    let config: Config = toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })?;

    if !ALLOWED_TIMEZONES.contains(&config.default_timezone.as_str()) {
        return Err(Error::Config {
            message: format!(
                "default_timezone '{}' must be one of {}",
                config.default_timezone,
                ALLOWED_TIMEZONES.join(", ")
            ),
        });
    }
    if let Some(blank) = config.categories.iter().find(|c| c.name.trim().is_empty()) {
        return Err(Error::Config {
            message: format!("category with empty name (description: {:?})", blank.description),
        });
    }
    Ok(config)
}

/// Loads configuration from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - The default timezone is not supported
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;
    parse_config(&contents)
}

/// Loads configuration from the default location (./config.toml)
pub fn load_default_config() -> Result<Config> {
    load_config("config.toml")
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let toml_str = r#"
            approvers = ["100", "200"]
            default_timezone = "UTC"
            media_root = "/srv/media"

            [[categories]]
            name = "Water"
            description = "Clean water projects"

            [[categories]]
            name = "Education"
        "#;

        let config = parse_config(toml_str).unwrap();
        assert_eq!(config.approvers, vec!["100", "200"]);
        assert_eq!(config.default_timezone, "UTC");
        assert_eq!(config.media_root, "/srv/media");
        assert_eq!(config.categories.len(), 2);
        assert_eq!(config.categories[0].description.as_deref(), Some("Clean water projects"));
        assert!(config.categories[1].description.is_none());
    }

    #[test]
    fn test_parse_empty_config_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.default_timezone, "Asia/Kolkata");
    }

    #[test]
    fn test_rejects_unknown_timezone() {
        let result = parse_config(r#"default_timezone = "Mars/Olympus""#);
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[test]
    fn test_load_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "approvers = [\"1\"]\n").unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.approvers, vec!["1"]);

        let missing = load_config(dir.path().join("missing.toml"));
        assert!(matches!(missing, Err(Error::Config { .. })));
    }
}
