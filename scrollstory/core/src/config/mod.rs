//! TOML Configuration File Support
//!
//! Story settings live in `~/.config/scrollstory/config.toml`.
//!
//! # Configuration Priority
//!
//! Values are resolved with the following priority (highest first):
//! 1. Environment variables
//! 2. TOML configuration file
//! 3. Default values
//!
//! # Example Configuration
//!
//! ```toml
//! [story]
//! id_prefix = "scrollstory"
//! keyboard = true
//!
//! [scroll]
//! duration_ms = 600
//! easing = "ease-in-out"
//! ```
//!
//! The trigger offset is not configurable; see [`crate::trigger::TRIGGER_OFFSET`].

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::naming::DefaultNaming;
use crate::surface::ScrollOptions;

/// Default element id prefix
pub const DEFAULT_ID_PREFIX: &str = "scrollstory";

/// Default programmatic scroll duration
pub const DEFAULT_SCROLL_DURATION_MS: u64 = 600;

/// Default programmatic scroll easing
pub const DEFAULT_EASING: &str = "ease-in-out";

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file at {path}: {source}")]
    ReadError {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("Failed to parse TOML config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

// =============================================================================
// Configuration Source Tracking
// =============================================================================

/// Tracks where the effective configuration came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Value from environment variable
    Env,
    /// Value from TOML configuration file
    File,
    /// Default value
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Env => write!(f, "environment"),
            Self::File => write!(f, "config file"),
            Self::Default => write!(f, "default"),
        }
    }
}

// =============================================================================
// TOML Configuration Structures
// =============================================================================

/// `[story]` section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoryToml {
    /// Prefix for generated element ids
    pub id_prefix: Option<String>,

    /// Whether keyboard navigation is enabled
    pub keyboard: Option<bool>,
}

/// `[scroll]` section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrollToml {
    /// Programmatic scroll duration in milliseconds
    pub duration_ms: Option<u64>,

    /// Easing name passed to the scroll driver
    pub easing: Option<String>,
}

/// Root TOML document
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrollstoryToml {
    /// Story settings
    pub story: StoryToml,

    /// Scroll settings
    pub scroll: ScrollToml,
}

// =============================================================================
// Effective Configuration
// =============================================================================

/// Resolved story settings
#[derive(Clone, Debug, PartialEq)]
pub struct StorySettings {
    /// Prefix for generated element ids
    pub id_prefix: String,

    /// Whether keyboard navigation is enabled
    pub keyboard: bool,

    /// Programmatic scroll duration in milliseconds
    pub scroll_duration_ms: u64,

    /// Easing name passed to the scroll driver
    pub easing: String,

    source: ConfigSource,
    config_file_path: Option<PathBuf>,
}

impl Default for StorySettings {
    fn default() -> Self {
        Self {
            id_prefix: DEFAULT_ID_PREFIX.to_string(),
            keyboard: true,
            scroll_duration_ms: DEFAULT_SCROLL_DURATION_MS,
            easing: DEFAULT_EASING.to_string(),
            source: ConfigSource::Default,
            config_file_path: None,
        }
    }
}

impl StorySettings {
    /// Where the settings came from
    #[must_use]
    pub fn source(&self) -> ConfigSource {
        self.source
    }

    /// The file the settings were read from, if any
    #[must_use]
    pub fn config_file_path(&self) -> Option<&PathBuf> {
        self.config_file_path.as_ref()
    }

    /// Copy of these settings with another element id prefix
    #[must_use]
    pub fn with_id_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.id_prefix = prefix.into();
        self
    }

    /// Copy of these settings with keyboard navigation on or off
    #[must_use]
    pub fn with_keyboard(mut self, enabled: bool) -> Self {
        self.keyboard = enabled;
        self
    }

    /// Base options for every programmatic scroll
    #[must_use]
    pub fn scroll_options(&self) -> ScrollOptions {
        ScrollOptions {
            duration_ms: Some(self.scroll_duration_ms),
            easing: Some(self.easing.clone()),
            ..ScrollOptions::default()
        }
    }

    /// Naming strategy built from the configured prefix
    #[must_use]
    pub fn naming(&self) -> DefaultNaming {
        DefaultNaming::new(self.id_prefix.clone())
    }

    /// Check values that parse but cannot be used
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] for an empty or malformed
    /// prefix or an empty easing name.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.id_prefix.is_empty() {
            return Err(ConfigError::ValidationError(
                "story.id_prefix must not be empty".to_string(),
            ));
        }
        if !self
            .id_prefix
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(ConfigError::ValidationError(format!(
                "story.id_prefix {:?} may only contain ASCII letters, digits, '-' and '_'",
                self.id_prefix
            )));
        }
        if self.easing.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "scroll.easing must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Configuration Loading
// =============================================================================

/// Get the default configuration file path
///
/// Returns `$XDG_CONFIG_HOME/scrollstory/config.toml`.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("scrollstory").join("config.toml"))
}

/// Load settings from the default path and the environment
///
/// # Errors
///
/// Returns an error if the config file exists but cannot be read, parsed
/// or validated. A missing config file is not an error.
pub fn load_config() -> Result<StorySettings, ConfigError> {
    load_config_from_path(default_config_path())
}

/// Load settings from a specific path and the environment
///
/// # Errors
///
/// Returns an error if the specified config file cannot be read, parsed or
/// validated.
pub fn load_config_from_path(path: Option<PathBuf>) -> Result<StorySettings, ConfigError> {
    load_with_env(path, |key| std::env::var(key).ok())
}

fn load_with_env(
    path: Option<PathBuf>,
    env: impl Fn(&str) -> Option<String>,
) -> Result<StorySettings, ConfigError> {
    let mut config = StorySettings::default();

    if let Some(ref config_path) = path {
        if config_path.exists() {
            let toml_content =
                std::fs::read_to_string(config_path).map_err(|e| ConfigError::ReadError {
                    path: config_path.clone(),
                    source: e,
                })?;

            let toml_config: ScrollstoryToml = toml::from_str(&toml_content)?;
            apply_toml_config(&mut config, &toml_config);
            config.config_file_path = Some(config_path.clone());
            config.source = ConfigSource::File;

            tracing::info!(
                path = %config_path.display(),
                "Loaded configuration from file"
            );
        } else {
            tracing::debug!(
                path = %config_path.display(),
                "Config file not found, using defaults"
            );
        }
    }

    apply_env_config(&mut config, env);
    config.validate()?;

    Ok(config)
}

fn apply_toml_config(config: &mut StorySettings, toml: &ScrollstoryToml) {
    if let Some(ref prefix) = toml.story.id_prefix {
        config.id_prefix = prefix.clone();
    }
    if let Some(keyboard) = toml.story.keyboard {
        config.keyboard = keyboard;
    }
    if let Some(duration) = toml.scroll.duration_ms {
        config.scroll_duration_ms = duration;
    }
    if let Some(ref easing) = toml.scroll.easing {
        config.easing = easing.clone();
    }
}

fn apply_env_config(config: &mut StorySettings, env: impl Fn(&str) -> Option<String>) {
    if let Some(prefix) = env("SCROLLSTORY_ID_PREFIX") {
        config.id_prefix = prefix;
        config.source = ConfigSource::Env;
    }
    if let Some(enabled) = env("SCROLLSTORY_KEYBOARD") {
        config.keyboard = enabled != "0" && enabled.to_lowercase() != "false";
        config.source = ConfigSource::Env;
    }
    if let Some(duration) = env("SCROLLSTORY_SCROLL_DURATION_MS") {
        match duration.parse::<u64>() {
            Ok(ms) => {
                config.scroll_duration_ms = ms;
                config.source = ConfigSource::Env;
            }
            Err(_) => {
                tracing::warn!(value = %duration, "Ignoring unparseable SCROLLSTORY_SCROLL_DURATION_MS");
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;

    use pretty_assertions::assert_eq;
    use tempfile::NamedTempFile;

    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_config() {
        let config = StorySettings::default();

        assert_eq!(config.id_prefix, "scrollstory");
        assert!(config.keyboard);
        assert_eq!(config.scroll_duration_ms, 600);
        assert_eq!(config.easing, "ease-in-out");
        assert_eq!(config.source(), ConfigSource::Default);
    }

    #[test]
    fn test_default_config_path() {
        if let Some(p) = default_config_path() {
            assert!(p.to_string_lossy().contains("scrollstory"));
            assert!(p.to_string_lossy().ends_with("config.toml"));
        }
    }

    #[test]
    fn test_parse_valid_toml() {
        let file = write_config(
            r#"
[story]
id_prefix = "essay"
keyboard = false

[scroll]
duration_ms = 250
easing = "linear"
"#,
        );

        let config = load_with_env(Some(file.path().to_path_buf()), no_env).unwrap();

        assert_eq!(config.id_prefix, "essay");
        assert!(!config.keyboard);
        assert_eq!(config.scroll_duration_ms, 250);
        assert_eq!(config.easing, "linear");
        assert_eq!(config.source(), ConfigSource::File);
        assert_eq!(config.config_file_path(), Some(&file.path().to_path_buf()));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let file = write_config("[scroll]\nduration_ms = 900\n");

        let config = load_with_env(Some(file.path().to_path_buf()), no_env).unwrap();

        assert_eq!(config.scroll_duration_ms, 900);
        assert_eq!(config.id_prefix, DEFAULT_ID_PREFIX);
        assert!(config.keyboard);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config =
            load_with_env(Some(dir.path().join("does-not-exist.toml")), no_env).unwrap();

        assert_eq!(config, StorySettings::default());
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        let file = write_config("[story\nid_prefix = ");

        let result = load_with_env(Some(file.path().to_path_buf()), no_env);
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_invalid_prefix_is_validation_error() {
        let file = write_config("[story]\nid_prefix = \"has space\"\n");

        let result = load_with_env(Some(file.path().to_path_buf()), no_env);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_env_overrides_file() {
        let file = write_config("[story]\nid_prefix = \"essay\"\n[scroll]\nduration_ms = 250\n");
        let env: HashMap<&str, &str> = [
            ("SCROLLSTORY_ID_PREFIX", "override"),
            ("SCROLLSTORY_KEYBOARD", "0"),
            ("SCROLLSTORY_SCROLL_DURATION_MS", "1200"),
        ]
        .into_iter()
        .collect();

        let config = load_with_env(Some(file.path().to_path_buf()), |k| {
            env.get(k).map(|v| (*v).to_string())
        })
        .unwrap();

        assert_eq!(config.id_prefix, "override");
        assert!(!config.keyboard);
        assert_eq!(config.scroll_duration_ms, 1200);
        assert_eq!(config.source(), ConfigSource::Env);
    }

    #[test]
    fn test_unparseable_env_duration_ignored() {
        let config = load_with_env(None, |k| {
            (k == "SCROLLSTORY_SCROLL_DURATION_MS").then(|| "soon".to_string())
        })
        .unwrap();

        assert_eq!(config.scroll_duration_ms, DEFAULT_SCROLL_DURATION_MS);
        assert_eq!(config.source(), ConfigSource::Default);
    }

    #[test]
    fn test_scroll_options_carry_duration_and_easing() {
        let options = StorySettings::default().scroll_options();

        assert_eq!(options.duration_ms, Some(600));
        assert_eq!(options.easing.as_deref(), Some("ease-in-out"));
        assert_eq!(options.align, None);
    }
}
