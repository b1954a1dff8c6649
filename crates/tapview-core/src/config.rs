//! Configuration system for tapview
//!
//! Provides:
//! - Config file discovery (CLI flag, env var, standard paths)
//! - TOML parsing with serde
//! - Environment variable overrides
//! - Validation

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn, Level};

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Complete tapview configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TapviewConfig {
    /// General settings
    pub general: GeneralSettings,

    /// Console rendering settings
    pub display: DisplaySettings,

    /// Export settings
    pub export: ExportSettings,
}

/// General settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Log level: trace, debug, info, warn, error
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
        }
    }
}

impl GeneralSettings {
    /// Tracing level for `log_level`, falling back to WARN
    pub fn level(&self) -> Level {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "error" => Level::ERROR,
            _ => Level::WARN,
        }
    }
}

/// Console rendering settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    /// Styled terminal output
    pub color: bool,

    /// Print the header mapping of each event
    pub show_headers: bool,

    /// Print the packet timestamp of each event
    pub show_timestamp: bool,

    /// Rule width in columns (0 = terminal width)
    pub width: u16,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            color: true,
            show_headers: true,
            show_timestamp: false,
            width: 0,
        }
    }
}

/// Export settings container
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    /// JSONL file output
    pub jsonl: JsonlExportConfig,
}

/// JSONL export configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JsonlExportConfig {
    /// Enable JSONL export
    pub enabled: bool,

    /// Output file path
    pub path: String,

    /// Append to existing file
    pub append: bool,

    /// Pretty print JSON
    pub pretty: bool,

    /// Flush the file after every event
    pub flush_each: bool,
}

impl Default for JsonlExportConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            path: "tapview-events.jsonl".to_string(),
            append: false,
            pretty: false,
            flush_each: false,
        }
    }
}

/// Configuration loader
pub struct ConfigLoader {
    /// Path to config file (if specified via CLI)
    cli_path: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a new config loader
    pub fn new() -> Self {
        Self { cli_path: None }
    }

    /// Set the config path from CLI argument
    pub fn with_cli_path(mut self, path: Option<PathBuf>) -> Self {
        self.cli_path = path;
        self
    }

    /// Load configuration with the following precedence:
    /// 1. CLI --config flag
    /// 2. TAPVIEW_CONFIG environment variable
    /// 3. ~/.config/tapview/config.toml
    /// 4. /etc/tapview/config.toml
    /// 5. Default values
    pub fn load(&self) -> ConfigResult<TapviewConfig> {
        let config_path = self.find_config_file();

        let mut config = if let Some(path) = config_path {
            info!("Loading configuration from: {}", path.display());
            self.load_from_file(&path)?
        } else {
            debug!("No config file found, using defaults");
            TapviewConfig::default()
        };

        self.apply_env_overrides(&mut config);
        self.validate(&config)?;

        Ok(config)
    }

    /// Find the config file to use
    fn find_config_file(&self) -> Option<PathBuf> {
        if let Some(path) = &self.cli_path {
            if path.exists() {
                return Some(path.clone());
            }
            warn!("CLI config path does not exist: {}", path.display());
        }

        if let Ok(env_path) = std::env::var("TAPVIEW_CONFIG") {
            let path = PathBuf::from(&env_path);
            if path.exists() {
                return Some(path);
            }
            warn!("TAPVIEW_CONFIG path does not exist: {}", env_path);
        }

        if let Some(path) = Self::default_config_path() {
            if path.exists() {
                return Some(path);
            }
        }

        #[cfg(unix)]
        {
            let path = PathBuf::from("/etc/tapview/config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        None
    }

    /// Load configuration from a TOML file
    fn load_from_file(&self, path: &Path) -> ConfigResult<TapviewConfig> {
        let content = std::fs::read_to_string(path)?;
        let config: TapviewConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&self, config: &mut TapviewConfig) {
        if let Ok(val) = std::env::var("TAPVIEW_LOG_LEVEL") {
            config.general.log_level = val;
        }
        if let Ok(val) = std::env::var("TAPVIEW_COLOR") {
            config.display.color = val.parse().unwrap_or(config.display.color);
        }
        if let Ok(val) = std::env::var("TAPVIEW_JSONL_PATH") {
            config.export.jsonl.path = val;
            config.export.jsonl.enabled = true;
        }
    }

    /// Validate configuration
    fn validate(&self, config: &TapviewConfig) -> ConfigResult<()> {
        if !VALID_LOG_LEVELS.contains(&config.general.log_level.to_lowercase().as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "Invalid log level: {}. Must be one of: {:?}",
                config.general.log_level, VALID_LOG_LEVELS
            )));
        }

        if config.export.jsonl.enabled && config.export.jsonl.path.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "JSONL export is enabled but no path is set".to_string(),
            ));
        }

        Ok(())
    }

    /// Get the default config file path for the current platform
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("tapview").join("config.toml"))
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Helper module for platform-specific directories
mod dirs {
    use std::path::PathBuf;

    /// Get the user's config directory
    pub fn config_dir() -> Option<PathBuf> {
        #[cfg(target_os = "windows")]
        {
            std::env::var("APPDATA").ok().map(PathBuf::from)
        }

        #[cfg(not(target_os = "windows"))]
        {
            std::env::var("XDG_CONFIG_HOME")
                .ok()
                .map(PathBuf::from)
                .or_else(|| {
                    std::env::var("HOME")
                        .ok()
                        .map(|h| PathBuf::from(h).join(".config"))
                })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = TapviewConfig::default();
        assert_eq!(config.general.log_level, "warn");
        assert_eq!(config.general.level(), Level::WARN);
        assert!(config.display.color);
        assert!(config.display.show_headers);
        assert!(!config.display.show_timestamp);
        assert!(!config.export.jsonl.enabled);
    }

    #[test]
    fn test_parse_minimal_toml() {
        let toml_str = r#"
            [general]
            log_level = "debug"
        "#;
        let config: TapviewConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.level(), Level::DEBUG);
        // Other fields should be default
        assert!(config.display.color);
    }

    #[test]
    fn test_parse_full_toml() {
        let toml_str = r#"
            [general]
            log_level = "trace"

            [display]
            color = false
            show_headers = false
            show_timestamp = true
            width = 120

            [export.jsonl]
            enabled = true
            path = "/tmp/events.jsonl"
            append = true
            pretty = true
            flush_each = true
        "#;

        let config: TapviewConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.log_level, "trace");
        assert!(!config.display.color);
        assert!(!config.display.show_headers);
        assert!(config.display.show_timestamp);
        assert_eq!(config.display.width, 120);
        assert!(config.export.jsonl.enabled);
        assert_eq!(config.export.jsonl.path, "/tmp/events.jsonl");
        assert!(config.export.jsonl.append);
        assert!(config.export.jsonl.pretty);
        assert!(config.export.jsonl.flush_each);
    }

    #[test]
    fn test_load_from_cli_path() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[display]\nwidth = 100").unwrap();

        let config = ConfigLoader::new()
            .with_cli_path(Some(file.path().to_path_buf()))
            .load()
            .unwrap();
        assert_eq!(config.display.width, 100);
    }

    #[test]
    fn test_load_rejects_bad_toml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[display\nwidth = ").unwrap();

        let result = ConfigLoader::new()
            .with_cli_path(Some(file.path().to_path_buf()))
            .load();
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_validation_invalid_log_level() {
        let config = TapviewConfig {
            general: GeneralSettings {
                log_level: "loud".to_string(),
            },
            ..Default::default()
        };
        let loader = ConfigLoader::new();
        assert!(loader.validate(&config).is_err());
    }

    #[test]
    fn test_validation_jsonl_without_path() {
        let mut config = TapviewConfig::default();
        config.export.jsonl.enabled = true;
        config.export.jsonl.path = "  ".to_string();
        let loader = ConfigLoader::new();
        assert!(loader.validate(&config).is_err());
    }

    #[test]
    fn test_serialize_config() {
        let config = TapviewConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("log_level"));
    }
}
