//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub catalog: CatalogConfig,

    #[serde(default)]
    pub events: EventsConfig,

    #[serde(default)]
    pub export: ExportConfig,

    #[serde(default)]
    pub chart: ChartConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// File catalog configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Regex that a file name must match to enter the catalog
    #[serde(default = "default_file_pattern")]
    pub file_pattern: String,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./csv")
}

fn default_file_pattern() -> String {
    r"^Rec.*\.csv$".to_string()
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            file_pattern: default_file_pattern(),
        }
    }
}

/// Event snapshot configuration
#[derive(Debug, Clone, Deserialize)]
pub struct EventsConfig {
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: PathBuf,
}

fn default_snapshot_path() -> PathBuf {
    PathBuf::from("./marked/events.json")
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            snapshot_path: default_snapshot_path(),
        }
    }
}

/// Export configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ExportConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./marked")
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
        }
    }
}

/// Chart sampling configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ChartConfig {
    #[serde(default = "default_chart_dir")]
    pub chart_dir: PathBuf,

    /// Subdirectory the renderer drops per-file charts into
    #[serde(default = "default_chart_subdir")]
    pub chart_subdir: Option<String>,

    #[serde(default = "default_sample_points")]
    pub sample_points: usize,

    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

fn default_chart_dir() -> PathBuf {
    PathBuf::from("./charts")
}

fn default_chart_subdir() -> Option<String> {
    Some("综合指标".to_string())
}

fn default_sample_points() -> usize {
    5000
}

fn default_chunk_size() -> usize {
    20000
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            chart_dir: default_chart_dir(),
            chart_subdir: default_chart_subdir(),
            sample_points: default_sample_points(),
            chunk_size: default_chunk_size(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("wellmark").join("config.toml")),
            Some(PathBuf::from("/etc/wellmark/config.toml")),
            Some(PathBuf::from("./wellmark.toml")),
        ];

        for path_opt in config_paths.iter().flatten() {
            if path_opt.exists() {
                match Self::load_with_env(path_opt) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path_opt);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path_opt, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        if let Ok(data_dir) = std::env::var("WELLMARK_DATA_DIR") {
            self.catalog.data_dir = PathBuf::from(data_dir);
        }
        if let Ok(snapshot) = std::env::var("WELLMARK_EVENTS_FILE") {
            self.events.snapshot_path = PathBuf::from(snapshot);
        }
        if let Ok(output) = std::env::var("WELLMARK_EXPORT_DIR") {
            self.export.output_dir = PathBuf::from(output);
        }
        if let Ok(chart_dir) = std::env::var("WELLMARK_CHART_DIR") {
            self.chart.chart_dir = PathBuf::from(chart_dir);
        }
        if let Ok(level) = std::env::var("WELLMARK_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("WELLMARK_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            catalog: CatalogConfig::default(),
            events: EventsConfig::default(),
            export: ExportConfig::default(),
            chart: ChartConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Wellmark Configuration
#
# Environment variables override these settings:
# - WELLMARK_DATA_DIR
# - WELLMARK_EVENTS_FILE
# - WELLMARK_EXPORT_DIR
# - WELLMARK_CHART_DIR
# - WELLMARK_LOG_LEVEL
# - WELLMARK_LOG_FORMAT

[catalog]
# Directory containing the sensor log files
data_dir = "./csv"

# File names must match this pattern to enter the catalog; the names embed
# a fixed-width timestamp, so sorting them ascending is chronological order
file_pattern = "^Rec.*\\.csv$"

[events]
# Persisted event snapshot (JSON array)
snapshot_path = "./marked/events.json"

[export]
# Where annotated and filtered copies are written
output_dir = "./marked"

[chart]
# Directory the external renderer writes images into
chart_dir = "./charts"

# Subdirectory for the per-file overview charts
chart_subdir = "综合指标"

# Maximum rows emitted into one chart sample
sample_points = 5000

# Rows read per streaming pass
chunk_size = 20000

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.catalog.data_dir, PathBuf::from("./csv"));
        assert_eq!(config.chart.sample_points, 5000);
        assert_eq!(config.chart.chunk_size, 20000);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[catalog]\ndata_dir = \"/data/logs\"\n\n[chart]\nsample_points = 100"
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.catalog.data_dir, PathBuf::from("/data/logs"));
        assert_eq!(config.chart.sample_points, 100);
        // Untouched sections keep their defaults
        assert_eq!(config.chart.chunk_size, 20000);
        assert_eq!(config.export.output_dir, PathBuf::from("./marked"));
    }

    #[test]
    fn test_generated_default_parses() {
        let config: Config = toml::from_str(&generate_default_config()).unwrap();
        assert_eq!(config.chart.chart_subdir.as_deref(), Some("综合指标"));
    }

    #[test]
    fn test_env_overrides() {
        // No other test reads WELLMARK_* variables, so this is race-free
        std::env::set_var("WELLMARK_DATA_DIR", "/mnt/rig7/csv");
        std::env::set_var("WELLMARK_LOG_FORMAT", "json");

        let config = Config::from_env();
        assert_eq!(config.catalog.data_dir, PathBuf::from("/mnt/rig7/csv"));
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.chart.sample_points, 5000);

        std::env::remove_var("WELLMARK_DATA_DIR");
        std::env::remove_var("WELLMARK_LOG_FORMAT");
    }

    #[test]
    fn test_bad_file_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "not toml at all [").unwrap();
        let err = Config::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
