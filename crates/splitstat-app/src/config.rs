// Configuration loading and parsing (splitstat.toml).

use serde::Deserialize;
use splitstat_core::{SubjectOrder, MIN_PLATE_APPEARANCES};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Config file location relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config/splitstat.toml";

/// Environment variable overriding [`DEFAULT_CONFIG_PATH`].
pub const CONFIG_ENV_VAR: &str = "SPLITSTAT_CONFIG";

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },
}

// ---------------------------------------------------------------------------
// Config structs
// ---------------------------------------------------------------------------

/// Every section and key is optional; anything left out takes its default.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub paths: DataPaths,
    pub stats: StatsConfig,
    pub output: OutputConfig,
    pub run: RunConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DataPaths {
    /// Raw per-event CSV.
    pub events: String,
    /// Combinations manifest (`Stat,Subject,Split`).
    pub combinations: String,
    /// Where the result CSV is written.
    pub output: String,
}

impl Default for DataPaths {
    fn default() -> Self {
        DataPaths {
            events: "data/raw/pitchdata.csv".into(),
            combinations: "data/reference/combinations.txt".into(),
            output: "data/processed/output.csv".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct StatsConfig {
    /// Minimum summed plate appearances for a subject to be reported.
    pub min_pa: u32,
}

impl Default for StatsConfig {
    fn default() -> Self {
        StatsConfig {
            min_pa: MIN_PLATE_APPEARANCES,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub subject_order: SubjectOrder,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Evaluate requests concurrently on blocking tasks.
    pub parallel: bool,
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate the config at `path`. A missing file is not an error:
/// the defaults are used instead.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        info!("No config file at {}, using defaults", path.display());
        let config = Config::default();
        validate(&config)?;
        return Ok(config);
    }

    let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let config = parse_config(&text).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })?;

    validate(&config)?;
    Ok(config)
}

/// Resolve the config path from `SPLITSTAT_CONFIG`, falling back to
/// `config/splitstat.toml` under the working directory, and load it.
pub fn load_config() -> Result<Config, ConfigError> {
    let path = std::env::var_os(CONFIG_ENV_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    load_config_from(&path)
}

fn parse_config(text: &str) -> Result<Config, toml::de::Error> {
    toml::from_str(text)
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.stats.min_pa == 0 {
        return Err(ConfigError::ValidationError {
            field: "stats.min_pa".into(),
            message: "must be greater than 0".into(),
        });
    }

    let path_fields: &[(&str, &str)] = &[
        ("paths.events", config.paths.events.as_str()),
        ("paths.combinations", config.paths.combinations.as_str()),
        ("paths.output", config.paths.output.as_str()),
    ];
    for (name, val) in path_fields {
        if val.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                field: name.to_string(),
                message: "must not be empty".into(),
            });
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
