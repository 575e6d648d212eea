//! Configuration for the sieve with file-based overrides.
//!
//! Config priority: explicit path > working directory (primes.toml) > user (~/.config/primes/config.toml)

use crate::{Candidate, DEFAULT_MAX};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name looked up in the working directory
pub const LOCAL_CONFIG_FILE: &str = "primes.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("Failed to read {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("Failed to parse {path}: {source}")]
  Parse {
    path: PathBuf,
    #[source]
    source: toml::de::Error,
  },

  #[error("Failed to render config: {0}")]
  Serialize(#[from] toml::ser::Error),
}

// ============================================================================
// Sieve Configuration
// ============================================================================

/// Pipeline sizing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SieveConfig {
  /// Largest candidate fed into the pipeline (inclusive)
  /// Default: 280
  pub max: Candidate,

  /// Upper limit on filter stages; unset means one stage per prime found
  #[serde(skip_serializing_if = "Option::is_none")]
  pub max_stages: Option<usize>,
}

impl Default for SieveConfig {
  fn default() -> Self {
    Self {
      max: DEFAULT_MAX,
      max_stages: None,
    }
  }
}

impl SieveConfig {
  pub fn with_max(max: Candidate) -> Self {
    Self {
      max,
      ..Self::default()
    }
  }
}

// ============================================================================
// Log Configuration
// ============================================================================

fn default_log_level() -> String {
  "warn".to_string()
}

/// Diagnostic logging settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
  /// Log level: "off", "error", "warn", "info", "debug", "trace"
  /// Default: "warn"
  #[serde(default = "default_log_level")]
  pub level: String,

  /// Write logs to this file instead of stderr
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub file: Option<PathBuf>,
}

impl Default for LogConfig {
  fn default() -> Self {
    Self {
      level: default_log_level(),
      file: None,
    }
  }
}

// ============================================================================
// Main Configuration
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
  #[serde(default)]
  pub sieve: SieveConfig,

  #[serde(default)]
  pub log: LogConfig,
}

impl Config {
  /// Load config from an explicit path. Missing or malformed files are errors.
  pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
      path: path.to_path_buf(),
      source,
    })?;

    toml::from_str(&content).map_err(|source| ConfigError::Parse {
      path: path.to_path_buf(),
      source,
    })
  }

  /// Load config for a working directory, with fallback to user config
  pub fn load_for_dir(dir: &Path) -> Self {
    let local_config = Self::local_config_path(dir);
    if local_config.exists()
      && let Ok(config) = Self::load_from(&local_config)
    {
      return config;
    }

    if let Some(user_config_path) = Self::user_config_path()
      && user_config_path.exists()
      && let Ok(config) = Self::load_from(&user_config_path)
    {
      return config;
    }

    Self::default()
  }

  /// Get the user-level config path
  pub fn user_config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("XDG_CONFIG_HOME") {
      return Some(PathBuf::from(path).join("primes").join("config.toml"));
    }

    dirs::config_dir().map(|p: PathBuf| p.join("primes").join("config.toml"))
  }

  /// Get the working-directory config path
  pub fn local_config_path(dir: &Path) -> PathBuf {
    dir.join(LOCAL_CONFIG_FILE)
  }

  /// Render the effective config as TOML
  pub fn to_toml(&self) -> Result<String, ConfigError> {
    Ok(toml::to_string_pretty(self)?)
  }
}
