use crate::thresholds::load_thresholds;
use reacter_alert::config::ThresholdConfig;
use reacter_alert::AlertError;
use reacter_notify::actions::exec::ExecConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Errors that prevent the engine from starting.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config: missing required option 'threshold_file' (ThresholdFile)")]
    MissingThresholdFile,

    #[error("Config: stats_interval_secs must be greater than zero")]
    InvalidStatsInterval,

    #[error("Config: failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Config: invalid TOML in {path}: {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },

    #[error("Config: invalid threshold file {path}: {source}")]
    Yaml {
        path: String,
        source: serde_yaml::Error,
    },

    #[error("Config: {0}")]
    Rules(#[from] AlertError),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// YAML threshold file. Relative paths resolve against the directory of
    /// the configuration file.
    #[serde(default, alias = "ThresholdFile")]
    pub threshold_file: Option<String>,
    /// Periodically write per-rule stats back to the collector.
    #[serde(default = "default_report_stats", alias = "ReportStats")]
    pub report_stats: bool,
    #[serde(default = "default_stats_interval_secs")]
    pub stats_interval_secs: u64,
    /// Capacity of the outbound message channel.
    #[serde(default = "default_outbound_buffer")]
    pub outbound_buffer: usize,
    #[serde(default)]
    pub exec: ExecConfig,
}

fn default_report_stats() -> bool {
    true
}

fn default_stats_interval_secs() -> u64 {
    10
}

fn default_outbound_buffer() -> usize {
    1024
}

impl ServerConfig {
    pub fn from_toml_str(content: &str, path: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|source| ConfigError::Toml {
            path: path.to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_string(),
            source,
        })?;
        Self::from_toml_str(&content, path)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.threshold_file.as_deref() {
            Some(file) if !file.trim().is_empty() => {}
            _ => return Err(ConfigError::MissingThresholdFile),
        }
        if self.report_stats && self.stats_interval_secs == 0 {
            return Err(ConfigError::InvalidStatsInterval);
        }
        Ok(())
    }

    /// Threshold file path, resolved against `config_dir` when relative.
    pub fn threshold_path(&self, config_dir: Option<&Path>) -> Result<PathBuf, ConfigError> {
        let file = self
            .threshold_file
            .as_deref()
            .ok_or(ConfigError::MissingThresholdFile)?;
        let path = PathBuf::from(file);
        Ok(match config_dir {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path,
        })
    }
}

/// Loads the daemon configuration and the threshold file it points to.
pub fn load(config_path: &str) -> Result<(ServerConfig, ThresholdConfig), ConfigError> {
    let config = ServerConfig::load(config_path)?;
    let config_dir = Path::new(config_path).parent();
    let thresholds = load_thresholds(&config.threshold_path(config_dir)?)?;
    Ok((config, thresholds))
}
