use crate::config::ConfigError;
use reacter_alert::config::ThresholdConfig;
use reacter_alert::matcher::RuleMatcher;
use std::path::Path;

pub fn parse_thresholds(content: &str, path: &str) -> Result<ThresholdConfig, ConfigError> {
    let config: ThresholdConfig =
        serde_yaml::from_str(content).map_err(|source| ConfigError::Yaml {
            path: path.to_string(),
            source,
        })?;
    // Compile once up front so bad patterns fail at startup.
    RuleMatcher::new(&config.thresholds)?;
    Ok(config)
}

/// Reads and validates a YAML threshold file.
pub fn load_thresholds(path: &Path) -> Result<ThresholdConfig, ConfigError> {
    let path_str = path.display().to_string();
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path_str.clone(),
        source,
    })?;
    let config = parse_thresholds(&content, &path_str)?;
    tracing::info!(
        path = %path_str,
        hosts = config.thresholds.hosts.len(),
        rules = config.thresholds.rule_count(),
        "Loaded threshold file"
    );
    Ok(config)
}
