//! Engine tuning loaded from JSON.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Timing knobs for remote round-trips.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// How often a blocked acknowledgement wait checks for cancellation.
    pub ack_poll_interval_ms: u64,
    /// How long the affected player gets to pick casualties before the
    /// automatic rule decides.
    pub casualty_selection_timeout_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            ack_poll_interval_ms: 50,
            casualty_selection_timeout_ms: 60_000,
        }
    }
}

impl EngineConfig {
    pub fn ack_poll_interval(&self) -> Duration {
        Duration::from_millis(self.ack_poll_interval_ms)
    }

    pub fn casualty_selection_timeout(&self) -> Duration {
        Duration::from_millis(self.casualty_selection_timeout_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ack_poll_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "ack_poll_interval_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Loads engine configuration from a JSON file at the given path.
pub fn load_config(path: &Path) -> Result<EngineConfig, ConfigError> {
    let data = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    load_config_from_str(&data)
}

/// Loads engine configuration from a JSON string.
pub fn load_config_from_str(json: &str) -> Result<EngineConfig, ConfigError> {
    let config: EngineConfig = serde_json::from_str(json)?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_gives_defaults() {
        let config = load_config_from_str("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.ack_poll_interval(), Duration::from_millis(50));
    }

    #[test]
    fn zero_poll_interval_is_rejected() {
        let err = load_config_from_str(r#"{"ack_poll_interval_ms":0}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn malformed_json_is_reported() {
        assert!(matches!(
            load_config_from_str("{not json"),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn missing_file_is_reported() {
        let err = load_config(Path::new("/nonexistent/barrage.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
