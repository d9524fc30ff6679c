use std::path::Path;
use std::time::Duration;

use ivory_domain::keyboard::{DEFAULT_BASE_OCTAVE, MAX_BASE_OCTAVE, MIN_BASE_OCTAVE};
use ivory_domain::AccidentalStyle;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(String),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Timings and defaults for a tutoring session. Durations are in milliseconds.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TutorConfig {
    pub history_capacity: usize,
    pub release_hold_ms: u64,
    pub fade_ms: u64,
    pub mistake_reset_ms: u64,
    pub hint_delay_ms: u64,
    pub skip_delay_ms: u64,
    pub override_grace_ms: u64,
    pub choice_advance_ms: u64,
    pub base_octave: i32,
    pub accidentals: AccidentalStyle,
    pub default_velocity: Option<f32>,
}

impl Default for TutorConfig {
    fn default() -> Self {
        Self {
            history_capacity: 10,
            release_hold_ms: 4_000,
            fade_ms: 500,
            mistake_reset_ms: 500,
            hint_delay_ms: 15_000,
            skip_delay_ms: 15_000,
            override_grace_ms: 30_000,
            choice_advance_ms: 1_500,
            base_octave: DEFAULT_BASE_OCTAVE,
            accidentals: AccidentalStyle::Sharp,
            default_velocity: None,
        }
    }
}

impl TutorConfig {
    /// Loads JSON or YAML depending on the file extension.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let is_yaml = matches!(
            path.extension().and_then(|ext| ext.to_str()),
            Some("yaml") | Some("yml")
        );
        let config: Self = if is_yaml {
            serde_yaml::from_str(&text).map_err(|err| ConfigError::Parse(err.to_string()))?
        } else {
            serde_json::from_str(&text).map_err(|err| ConfigError::Parse(err.to_string()))?
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.history_capacity == 0 {
            return Err(ConfigError::Invalid(
                "history capacity must be at least 1".into(),
            ));
        }
        if !(MIN_BASE_OCTAVE..=MAX_BASE_OCTAVE).contains(&self.base_octave) {
            return Err(ConfigError::Invalid(format!(
                "base octave must be between {MIN_BASE_OCTAVE} and {MAX_BASE_OCTAVE}"
            )));
        }
        Ok(())
    }

    pub fn release_hold(&self) -> Duration {
        Duration::from_millis(self.release_hold_ms)
    }

    pub fn fade(&self) -> Duration {
        Duration::from_millis(self.fade_ms)
    }

    pub fn mistake_reset(&self) -> Duration {
        Duration::from_millis(self.mistake_reset_ms)
    }

    pub fn hint_delay(&self) -> Duration {
        Duration::from_millis(self.hint_delay_ms)
    }

    pub fn skip_delay(&self) -> Duration {
        Duration::from_millis(self.skip_delay_ms)
    }

    pub fn override_grace(&self) -> Duration {
        Duration::from_millis(self.override_grace_ms)
    }

    pub fn choice_advance(&self) -> Duration {
        Duration::from_millis(self.choice_advance_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config: TutorConfig =
            serde_json::from_str(r#"{"hint_delay_ms": 5000, "accidentals": "flat"}"#).unwrap();
        assert_eq!(config.hint_delay(), Duration::from_secs(5));
        assert_eq!(config.accidentals, AccidentalStyle::Flat);
        assert_eq!(config.history_capacity, 10);
        assert_eq!(config.override_grace(), Duration::from_secs(30));
    }

    #[test]
    fn validation_rejects_bad_values() {
        let mut config = TutorConfig::default();
        assert!(config.validate().is_ok());
        config.history_capacity = 0;
        assert!(config.validate().is_err());
        config.history_capacity = 10;
        config.base_octave = 9;
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = TutorConfig::from_path("does-not-exist.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
