//! Config and dataset parsing
//!
//! TOML (preferred for config) and JSON (datasets, circuit profiles).

use contracts::ReplayError;
use serde::de::DeserializeOwned;

/// File format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML (recommended for config)
    Toml,
    /// JSON
    Json,
}

impl ConfigFormat {
    /// Infer format from a file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Parse TOML config
pub fn parse_toml<T: DeserializeOwned>(content: &str) -> Result<T, ReplayError> {
    toml::from_str(content).map_err(|e| ReplayError::ConfigParse {
        message: format!("TOML parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// Parse JSON config
pub fn parse_json<T: DeserializeOwned>(content: &str) -> Result<T, ReplayError> {
    serde_json::from_str(content).map_err(|e| ReplayError::ConfigParse {
        message: format!("JSON parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// Parse config according to format
pub fn parse<T: DeserializeOwned>(content: &str, format: ConfigFormat) -> Result<T, ReplayError> {
    match format {
        ConfigFormat::Toml => parse_toml(content),
        ConfigFormat::Json => parse_json(content),
    }
}

/// Parse a recorded dataset (always JSON)
pub fn parse_dataset<T: DeserializeOwned>(content: &str) -> Result<T, ReplayError> {
    serde_json::from_str(content).map_err(|e| ReplayError::DatasetParse {
        message: format!("line {}, column {}: {e}", e.line(), e.column()),
        source: Some(Box::new(e)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{JitterPolicy, RaceDataset, ReplayConfig};

    #[test]
    fn test_parse_toml_minimal() {
        let content = r#"
[circuit]
lap_length = 3337.0
s1_end = 934.0
s2_end = 2269.0

[repair]
jitter_policy = "preserve"
"#;
        let config: ReplayConfig = parse_toml(content).unwrap();
        let circuit = config.circuit.unwrap();
        assert_eq!(circuit.lap_length, 3337.0);
        assert_eq!(config.repair.jitter_policy, JitterPolicy::Preserve);
        // untouched tables fall back to defaults
        assert_eq!(config.repair.reset_threshold_ms, 10_000.0);
        assert_eq!(config.playback.speed, 1.0);
    }

    #[test]
    fn test_parse_json_minimal() {
        let content = r#"{ "playback": { "speed": 4.0, "loop_playback": true } }"#;
        let config: ReplayConfig = parse_json(content).unwrap();
        assert!(config.circuit.is_none());
        assert_eq!(config.playback.speed, 4.0);
        assert!(config.playback.loop_playback);
    }

    #[test]
    fn test_parse_toml_syntax_error() {
        let content = "invalid toml [[[";
        let result: Result<ReplayConfig, _> = parse_toml(content);
        assert!(matches!(result, Err(ReplayError::ConfigParse { .. })));
    }

    #[test]
    fn test_parse_dataset_error_is_dataset_error() {
        let result: Result<RaceDataset, _> = parse_dataset("{ \"drivers\": [ }");
        let err = result.unwrap_err();
        assert!(err.is_dataset_error());
        assert!(err.to_string().contains("line 1"));
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            ConfigFormat::from_extension("toml"),
            Some(ConfigFormat::Toml)
        );
        assert_eq!(
            ConfigFormat::from_extension("TOML"),
            Some(ConfigFormat::Toml)
        );
        assert_eq!(
            ConfigFormat::from_extension("json"),
            Some(ConfigFormat::Json)
        );
        assert_eq!(ConfigFormat::from_extension("yaml"), None);
    }
}
