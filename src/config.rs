//! YAML configuration file support.
//!
//! One file configures both the decoding engine and the CLI's logging.
//! Every section is optional; omitted keys take their defaults.
//!
//! ## Example YAML Configuration
//!
//! ```yaml
//! version: "1.0"
//! name: "uploads"
//!
//! decoder:
//!   version: 1
//!   max_payload_bytes: 33554432
//!   sniff_window_bytes: 512
//!   max_name_len: 128
//!   hash_prefix_len: 16
//!
//! logging:
//!   level: "info"
//!   format: "json"
//! ```

use std::fs;
use std::path::Path;

use decoder::{DataDecoder, DecoderConfig};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "off"];

/// Errors that can occur when loading YAML configuration files
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("unsupported config version: {0}")]
    UnsupportedVersion(String),
}

/// Top-level YAML configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DataUriConfig {
    /// Configuration format version
    pub version: String,

    /// Optional configuration name/description
    #[serde(default)]
    pub name: Option<String>,

    /// Engine limits and naming
    #[serde(default)]
    pub decoder: DecoderConfig,

    /// CLI log output
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl DataUriConfig {
    /// Load a YAML configuration file from the given path
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse YAML configuration from a string
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigLoadError> {
        let config: DataUriConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    fn validate(&self) -> Result<(), ConfigLoadError> {
        match self.version.as_str() {
            "1.0" | "1" => Ok(()),
            v => Err(ConfigLoadError::UnsupportedVersion(v.to_string())),
        }?;

        self.decoder
            .validate()
            .map_err(|err| ConfigLoadError::Validation(format!("decoder: {err}")))?;
        self.logging.validate()?;

        Ok(())
    }

    /// Engine built from the `decoder` section.
    pub fn build_decoder(&self) -> Result<DataDecoder, ConfigLoadError> {
        DataDecoder::new(self.decoder.clone())
            .map_err(|err| ConfigLoadError::Validation(format!("decoder: {err}")))
    }
}

impl Default for DataUriConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            name: None,
            decoder: DecoderConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Log output format for the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Logging YAML configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive; `DATAURI_LOG` overrides it at runtime.
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), ConfigLoadError> {
        let level = self.level.to_ascii_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(ConfigLoadError::Validation(format!(
                "logging.level must be one of {}, got {:?}",
                LOG_LEVELS.join(", "),
                self.level
            )));
        }
        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::Text,
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_valid_yaml() {
        let yaml = r#"
version: "1.0"
name: "test-config"
decoder:
  max_payload_bytes: 1024
logging:
  level: "debug"
  format: "json"
"#;

        let config = DataUriConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.version, "1.0");
        assert_eq!(config.name.as_deref(), Some("test-config"));
        assert_eq!(config.decoder.max_payload_bytes, 1024);
        assert_eq!(config.decoder.sniff_window_bytes, 512);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_load_from_file() {
        let yaml = r#"
version: "1"
decoder:
  hash_prefix_len: 32
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(yaml.as_bytes()).unwrap();

        let config = DataUriConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.decoder.hash_prefix_len, 32);
        assert_eq!(config.logging, LoggingConfig::default());
    }

    #[test]
    fn test_missing_file() {
        let result = DataUriConfig::from_file("/nonexistent/datauri.yaml");
        assert!(matches!(result, Err(ConfigLoadError::FileRead(_))));
    }

    #[test]
    fn test_default_config() {
        let config = DataUriConfig::default();
        assert_eq!(config.version, "1.0");
        assert!(config.name.is_none());
        assert!(config.build_decoder().is_ok());
    }

    #[test]
    fn test_unsupported_version() {
        let result = DataUriConfig::from_yaml("version: \"2.0\"\n");
        assert!(matches!(
            result,
            Err(ConfigLoadError::UnsupportedVersion(v)) if v == "2.0"
        ));
    }

    #[test]
    fn test_decoder_validation() {
        let yaml = r#"
version: "1.0"
decoder:
  sniff_window_bytes: 2
"#;

        let result = DataUriConfig::from_yaml(yaml);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("sniff_window_bytes"));
    }

    #[test]
    fn test_logging_validation() {
        let yaml = r#"
version: "1.0"
logging:
  level: "loud"
"#;

        let result = DataUriConfig::from_yaml(yaml);
        assert!(result.unwrap_err().to_string().contains("logging.level"));
    }

    #[test]
    fn test_malformed_yaml() {
        let result = DataUriConfig::from_yaml("version: [unclosed");
        assert!(matches!(result, Err(ConfigLoadError::YamlParse(_))));
    }
}
