//! Configuration types for the decoder.
//!
//! [`DecoderConfig`] bounds how much a single call may decode and shapes how
//! names are derived. It is cheap to clone and serializable, so it can be
//! embedded in larger configuration files (see the `datauri` crate's YAML
//! loader).
//!
//! # Quick Start
//!
//! ```rust
//! use decoder::DecoderConfig;
//!
//! let config = DecoderConfig::default();
//! config.validate().expect("default config is valid");
//! assert_eq!(config.sniff_window_bytes, 512);
//! ```
//!
//! # Tightened Limits
//!
//! ```rust
//! use decoder::DecoderConfig;
//!
//! let config = DecoderConfig {
//!     max_payload_bytes: 1024 * 1024, // 1 MiB
//!     max_name_len: 64,
//!     ..Default::default()
//! };
//! assert!(config.validate().is_ok());
//! ```
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default ceiling on decoded bytes per call (32 MiB).
pub const DEFAULT_MAX_PAYLOAD_BYTES: usize = 32 * 1024 * 1024;

/// Smallest sniff window that still covers the common magic numbers.
pub const MIN_SNIFF_WINDOW_BYTES: usize = 8;

/// Runtime configuration for [`DataDecoder`](crate::DataDecoder).
///
/// # Serialization
///
/// ```json
/// {
///   "version": 1,
///   "max_payload_bytes": 33554432,
///   "sniff_window_bytes": 512,
///   "max_name_len": 128,
///   "hash_prefix_len": 16
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    /// Semantic version of the decoder configuration.
    ///
    /// Default: `1`
    pub version: u32,

    /// Maximum number of decoded bytes a single call may produce.
    ///
    /// Applies to every source kind, raw text included. File handles are read
    /// through a bounded reader, so an oversized file is never fully buffered.
    ///
    /// Default: [`DEFAULT_MAX_PAYLOAD_BYTES`]
    pub max_payload_bytes: usize,

    /// How many leading bytes the content sniffer inspects.
    ///
    /// Default: `512`
    pub sniff_window_bytes: usize,

    /// Upper bound on derived file names, in bytes.
    ///
    /// Default: `128`
    pub max_name_len: usize,

    /// Number of hex characters of the SHA-256 digest used in synthesized names.
    ///
    /// Default: `16`
    pub hash_prefix_len: usize,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            version: 1,
            max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
            sniff_window_bytes: 512,
            max_name_len: 128,
            hash_prefix_len: 16,
        }
    }
}

/// Errors that can occur when validating a [`DecoderConfig`].
///
/// These are start-up problems; surface them before decoding anything.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("max_payload_bytes must be greater than zero")]
    ZeroPayloadLimit,

    #[error("sniff_window_bytes ({window}) is below the minimum of 8")]
    SniffWindowTooSmall { window: usize },

    #[error("hash_prefix_len ({len}) must be between 8 and 64")]
    HashPrefixOutOfRange { len: usize },

    /// A synthesized name (`<hash>.<ext>`) would not fit in `max_name_len`.
    #[error("max_name_len ({max_name_len}) cannot hold a synthesized name of {required} bytes")]
    NameLimitTooSmall { max_name_len: usize, required: usize },
}

impl DecoderConfig {
    /// Validates internal consistency of this configuration.
    ///
    /// ```rust
    /// use decoder::{ConfigError, DecoderConfig};
    ///
    /// let config = DecoderConfig { hash_prefix_len: 4, ..Default::default() };
    /// assert_eq!(
    ///     config.validate(),
    ///     Err(ConfigError::HashPrefixOutOfRange { len: 4 })
    /// );
    /// ```
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_payload_bytes == 0 {
            return Err(ConfigError::ZeroPayloadLimit);
        }
        if self.sniff_window_bytes < MIN_SNIFF_WINDOW_BYTES {
            return Err(ConfigError::SniffWindowTooSmall {
                window: self.sniff_window_bytes,
            });
        }
        if !(8..=64).contains(&self.hash_prefix_len) {
            return Err(ConfigError::HashPrefixOutOfRange {
                len: self.hash_prefix_len,
            });
        }
        // Longest extension in the type table is four characters.
        let required = self.hash_prefix_len + 1 + 4;
        if self.max_name_len < required {
            return Err(ConfigError::NameLimitTooSmall {
                max_name_len: self.max_name_len,
                required,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert_eq!(DecoderConfig::default().validate(), Ok(()));
    }

    #[test]
    fn test_invalid_configs() {
        let cases = [
            (
                DecoderConfig {
                    max_payload_bytes: 0,
                    ..Default::default()
                },
                ConfigError::ZeroPayloadLimit,
            ),
            (
                DecoderConfig {
                    sniff_window_bytes: 4,
                    ..Default::default()
                },
                ConfigError::SniffWindowTooSmall { window: 4 },
            ),
            (
                DecoderConfig {
                    hash_prefix_len: 65,
                    ..Default::default()
                },
                ConfigError::HashPrefixOutOfRange { len: 65 },
            ),
            (
                DecoderConfig {
                    max_name_len: 20,
                    ..Default::default()
                },
                ConfigError::NameLimitTooSmall {
                    max_name_len: 20,
                    required: 21,
                },
            ),
        ];

        for (config, expected) in cases {
            assert_eq!(config.validate(), Err(expected));
        }
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: DecoderConfig =
            serde_json::from_str(r#"{"max_payload_bytes": 2048}"#).expect("parse config");
        assert_eq!(config.max_payload_bytes, 2048);
        assert_eq!(config.sniff_window_bytes, 512);
        assert_eq!(config.hash_prefix_len, 16);
    }
}
