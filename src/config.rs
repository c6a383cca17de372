//! # Configuration Management
//!
//! Centralized configuration for codec limits, wire tag set and logging.
//!
//! ## Configuration Sources
//! - TOML files via `from_file()`
//! - Direct instantiation with defaults
//! - Environment overrides via `from_env()`
//!
//! ## Security Considerations
//! - Default nesting limit (128) bounds stack use on hostile input
//! - Validation caps nesting at `MAX_SAFE_DEPTH` (512)
//! - Default input limit (16 MB) bounds memory per decode call

use crate::error::{CodecError, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::Level;

/// Default maximum container nesting depth
pub const MAX_NESTING_DEPTH: usize = 128;

/// Default maximum encoded size accepted or produced (16 MB)
pub const MAX_INPUT_SIZE: usize = 16 * 1024 * 1024;

/// Deepest nesting that still decodes on a 2 MiB thread stack in a debug build.
pub const MAX_SAFE_DEPTH: usize = 512;

/// Which built-in tag set the codec speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistryKind {
    /// Every variant, including `float`, `complex` and `sint`.
    #[default]
    Builtin,
    /// Only the nine legacy tags, without `float`, `complex` or `sint`.
    Legacy,
}

/// Top-level configuration
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct CodecConfig {
    /// Tag set
    #[serde(default)]
    pub registry: RegistryKind,

    /// Encode/decode bounds
    #[serde(default)]
    pub limits: LimitsConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl CodecConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path)
            .map_err(|e| CodecError::ConfigError(format!("Failed to open config file: {e}")))?;

        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .map_err(|e| CodecError::ConfigError(format!("Failed to read config file: {e}")))?;

        Self::from_toml(&contents)
    }

    /// Load configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str::<Self>(content)
            .map_err(|e| CodecError::ConfigError(format!("Failed to parse TOML: {e}")))
    }

    /// Defaults overridden by `BLOBWIRE_*` environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(depth) = std::env::var("BLOBWIRE_MAX_DEPTH") {
            config.limits.max_depth = depth.parse::<usize>().map_err(|e| {
                CodecError::ConfigError(format!("Invalid BLOBWIRE_MAX_DEPTH '{depth}': {e}"))
            })?;
        }

        if let Ok(size) = std::env::var("BLOBWIRE_MAX_INPUT_SIZE") {
            config.limits.max_input_size = size.parse::<usize>().map_err(|e| {
                CodecError::ConfigError(format!("Invalid BLOBWIRE_MAX_INPUT_SIZE '{size}': {e}"))
            })?;
        }

        if let Ok(level) = std::env::var("BLOBWIRE_LOG_LEVEL") {
            config.logging.log_level = level.parse::<Level>().map_err(|_| {
                CodecError::ConfigError(format!("Invalid BLOBWIRE_LOG_LEVEL '{level}'"))
            })?;
        }

        Ok(config)
    }

    /// Apply overrides to the default configuration
    pub fn default_with_overrides<F>(mutator: F) -> Self
    where
        F: FnOnce(&mut Self),
    {
        let mut config = Self::default();
        mutator(&mut config);
        config
    }

    /// Generate example configuration file content
    pub fn example_config() -> String {
        toml::to_string_pretty(&Self::default())
            .unwrap_or_else(|_| String::from("# Failed to generate example config"))
    }

    /// Save configuration to a file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| CodecError::ConfigError(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, content)
            .map_err(|e| CodecError::ConfigError(format!("Failed to write config file: {e}")))?;

        Ok(())
    }

    /// Validate the configuration for common issues and misconfigurations
    ///
    /// Returns a list of validation errors. Empty list means configuration is valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        errors.extend(self.limits.validate());
        errors
    }

    /// Validate and return Result - convenience method
    pub fn validate_strict(&self) -> Result<()> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(CodecError::ConfigError(format!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            )))
        }
    }
}

/// Encode/decode bounds
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LimitsConfig {
    /// Maximum container nesting depth
    pub max_depth: usize,

    /// Maximum encoded size in bytes
    pub max_input_size: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_depth: MAX_NESTING_DEPTH,
            max_input_size: MAX_INPUT_SIZE,
        }
    }
}

impl LimitsConfig {
    /// Validate limits
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.max_depth == 0 {
            errors.push("Max depth must be greater than 0".to_string());
        } else if self.max_depth > MAX_SAFE_DEPTH {
            errors.push(format!(
                "Max depth too large: {} (maximum: {MAX_SAFE_DEPTH})",
                self.max_depth
            ));
        }

        if self.max_input_size == 0 {
            errors.push("Max input size cannot be 0".to_string());
        } else if self.max_input_size > 1024 * 1024 * 1024 {
            errors.push(format!(
                "Max input size too large: {} bytes (maximum: 1 GB)",
                self.max_input_size
            ));
        }

        errors
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level, overridden by `RUST_LOG` when set
    #[serde(with = "log_level_serde")]
    pub log_level: Level,

    /// Whether to use JSON formatting for logs
    pub json_format: bool,

    /// Whether to include the event target (module path)
    pub with_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: Level::INFO,
            json_format: false,
            with_target: false,
        }
    }
}

/// Helper module for tracing::Level serialization/deserialization
mod log_level_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::str::FromStr;
    use tracing::Level;

    pub fn serialize<S>(level: &Level, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let level_str = match *level {
            Level::TRACE => "trace",
            Level::DEBUG => "debug",
            Level::INFO => "info",
            Level::WARN => "warn",
            Level::ERROR => "error",
        };
        level_str.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Level, D::Error>
    where
        D: Deserializer<'de>,
    {
        let level_str = String::deserialize(deserializer)?;
        Level::from_str(&level_str)
            .map_err(|_| serde::de::Error::custom(format!("Invalid log level: {level_str}")))
    }
}
