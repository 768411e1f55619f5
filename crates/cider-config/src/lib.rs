//! Configuration system for the cider JIT library.
//!
//! Load code-generation settings from TOML or YAML files to control the
//! Cranelift optimisation level, IR verification and IR logging without
//! code changes.
//!
//! # Examples
//!
//! Load configuration from TOML string:
//!
//! ```
//! use cider_config::{JitConfig, OptLevel};
//!
//! let config = JitConfig::from_toml_str(r#"
//!     opt_level = "none"
//!     enable_verifier = true
//!     log_ir = true
//! "#).unwrap();
//!
//! assert_eq!(config.opt_level, OptLevel::None);
//! assert!(config.log_ir);
//! ```
//!
//! Use default config when file is missing:
//!
//! ```
//! use cider_config::JitConfig;
//!
//! let config = JitConfig::load("jit.toml").unwrap_or_default();
//! // Proceeds with defaults if file doesn't exist
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;


/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Code-generation configuration for one JIT module.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct JitConfig {
    /// Cranelift optimisation level.
    #[serde(default)]
    pub opt_level: OptLevel,

    /// Run the Cranelift IR verifier before code emission.
    #[serde(default = "default_true")]
    pub enable_verifier: bool,

    /// Log the textual IR of every function at DEBUG level before definition.
    #[serde(default)]
    pub log_ir: bool,
}

fn default_true() -> bool {
    true
}

impl Default for JitConfig {
    fn default() -> Self {
        Self {
            opt_level: OptLevel::default(),
            enable_verifier: true,
            log_ir: false,
        }
    }
}

impl JitConfig {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if file doesn't exist or contains invalid TOML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_toml_file(path)
    }

    /// Loads configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Loads configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    /// Parses configuration from a YAML string.
    pub fn from_yaml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(s)?)
    }

    /// Sets the optimisation level.
    pub fn with_opt_level(mut self, opt_level: OptLevel) -> Self {
        self.opt_level = opt_level;
        self
    }

    /// Enables or disables the IR verifier.
    pub fn with_verifier(mut self, enabled: bool) -> Self {
        self.enable_verifier = enabled;
        self
    }

    /// Enables or disables IR logging.
    pub fn with_ir_logging(mut self, enabled: bool) -> Self {
        self.log_ir = enabled;
        self
    }
}

/// Cranelift optimisation level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OptLevel {
    /// No optimisation; fastest compilation.
    None,

    /// Optimise for execution speed.
    #[default]
    Speed,

    /// Optimise for speed and code size.
    SpeedAndSize,
}

impl OptLevel {
    /// Returns the value accepted by Cranelift's `opt_level` setting.
    pub fn as_setting(self) -> &'static str {
        match self {
            OptLevel::None => "none",
            OptLevel::Speed => "speed",
            OptLevel::SpeedAndSize => "speed_and_size",
        }
    }
}
