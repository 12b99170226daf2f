//! Configuration file support for the rst2html CLI
//!
//! Loads settings from an `_rst2html.toml` configuration file next to the
//! input. Command-line flags always win over the file.

use anyhow::{Context, Result};
use clap::ValueEnum;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file name
pub const CONFIG_FILE_NAME: &str = "_rst2html.toml";

/// How diagnostics are printed
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, ValueEnum, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticsFormat {
    /// `file:line: severity: message`, one per line
    #[default]
    Text,
    /// One JSON object per input file
    Json,
}

/// Which diagnostic severity makes the run exit non-zero
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, ValueEnum, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum FailOn {
    /// Diagnostics never affect the exit code
    #[default]
    Never,
    /// Any diagnostic fails the run
    Warning,
    /// Only error diagnostics fail the run
    Error,
}

/// Root configuration structure
#[derive(Debug, Default, Clone, Deserialize, Serialize, JsonSchema)]
#[serde(default)]
pub struct Config {
    /// Output configuration
    #[serde(skip_serializing_if = "OutputConfig::is_empty")]
    pub output: OutputConfig,
    /// Diagnostics reporting configuration
    #[serde(skip_serializing_if = "DiagnosticsConfig::is_empty")]
    pub diagnostics: DiagnosticsConfig,
}

/// Output configuration
#[derive(Debug, Default, Clone, Deserialize, Serialize, JsonSchema)]
#[serde(default)]
pub struct OutputConfig {
    /// Extension for output files (default: "html")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension: Option<String>,
}

impl OutputConfig {
    fn is_empty(&self) -> bool {
        self.extension.is_none()
    }
}

/// Diagnostics reporting configuration
#[derive(Debug, Default, Clone, Deserialize, Serialize, JsonSchema)]
#[serde(default)]
pub struct DiagnosticsConfig {
    /// Diagnostics output format: "text" or "json" (default: "text")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<DiagnosticsFormat>,
    /// Severity that makes the run exit non-zero: "never", "warning", or
    /// "error" (default: "never")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fail_on: Option<FailOn>,
}

impl DiagnosticsConfig {
    fn is_empty(&self) -> bool {
        self.format.is_none() && self.fail_on.is_none()
    }
}

impl Config {
    /// Load configuration from a specific file path
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Try to load configuration from a directory (looks for `_rst2html.toml`)
    ///
    /// Returns `Ok(None)` if the config file doesn't exist.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Generate JSON schema for the configuration as a string
    pub fn json_schema_string() -> Result<String> {
        let schema = schemars::schema_for!(Config);
        serde_json::to_string_pretty(&schema).context("Failed to serialize JSON schema")
    }
}
