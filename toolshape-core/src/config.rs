// toolshape-core/src/config.rs

//! `Toolshape.toml` settings.
//!
//! Every table and key is optional. A missing file and an empty file both
//! produce [`ToolshapeConfig::default`].

use crate::errors::ConfigError;
use crate::parsers::git::DEFAULT_LOG_DELIMITER;
use crate::parsers::ParseOptions;
use serde::Deserialize;

/// Name of the file the CLI looks for.
pub const CONFIG_FILE_NAME: &str = "Toolshape.toml";

#[derive(Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct ToolshapeConfig {
    pub limits: LimitsConfig,
    pub git: GitConfig,
    pub output: OutputConfig,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct LimitsConfig {
    /// Per-stream cap applied to captured output before parsing.
    pub max_output_bytes: usize,
    pub timeout_secs: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_output_bytes: 4 * 1024 * 1024,
            timeout_secs: 300,
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct GitConfig {
    pub log_delimiter: String,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            log_delimiter: DEFAULT_LOG_DELIMITER.to_string(),
        }
    }
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Human,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub prefer_full: bool,
}

impl ToolshapeConfig {
    pub fn from_toml_str(content: &str) -> Result<ToolshapeConfig, ConfigError> {
        let config: ToolshapeConfig = match toml::from_str(content) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::error!(error = %e, "Failed to parse TOML content");
                return Err(ConfigError::Toml(e));
            }
        };

        if config.limits.max_output_bytes == 0 {
            return Err(ConfigError::Invalid(
                "'limits.max_output_bytes' must be greater than zero".to_string(),
            ));
        }
        if config.limits.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "'limits.timeout_secs' must be greater than zero".to_string(),
            ));
        }
        let delimiter = &config.git.log_delimiter;
        if delimiter.is_empty() {
            return Err(ConfigError::Invalid(
                "'git.log_delimiter' is empty".to_string(),
            ));
        }
        if delimiter.contains('\n') || delimiter.contains('\0') {
            return Err(ConfigError::Invalid(format!(
                "'git.log_delimiter' ({:?}) must not contain a newline or NUL",
                delimiter
            )));
        }

        tracing::debug!(?config, "Parsed toolshape configuration");
        Ok(config)
    }

    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            log_delimiter: self.git.log_delimiter.clone(),
            prefer_full: self.output.prefer_full,
        }
    }
}
