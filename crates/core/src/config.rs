use std::env;
use std::path::PathBuf;
use thiserror::Error;

const DEFAULT_OUT_DIR: &str = "nbstack.out";
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid template format '{0}'. Valid options: json, yaml")]
    InvalidFormat(String),

    #[error("invalid log level '{0}'. Valid levels: trace, debug, info, warn, error")]
    InvalidLogLevel(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TemplateFormat {
    #[default]
    Json,
    Yaml,
}

impl TemplateFormat {
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        match s.to_lowercase().as_str() {
            "json" => Ok(TemplateFormat::Json),
            "yaml" | "yml" => Ok(TemplateFormat::Yaml),
            other => Err(ConfigError::InvalidFormat(other.to_string())),
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            TemplateFormat::Json => "json",
            TemplateFormat::Yaml => "yaml",
        }
    }
}

/// Synthesis configuration, environment-driven with literal defaults.
///
/// - `NBSTACK_OUT_DIR` - cloud assembly output directory
/// - `NBSTACK_FORMAT` - template rendering (json|yaml)
/// - `NBSTACK_LOG_LEVEL` - default log level for the CLI
#[derive(Debug, Clone)]
pub struct NbstackConfig {
    pub out_dir: PathBuf,
    pub format: TemplateFormat,
    pub log_level: String,
}

impl Default for NbstackConfig {
    fn default() -> Self {
        let out_dir = env::var("NBSTACK_OUT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_OUT_DIR));

        let format = env::var("NBSTACK_FORMAT")
            .ok()
            .and_then(|v| TemplateFormat::parse(&v).ok())
            .unwrap_or_default();

        let log_level = env::var("NBSTACK_LOG_LEVEL")
            .unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string())
            .to_lowercase();

        Self {
            out_dir,
            format,
            log_level,
        }
    }
}

impl NbstackConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
            other => Err(ConfigError::InvalidLogLevel(other.to_string())),
        }
    }
}
