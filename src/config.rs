use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable prefix, e.g. `IPHONE2SBR_LOGGING__LEVEL=debug`
pub const ENV_PREFIX: &str = "IPHONE2SBR";

const VALID_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
const VALID_FORMATS: [&str; 2] = ["text", "json"];

/// Application configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Log output settings
    pub logging: LoggingConfig,
    /// Default import parameters, overridden by command-line flags
    pub import: ImportConfig,
}

/// Log output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Minimum level: trace, debug, info, warn or error
    pub level: String,
    /// Optional log file; rotated daily
    pub file_path: Option<String>,
    /// Console format: "json" or "text"
    pub format: String,
}

/// Import parameters that may also come from configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// CSV export to convert
    pub import_file: Option<String>,
    /// Collection file to append to
    pub collection_file: Option<String>,
    /// Tag attached to the import
    pub tag: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file_path: None,
            format: "json".to_string(),
        }
    }
}

impl LoggingConfig {
    /// Map the numeric `--log-level` flag to a level name.
    ///
    /// 0 is warn, 1 is info, 2 and anything larger is debug.
    #[must_use]
    pub const fn level_for_verbosity(verbosity: u8) -> &'static str {
        match verbosity {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    }
}

impl AppConfig {
    /// Load configuration from multiple sources with precedence
    pub fn load() -> Result<Self> {
        Self::load_with(None)
    }

    /// Load configuration, layering `extra` between the default files and the environment
    pub fn load_with(extra: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false));
        if let Some(path) = extra {
            builder = builder.add_source(File::from(path).required(true));
        }

        let config = builder
            .add_source(Environment::with_prefix(ENV_PREFIX).prefix_separator("_").separator("__"))
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

        let app_config: Self = config
            .try_deserialize()
            .map_err(|e| anyhow::anyhow!("Failed to deserialize configuration: {}", e))?;

        app_config.validate()?;

        Ok(app_config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if !VALID_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(anyhow::anyhow!(
                "Invalid log level: {}. Must be one of: {:?}",
                self.logging.level,
                VALID_LEVELS
            ));
        }

        if !VALID_FORMATS.contains(&self.logging.format.as_str()) {
            return Err(anyhow::anyhow!(
                "Invalid log format: {}. Must be one of: {:?}",
                self.logging.format,
                VALID_FORMATS
            ));
        }

        if matches!(&self.logging.file_path, Some(path) if path.trim().is_empty()) {
            return Err(anyhow::anyhow!("logging.file_path cannot be empty"));
        }

        Ok(())
    }
}
