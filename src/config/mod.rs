//! Configuration for the miner

mod logging;
mod splitter;

pub use logging::{LogFormat, LogLevel, LoggingConfig};
pub use splitter::{OutputConfig, SplitterConfig};

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file name looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "wiktminer.toml";

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Splitter configuration
    #[serde(default)]
    pub splitter: SplitterConfig,
    /// Chunk output configuration
    #[serde(default)]
    pub output: OutputConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file and validate it.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", path.display(), e))?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config file '{}': {}", path.display(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Load the file if it exists, otherwise fall back to defaults
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Validate all configuration fields.
    ///
    /// Collects every problem and reports them together.
    pub fn validate(&self) -> Result<()> {
        let mut errors: Vec<String> = Vec::new();

        if self.splitter.pages_per_chunk == 0 {
            errors.push("pages_per_chunk must be positive".to_string());
        }
        if self.splitter.max_pages == Some(0) {
            errors.push("max_pages must be positive when set".to_string());
        }
        if let Some(ns) = self.splitter.namespaces.iter().find(|ns| **ns < -2) {
            errors.push(format!("namespace {} is not a valid MediaWiki namespace", ns));
        }
        if self.output.chunk_prefix.contains(std::path::MAIN_SEPARATOR) {
            errors.push("chunk_prefix must not contain a path separator".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            anyhow::bail!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            );
        }
    }
}
