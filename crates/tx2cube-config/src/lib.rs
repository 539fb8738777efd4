// tx2cube-config - Runtime configuration for the ETL pipeline
//
// Supports configuration from multiple sources:
// 1. Environment variables (TX2CUBE_* prefix, highest priority)
// 2. Config file path from TX2CUBE_CONFIG env var
// 3. Config file contents from TX2CUBE_CONFIG_CONTENT env var
// 4. Default config file locations (./tx2cube.toml, ./.tx2cube.toml)
// 5. Built-in defaults (lowest priority)

use anyhow::Result;
use serde::Deserialize;
use std::path::{Path, PathBuf};

mod env_overrides;
mod sources;
mod validation;

pub use env_overrides::EnvSource;

/// Main ETL configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EtlConfig {
    #[serde(default = "default_input_file")]
    pub input_file: PathBuf,

    #[serde(default = "default_output_cube")]
    pub output_cube: PathBuf,

    #[serde(default)]
    pub compression: Compression,

    /// Prefer the low-memory streaming sink; the materialized path is
    /// always available as fallback.
    #[serde(default = "default_streaming")]
    pub streaming: bool,

    #[serde(default = "default_row_group_size")]
    pub row_group_size: usize,

    #[serde(default)]
    pub log: LogConfig,
}

fn default_input_file() -> PathBuf {
    PathBuf::from("data/credit_card.csv")
}

fn default_output_cube() -> PathBuf {
    PathBuf::from("data/bi_cube.parquet")
}

fn default_streaming() -> bool {
    true
}

fn default_row_group_size() -> usize {
    32 * 1024
}

impl Default for EtlConfig {
    fn default() -> Self {
        Self {
            input_file: default_input_file(),
            output_cube: default_output_cube(),
            compression: Compression::default(),
            streaming: default_streaming(),
            row_group_size: default_row_group_size(),
            log: LogConfig::default(),
        }
    }
}

/// Supported cube compression codecs.
///
/// Validated at parse time so an invalid choice fails before any
/// processing begins.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    #[default]
    Zstd,
    Snappy,
    Lz4,
}

impl std::fmt::Display for Compression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Compression::Zstd => write!(f, "zstd"),
            Compression::Snappy => write!(f, "snappy"),
            Compression::Lz4 => write!(f, "lz4"),
        }
    }
}

impl std::str::FromStr for Compression {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "zstd" => Ok(Compression::Zstd),
            "snappy" => Ok(Compression::Snappy),
            "lz4" => Ok(Compression::Lz4),
            _ => anyhow::bail!(
                "Unsupported compression: {}. Supported: zstd, snappy, lz4",
                s
            ),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::Text,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl EtlConfig {
    /// Load configuration from all sources with priority.
    pub fn load() -> Result<Self> {
        sources::load_config()
    }

    /// Load configuration from a specific file path (for the CLI
    /// `--config` flag), then apply environment overrides.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        sources::load_from_file_path(path)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compression_from_str() {
        assert_eq!("zstd".parse::<Compression>().unwrap(), Compression::Zstd);
        assert_eq!("SNAPPY".parse::<Compression>().unwrap(), Compression::Snappy);
        assert_eq!("lz4".parse::<Compression>().unwrap(), Compression::Lz4);
        assert!("gzip".parse::<Compression>().is_err());
    }

    #[test]
    fn test_defaults_match_reference_settings() {
        let config = EtlConfig::default();
        assert_eq!(config.input_file, PathBuf::from("data/credit_card.csv"));
        assert_eq!(config.output_cube, PathBuf::from("data/bi_cube.parquet"));
        assert_eq!(config.compression, Compression::Zstd);
        assert!(config.streaming);
        assert_eq!(config.row_group_size, 32 * 1024);
        assert_eq!(config.log.level, "info");
        assert_eq!(config.log.format, LogFormat::Text);
    }

    #[test]
    fn test_toml_round_trip() {
        let config: EtlConfig = toml::from_str(
            r#"
            input_file = "in.csv"
            output_cube = "out.parquet"
            compression = "lz4"
            streaming = false

            [log]
            level = "debug"
            format = "json"
            "#,
        )
        .unwrap();
        assert_eq!(config.input_file, PathBuf::from("in.csv"));
        assert_eq!(config.compression, Compression::Lz4);
        assert!(!config.streaming);
        assert_eq!(config.row_group_size, 32 * 1024);
        assert_eq!(config.log.format, LogFormat::Json);
    }

    #[test]
    fn test_invalid_compression_fails_parse() {
        let result = toml::from_str::<EtlConfig>(r#"compression = "brotli""#);
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result = toml::from_str::<EtlConfig>(r#"input_flie = "typo.csv""#);
        assert!(result.is_err());
    }
}
