// Environment-variable overrides for the ETL configuration.

use crate::{Compression, EtlConfig, LogFormat};
use anyhow::{anyhow, Context, Result};
use std::path::PathBuf;

pub const ENV_PREFIX: &str = "TX2CUBE_";

/// Abstraction over environment-variable lookups so tests can supply
/// their own source of overrides without touching the process
/// environment.
pub trait EnvSource {
    fn get(&self, key: &str) -> Option<String>;
}

/// Apply environment-variable overrides (highest priority) to the config.
pub fn apply_env_overrides<E: EnvSource>(config: &mut EtlConfig, env: &E) -> Result<()> {
    if let Some(path) = env.get("INPUT_FILE") {
        config.input_file = PathBuf::from(path);
    }
    if let Some(path) = env.get("OUTPUT_CUBE") {
        config.output_cube = PathBuf::from(path);
    }
    if let Some(compression) = env.get("COMPRESSION") {
        config.compression = compression
            .parse::<Compression>()
            .context("Invalid TX2CUBE_COMPRESSION value")?;
    }
    if let Some(val) = get_env_bool(env, "STREAMING")? {
        config.streaming = val;
    }
    if let Some(val) = get_env_usize(env, "ROW_GROUP_SIZE")? {
        config.row_group_size = val;
    }
    if let Some(level) = env.get("LOG_LEVEL") {
        config.log.level = level;
    }
    if let Some(format) = env.get("LOG_FORMAT") {
        config.log.format = match format.to_lowercase().as_str() {
            "json" => LogFormat::Json,
            _ => LogFormat::Text,
        };
    }

    Ok(())
}

fn get_env_bool<E: EnvSource>(env: &E, key: &str) -> Result<Option<bool>> {
    match env.get(key) {
        Some(val) => match val.to_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(Some(true)),
            "false" | "0" | "no" => Ok(Some(false)),
            _ => Err(anyhow!("Invalid boolean for {}{}: {}", ENV_PREFIX, key, val)),
        },
        None => Ok(None),
    }
}

fn get_env_usize<E: EnvSource>(env: &E, key: &str) -> Result<Option<usize>> {
    match env.get(key) {
        Some(val) => val
            .parse::<usize>()
            .map(Some)
            .with_context(|| format!("Invalid integer for {}{}: {}", ENV_PREFIX, key, val)),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct FakeEnv(HashMap<&'static str, &'static str>);

    impl EnvSource for FakeEnv {
        fn get(&self, key: &str) -> Option<String> {
            self.0.get(key).map(|v| v.to_string())
        }
    }

    #[test]
    fn test_overrides_applied() {
        let mut config = EtlConfig::default();
        let env = FakeEnv(HashMap::from([
            ("INPUT_FILE", "/tmp/tx.csv"),
            ("OUTPUT_CUBE", "/tmp/cube.parquet"),
            ("COMPRESSION", "snappy"),
            ("STREAMING", "false"),
            ("ROW_GROUP_SIZE", "1024"),
            ("LOG_LEVEL", "debug"),
            ("LOG_FORMAT", "json"),
        ]));

        apply_env_overrides(&mut config, &env).unwrap();
        assert_eq!(config.input_file, PathBuf::from("/tmp/tx.csv"));
        assert_eq!(config.output_cube, PathBuf::from("/tmp/cube.parquet"));
        assert_eq!(config.compression, Compression::Snappy);
        assert!(!config.streaming);
        assert_eq!(config.row_group_size, 1024);
        assert_eq!(config.log.level, "debug");
        assert_eq!(config.log.format, LogFormat::Json);
    }

    #[test]
    fn test_no_overrides_is_noop() {
        let mut config = EtlConfig::default();
        apply_env_overrides(&mut config, &FakeEnv(HashMap::new())).unwrap();
        assert_eq!(config.compression, Compression::Zstd);
        assert!(config.streaming);
    }

    #[test]
    fn test_invalid_compression_rejected() {
        let mut config = EtlConfig::default();
        let env = FakeEnv(HashMap::from([("COMPRESSION", "gzip")]));
        assert!(apply_env_overrides(&mut config, &env).is_err());
    }

    #[test]
    fn test_invalid_bool_rejected() {
        let mut config = EtlConfig::default();
        let env = FakeEnv(HashMap::from([("STREAMING", "maybe")]));
        assert!(apply_env_overrides(&mut config, &env).is_err());
    }
}
