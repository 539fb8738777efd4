// Configuration source loading.
//
// Priority order:
// 1. Environment variables (TX2CUBE_* prefix)
// 2. Config file path from TX2CUBE_CONFIG
// 3. Inline config content from TX2CUBE_CONFIG_CONTENT
// 4. Default config files (./tx2cube.toml, ./.tx2cube.toml)
// 5. Built-in defaults

use crate::env_overrides::{self, EnvSource, ENV_PREFIX};
use crate::EtlConfig;
use anyhow::{Context, Result};
use std::env;
use std::path::Path;

/// Load configuration from the default source chain.
pub fn load_config() -> Result<EtlConfig> {
    let mut config = load_from_file()?.unwrap_or_default();

    let env_source = StdEnvSource;
    env_overrides::apply_env_overrides(&mut config, &env_source)?;
    config.validate()?;
    Ok(config)
}

fn load_from_file() -> Result<Option<EtlConfig>> {
    if let Ok(path) = env::var("TX2CUBE_CONFIG") {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path))?;
        let config: EtlConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path))?;
        return Ok(Some(config));
    }

    if let Ok(content) = env::var("TX2CUBE_CONFIG_CONTENT") {
        let config: EtlConfig = toml::from_str(&content)
            .context("Failed to parse inline config from TX2CUBE_CONFIG_CONTENT")?;
        return Ok(Some(config));
    }

    for path in &["./tx2cube.toml", "./.tx2cube.toml"] {
        if Path::new(path).exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path))?;
            let config: EtlConfig = toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path))?;
            return Ok(Some(config));
        }
    }

    Ok(None)
}

/// Load configuration from a specific file path, then apply environment
/// overrides. Returns an error if the file doesn't exist or can't be
/// parsed.
pub fn load_from_file_path(path: impl AsRef<Path>) -> Result<EtlConfig> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let mut config: EtlConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

    let env_source = StdEnvSource;
    env_overrides::apply_env_overrides(&mut config, &env_source)?;

    config.validate()?;
    Ok(config)
}

struct StdEnvSource;

impl EnvSource for StdEnvSource {
    fn get(&self, key: &str) -> Option<String> {
        env::var(format!("{}{}", ENV_PREFIX, key)).ok()
    }
}
