// Configuration validation
//
// Validates that required fields are present and values are sensible,
// before any processing begins.

use crate::EtlConfig;
use anyhow::{bail, Result};
use tracing::warn;

pub fn validate_config(config: &EtlConfig) -> Result<()> {
    if config.input_file.as_os_str().is_empty() {
        bail!("input_file must not be empty");
    }

    if config.output_cube.as_os_str().is_empty() {
        bail!("output_cube must not be empty");
    }

    if config.row_group_size == 0 {
        bail!("row_group_size must be greater than 0");
    }

    if config.row_group_size > 10_000_000 {
        warn!(
            row_group_size = config.row_group_size,
            "row_group_size is very large; may cause memory issues"
        );
    }

    if config.log.level.is_empty() {
        bail!("log.level must not be empty");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&EtlConfig::default()).is_ok());
    }

    #[test]
    fn test_empty_paths_rejected() {
        let mut config = EtlConfig::default();
        config.input_file = PathBuf::new();
        assert!(validate_config(&config).is_err());

        let mut config = EtlConfig::default();
        config.output_cube = PathBuf::new();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_zero_row_group_size_rejected() {
        let mut config = EtlConfig::default();
        config.row_group_size = 0;
        assert!(validate_config(&config).is_err());
    }
}
