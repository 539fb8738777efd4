use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tx2cube_config::EtlConfig;

mod init;
mod run;

/// Aggregate a transaction CSV into a Parquet BI cube
#[derive(Debug, Parser)]
#[command(name = "tx2cube")]
#[command(version)]
#[command(about = "Aggregate a transaction CSV into a Parquet BI cube", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Input transaction CSV (overrides config file)
    #[arg(short, long, value_name = "FILE")]
    input: Option<PathBuf>,

    /// Output cube path (overrides config file)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Cube compression: zstd, snappy, lz4
    #[arg(long, value_name = "CODEC")]
    compression: Option<String>,

    /// Force the streaming sink on or off
    #[arg(long, value_name = "BOOL")]
    streaming: Option<bool>,

    /// Log level: trace, debug, info, warn, error
    #[arg(short = 'v', long, value_name = "LEVEL")]
    log_level: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Step 1: Load base configuration
    let mut config = if let Some(config_path) = &cli.config {
        EtlConfig::load_from_path(config_path)
            .with_context(|| format!("Failed to load config from {}", config_path.display()))?
    } else {
        EtlConfig::load().context("Failed to load configuration")?
    };

    // Step 2: Apply CLI overrides (highest priority)
    apply_cli_overrides(&mut config, &cli)?;

    // Step 3: Validate configuration before any processing
    config.validate().context("Invalid configuration")?;

    init::init_tracing(&config);

    // Step 4: Validate the filesystem setup (input exists, output writable)
    validate_setup(&config)?;

    // Step 5: Run the pipeline
    run::run(&config)
}

fn apply_cli_overrides(config: &mut EtlConfig, cli: &Cli) -> Result<()> {
    if let Some(input) = &cli.input {
        config.input_file = input.clone();
    }
    if let Some(output) = &cli.output {
        config.output_cube = output.clone();
    }
    if let Some(compression) = &cli.compression {
        config.compression = compression
            .parse()
            .context("Invalid --compression value")?;
    }
    if let Some(streaming) = cli.streaming {
        config.streaming = streaming;
    }
    if let Some(level) = &cli.log_level {
        config.log.level = level.clone();
    }
    Ok(())
}

fn validate_setup(config: &EtlConfig) -> Result<()> {
    if !config.input_file.exists() {
        anyhow::bail!("Input file not found: {}", config.input_file.display());
    }

    let Some(parent) = config.output_cube.parent() else {
        return Ok(());
    };
    if parent.as_os_str().is_empty() {
        return Ok(());
    }

    if !parent.exists() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory: {}", parent.display()))?;
    }

    // Validate writability by creating a test file
    let test_file = parent.join(".tx2cube-write-test");
    std::fs::write(&test_file, b"test").with_context(|| {
        format!(
            "Output directory '{}' is not writable. Check permissions.",
            parent.display()
        )
    })?;
    std::fs::remove_file(&test_file).context("Failed to remove test file")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tx2cube_config::Compression;

    fn cli(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("tx2cube").chain(args.iter().copied()))
    }

    #[test]
    fn test_cli_overrides() {
        let mut config = EtlConfig::default();
        let cli = cli(&[
            "--input",
            "in.csv",
            "--output",
            "out.parquet",
            "--compression",
            "snappy",
            "--streaming",
            "false",
            "--log-level",
            "debug",
        ]);

        apply_cli_overrides(&mut config, &cli).unwrap();
        assert_eq!(config.input_file, PathBuf::from("in.csv"));
        assert_eq!(config.output_cube, PathBuf::from("out.parquet"));
        assert_eq!(config.compression, Compression::Snappy);
        assert!(!config.streaming);
        assert_eq!(config.log.level, "debug");
    }

    #[test]
    fn test_invalid_compression_flag_rejected() {
        let mut config = EtlConfig::default();
        let cli = cli(&["--compression", "gzip"]);
        assert!(apply_cli_overrides(&mut config, &cli).is_err());
    }

    #[test]
    fn test_setup_rejects_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = EtlConfig::default();
        config.input_file = dir.path().join("missing.csv");
        config.output_cube = dir.path().join("out.parquet");
        assert!(validate_setup(&config).is_err());
    }

    #[test]
    fn test_setup_creates_output_directory() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.csv");
        std::fs::write(&input, b"").unwrap();

        let mut config = EtlConfig::default();
        config.input_file = input;
        config.output_cube = dir.path().join("nested/out/cube.parquet");
        validate_setup(&config).unwrap();
        assert!(dir.path().join("nested/out").is_dir());
    }
}
