// Pipeline orchestration: ingest, aggregate, sink, report.

use anyhow::{Context, Result};
use parquet::basic::{Compression as ParquetCompression, ZstdLevel};
use std::fs::File;
use std::io::BufReader;
use std::time::Instant;
use tracing::info;
use tx2cube_config::{Compression, EtlConfig};
use tx2cube_core::{write_cube, SinkOptions};

pub(crate) fn run(config: &EtlConfig) -> Result<()> {
    let start = Instant::now();
    info!(
        input = %config.input_file.display(),
        output = %config.output_cube.display(),
        compression = %config.compression,
        streaming = config.streaming,
        "starting cube build"
    );

    let file = File::open(&config.input_file)
        .with_context(|| format!("Failed to open input file: {}", config.input_file.display()))?;
    let (cube, stats) = tx2cube_core::build_cube(BufReader::new(file))
        .context("Failed to aggregate transactions")?;

    if stats.malformed > 0 || stats.invalid_dates > 0 {
        info!(
            malformed = stats.malformed,
            invalid_dates = stats.invalid_dates,
            "dropped rows during ingestion"
        );
    }
    info!(
        rows_read = stats.rows_read,
        surviving = stats.surviving(),
        null_amounts = stats.null_amounts,
        groups = cube.len(),
        "aggregation complete"
    );

    let opts = SinkOptions {
        compression: to_parquet_compression(config.compression),
        row_group_size: config.row_group_size,
        streaming: config.streaming,
    };
    let report =
        write_cube(&cube, &config.output_cube, &opts).context("Failed to write cube")?;

    let size_bytes = std::fs::metadata(&config.output_cube)
        .map(|m| m.len())
        .unwrap_or(0);
    info!(
        rows = report.rows_written,
        used_fallback = report.used_fallback,
        size_mib = %format_args!("{:.2}", size_bytes as f64 / (1024.0 * 1024.0)),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "cube written"
    );

    Ok(())
}

fn to_parquet_compression(compression: Compression) -> ParquetCompression {
    match compression {
        Compression::Zstd => ParquetCompression::ZSTD(ZstdLevel::try_new(2).unwrap_or_default()),
        Compression::Snappy => ParquetCompression::SNAPPY,
        Compression::Lz4 => ParquetCompression::LZ4_RAW,
    }
}
