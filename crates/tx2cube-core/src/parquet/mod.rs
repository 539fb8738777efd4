// Parquet sink for the aggregated cube
//
// Two write paths with identical logical output: a streaming path that
// encodes the cube one row-group-sized chunk at a time, and a
// materialized path that builds the whole batch first. The fallback from
// streaming to materialized is scoped to streaming-path failures only;
// failures that would equally break the fallback (output file setup) are
// fatal immediately.

use std::fs::File;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

use anyhow::Context;
use parquet::arrow::ArrowWriter;
use parquet::basic::{Compression, ZstdLevel};
use parquet::file::properties::{EnabledStatistics, WriterProperties};
use thiserror::Error;
use tracing::{debug, warn};

use crate::cube::{build_batch, Cube};
use crate::schema::cube_schema_arc;

pub const DEFAULT_ROW_GROUP_SIZE: usize = 32 * 1024;

/// Per-run sink settings, resolved from configuration by the caller.
#[derive(Debug, Clone, Copy)]
pub struct SinkOptions {
    pub compression: Compression,
    pub row_group_size: usize,
    pub streaming: bool,
}

impl Default for SinkOptions {
    fn default() -> Self {
        Self {
            compression: Compression::ZSTD(ZstdLevel::try_new(2).unwrap_or_default()),
            row_group_size: DEFAULT_ROW_GROUP_SIZE,
            streaming: true,
        }
    }
}

/// Writer properties for the cube file.
///
/// Dictionary encoding on and page statistics match what the downstream
/// readers expect from a BI aggregate; compression and row group size
/// come from configuration.
pub fn writer_properties(opts: &SinkOptions) -> WriterProperties {
    WriterProperties::builder()
        .set_dictionary_enabled(true)
        .set_statistics_enabled(EnabledStatistics::Page)
        .set_compression(opts.compression)
        .set_max_row_group_size(opts.row_group_size)
        .build()
}

/// Errors from the cube sink, classified for fallback scoping.
#[derive(Debug, Error)]
pub enum SinkError {
    /// Preparing the output file failed; the materialized path would hit
    /// the identical failure, so no fallback is attempted.
    #[error("failed to create output file '{path}'")]
    Setup {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The streaming write path failed; recoverable via materialization.
    #[error("streaming cube write failed")]
    Streaming {
        #[source]
        source: anyhow::Error,
    },

    /// The materialized write path failed; fatal.
    #[error("materialized cube write failed")]
    Materialize {
        #[source]
        source: anyhow::Error,
    },
}

impl SinkError {
    pub fn is_recoverable(&self) -> bool {
        matches!(self, SinkError::Streaming { .. })
    }
}

/// Outcome of a successful sink run.
#[derive(Debug, Clone, Copy)]
pub struct SinkReport {
    pub rows_written: usize,
    /// True when the streaming path failed and the materialized fallback
    /// produced the file.
    pub used_fallback: bool,
}

/// Write the cube to `path`, preferring the streaming path when enabled.
///
/// A recoverable streaming failure is logged and recovered by rewriting
/// the file through the materialized path; it is not surfaced as an error
/// to the caller.
pub fn write_cube(cube: &Cube, path: &Path, opts: &SinkOptions) -> Result<SinkReport, SinkError> {
    if !opts.streaming {
        write_materialized(cube, path, opts)?;
        return Ok(SinkReport {
            rows_written: cube.len(),
            used_fallback: false,
        });
    }

    match write_streaming(cube, path, opts) {
        Ok(()) => Ok(SinkReport {
            rows_written: cube.len(),
            used_fallback: false,
        }),
        Err(err) if err.is_recoverable() => {
            warn!(
                error = %format_chain(&err),
                "streaming sink failed, falling back to materialized write"
            );
            write_materialized(cube, path, opts)?;
            Ok(SinkReport {
                rows_written: cube.len(),
                used_fallback: true,
            })
        }
        Err(err) => Err(err),
    }
}

/// Encode the cube chunk by chunk through one `ArrowWriter`.
///
/// Peak memory is one chunk of Arrow data; `File::create` truncates, so a
/// partial file left by a mid-stream failure is rewritten cleanly by the
/// fallback.
fn write_streaming(cube: &Cube, path: &Path, opts: &SinkOptions) -> Result<(), SinkError> {
    let file = create_output(path)?;
    let props = writer_properties(opts);

    let result = (|| -> anyhow::Result<()> {
        let mut writer = ArrowWriter::try_new(
            BufWriter::new(file),
            cube_schema_arc(),
            Some(props),
        )
        .context("creating streaming Arrow writer")?;

        for chunk in cube.rows().chunks(opts.row_group_size.max(1)) {
            let batch = build_batch(cube, chunk)?;
            writer.write(&batch).context("writing cube chunk")?;
        }

        writer.close().context("finalizing streaming cube file")?;
        Ok(())
    })();

    result.map_err(|source| SinkError::Streaming { source })?;
    debug!(rows = cube.len(), "streaming cube write complete");
    Ok(())
}

/// Build the entire cube as one batch and write it in a single call.
fn write_materialized(cube: &Cube, path: &Path, opts: &SinkOptions) -> Result<(), SinkError> {
    let file = create_output(path)?;
    let props = writer_properties(opts);

    let result = (|| -> anyhow::Result<()> {
        let batch = build_batch(cube, cube.rows())?;
        let mut writer = ArrowWriter::try_new(
            BufWriter::new(file),
            cube_schema_arc(),
            Some(props),
        )
        .context("creating materialized Arrow writer")?;
        writer.write(&batch).context("writing cube batch")?;
        writer.close().context("finalizing materialized cube file")?;
        Ok(())
    })();

    result.map_err(|source| SinkError::Materialize { source })?;
    debug!(rows = cube.len(), "materialized cube write complete");
    Ok(())
}

fn create_output(path: &Path) -> Result<File, SinkError> {
    File::create(path).map_err(|source| SinkError::Setup {
        path: path.to_path_buf(),
        source,
    })
}

fn format_chain(err: &SinkError) -> String {
    use std::error::Error;
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}
