// tx2cube-core - Pure ETL logic
//
// This crate contains the processing logic for turning a transaction CSV
// into the aggregated BI cube: ingestion, type narrowing, flag
// derivation, group-by aggregation and the Parquet sink. No runtime
// wiring, no CLI, no configuration loading.

use anyhow::{Context, Result};
use std::io::Read;

pub mod categorical;
pub mod cube;
pub mod ingest;
pub mod parquet;
pub mod record;
pub mod schema;

// Re-export commonly used types
pub use cube::{Cube, CubeBuilder, GroupKey, GroupRow};
pub use ingest::{CsvScanner, IngestStats};
pub use parquet::{write_cube, SinkError, SinkOptions, SinkReport};
pub use record::{CleanTransaction, RawTransaction};
pub use schema::{cube_schema, cube_schema_arc};

/// Ingest a transaction CSV and aggregate it into the cube.
///
/// Deterministic for the same input modulo group ordering. Malformed and
/// invalid-date rows are dropped and counted in the returned stats; only
/// an I/O failure of the underlying reader is an error.
pub fn build_cube<R: Read>(input: R) -> Result<(Cube, IngestStats)> {
    let mut scanner = CsvScanner::new(input);
    let mut builder = CubeBuilder::new();

    for tx in &mut scanner {
        builder.add(&tx);
    }

    let (stats, io_error) = scanner.finish();
    if let Some(err) = io_error {
        return Err(err).context("reading transaction input");
    }

    Ok((builder.finish(), stats))
}
