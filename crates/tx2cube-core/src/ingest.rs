// Streaming CSV scan with a fixed projection
//
// Malformed rows are dropped rather than failing the run; the scanner
// keeps run-level counters so the drop volume is reported once at the
// end instead of per-row.

use std::io::Read;

use crate::record::{CleanTransaction, RawTransaction};

/// Counters accumulated over one ingestion pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IngestStats {
    /// Rows seen in the file, including ones later dropped.
    pub rows_read: u64,
    /// Rows dropped for CSV structure or deserialization failures.
    pub malformed: u64,
    /// Rows dropped because Year/Month/Day form no real calendar date.
    pub invalid_dates: u64,
    /// Surviving rows whose amount failed currency parsing (amount null).
    pub null_amounts: u64,
}

impl IngestStats {
    /// Rows that survived ingestion and contribute to the cube.
    pub fn surviving(&self) -> u64 {
        self.rows_read - self.malformed - self.invalid_dates
    }
}

/// Iterator over normalized transactions from a CSV source.
///
/// Structural and deserialization errors are skipped silently (counted in
/// [`IngestStats`]); an I/O error on the underlying reader terminates the
/// scan and is surfaced by [`CsvScanner::finish`].
pub struct CsvScanner<R: Read> {
    records: csv::DeserializeRecordsIntoIter<R, RawTransaction>,
    stats: IngestStats,
    io_error: Option<csv::Error>,
}

impl<R: Read> CsvScanner<R> {
    pub fn new(input: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(input);
        Self {
            records: reader.into_deserialize(),
            stats: IngestStats::default(),
            io_error: None,
        }
    }

    pub fn stats(&self) -> IngestStats {
        self.stats
    }

    /// Consume the scanner, returning the final counters and any I/O
    /// error that terminated the scan early.
    pub fn finish(self) -> (IngestStats, Option<csv::Error>) {
        (self.stats, self.io_error)
    }
}

impl<R: Read> Iterator for CsvScanner<R> {
    type Item = CleanTransaction;

    fn next(&mut self) -> Option<CleanTransaction> {
        if self.io_error.is_some() {
            return None;
        }
        loop {
            match self.records.next()? {
                Ok(raw) => {
                    self.stats.rows_read += 1;
                    match raw.normalize() {
                        Some(tx) => {
                            if tx.amount.is_none() {
                                self.stats.null_amounts += 1;
                            }
                            return Some(tx);
                        }
                        None => {
                            self.stats.invalid_dates += 1;
                        }
                    }
                }
                Err(err) if matches!(err.kind(), csv::ErrorKind::Io(_)) => {
                    // A failing reader would yield errors forever; stop
                    // and let the caller surface it.
                    self.io_error = Some(err);
                    return None;
                }
                Err(_) => {
                    self.stats.rows_read += 1;
                    self.stats.malformed += 1;
                }
            }
        }
    }
}
