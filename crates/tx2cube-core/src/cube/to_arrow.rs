// Convert aggregated cube rows to Arrow RecordBatches
//
// One builder per column. The sink builds batches per chunk of rows so
// the streaming path never holds more than one chunk of Arrow data at a
// time.

use anyhow::{Context, Result};
use arrow::array::{
    ArrayRef, BooleanBuilder, Float64Builder, Int16Builder, Int8Builder, RecordBatch,
    StringDictionaryBuilder, UInt32Builder,
};
use arrow::datatypes::Int32Type;
use std::sync::Arc;

use crate::cube::{Cube, GroupRow};
use crate::schema::cube_schema_arc;

struct CubeBatchBuilder {
    year: Int16Builder,
    month: Int8Builder,
    merchant_state: StringDictionaryBuilder<Int32Type>,
    use_chip: StringDictionaryBuilder<Int32Type>,
    mcc: Int16Builder,
    is_fraud: BooleanBuilder,
    total_transactions: UInt32Builder,
    total_amount: Float64Builder,
    avg_amount: Float64Builder,
    error_count: UInt32Builder,
    unique_users: UInt32Builder,
}

impl CubeBatchBuilder {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            year: Int16Builder::with_capacity(capacity),
            month: Int8Builder::with_capacity(capacity),
            merchant_state: StringDictionaryBuilder::new(),
            use_chip: StringDictionaryBuilder::new(),
            mcc: Int16Builder::with_capacity(capacity),
            is_fraud: BooleanBuilder::with_capacity(capacity),
            total_transactions: UInt32Builder::with_capacity(capacity),
            total_amount: Float64Builder::with_capacity(capacity),
            avg_amount: Float64Builder::with_capacity(capacity),
            error_count: UInt32Builder::with_capacity(capacity),
            unique_users: UInt32Builder::with_capacity(capacity),
        }
    }

    fn append(&mut self, cube: &Cube, row: &GroupRow) {
        self.year.append_value(row.key.year);
        self.month.append_value(row.key.month);
        match cube.state_of(row) {
            Some(state) => self.merchant_state.append_value(state),
            None => self.merchant_state.append_null(),
        }
        match cube.chip_of(row) {
            Some(chip) => self.use_chip.append_value(chip),
            None => self.use_chip.append_null(),
        }
        self.mcc.append_option(row.key.mcc);
        self.is_fraud.append_value(row.key.is_fraud);
        self.total_transactions.append_value(row.total_transactions);
        self.total_amount.append_value(row.total_amount);
        self.avg_amount.append_option(row.avg_amount());
        self.error_count.append_value(row.error_count);
        self.unique_users.append_value(row.unique_users);
    }

    fn finish(mut self) -> Result<RecordBatch> {
        let columns: Vec<ArrayRef> = vec![
            Arc::new(self.year.finish()),
            Arc::new(self.month.finish()),
            Arc::new(self.merchant_state.finish()),
            Arc::new(self.use_chip.finish()),
            Arc::new(self.mcc.finish()),
            Arc::new(self.is_fraud.finish()),
            Arc::new(self.total_transactions.finish()),
            Arc::new(self.total_amount.finish()),
            Arc::new(self.avg_amount.finish()),
            Arc::new(self.error_count.finish()),
            Arc::new(self.unique_users.finish()),
        ];

        RecordBatch::try_new(cube_schema_arc(), columns)
            .context("assembling cube record batch")
    }
}

/// Build one RecordBatch from a slice of cube rows.
pub fn build_batch(cube: &Cube, rows: &[GroupRow]) -> Result<RecordBatch> {
    let mut builder = CubeBatchBuilder::with_capacity(rows.len());
    for row in rows {
        builder.append(cube, row);
    }
    builder.finish()
}
