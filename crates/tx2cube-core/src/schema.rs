// Fixed Arrow schema for the BI cube
//
// The visualization layer depends on exact column names and types, so
// this schema is stable across runs: six dimension columns followed by
// five measure columns. Dimension names keep the source file's casing.

use arrow::datatypes::{DataType, Field, Schema};
use std::sync::{Arc, OnceLock};

/// Cube column names, in schema order.
pub mod column {
    pub const YEAR: &str = "Year";
    pub const MONTH: &str = "Month";
    pub const MERCHANT_STATE: &str = "Merchant State";
    pub const USE_CHIP: &str = "Use Chip";
    pub const MCC: &str = "MCC";
    pub const IS_FRAUD: &str = "is_fraud";
    pub const TOTAL_TRANSACTIONS: &str = "total_transactions";
    pub const TOTAL_AMOUNT: &str = "total_amount";
    pub const AVG_AMOUNT: &str = "avg_amount";
    pub const ERROR_COUNT: &str = "error_count";
    pub const UNIQUE_USERS: &str = "unique_users";
}

/// Returns the Arrow schema for the aggregated cube.
pub fn cube_schema() -> Schema {
    cube_schema_arc().as_ref().clone()
}

/// Returns a cached `Arc<Schema>` for the cube schema.
pub fn cube_schema_arc() -> Arc<Schema> {
    static SCHEMA: OnceLock<Arc<Schema>> = OnceLock::new();
    Arc::clone(SCHEMA.get_or_init(|| Arc::new(build_schema())))
}

fn dictionary_utf8() -> DataType {
    DataType::Dictionary(Box::new(DataType::Int32), Box::new(DataType::Utf8))
}

fn build_schema() -> Schema {
    let fields = vec![
        // ============ Dimensions ============
        Field::new(column::YEAR, DataType::Int16, false),
        Field::new(column::MONTH, DataType::Int8, false),
        Field::new(column::MERCHANT_STATE, dictionary_utf8(), true),
        Field::new(column::USE_CHIP, dictionary_utf8(), true),
        Field::new(column::MCC, DataType::Int16, true),
        Field::new(column::IS_FRAUD, DataType::Boolean, false),
        // ============ Measures ============
        Field::new(column::TOTAL_TRANSACTIONS, DataType::UInt32, false),
        Field::new(column::TOTAL_AMOUNT, DataType::Float64, false),
        Field::new(column::AVG_AMOUNT, DataType::Float64, true),
        Field::new(column::ERROR_COUNT, DataType::UInt32, false),
        Field::new(column::UNIQUE_USERS, DataType::UInt32, false),
    ];

    Schema::new(fields)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_shape() {
        let schema = cube_schema();
        assert_eq!(schema.fields().len(), 11);

        assert_eq!(schema.field(0).name(), column::YEAR);
        assert_eq!(schema.field(1).name(), column::MONTH);
        assert_eq!(schema.field(2).name(), column::MERCHANT_STATE);
        assert_eq!(schema.field(3).name(), column::USE_CHIP);
        assert_eq!(schema.field(4).name(), column::MCC);
        assert_eq!(schema.field(5).name(), column::IS_FRAUD);
        assert_eq!(schema.field(6).name(), column::TOTAL_TRANSACTIONS);
        assert_eq!(schema.field(7).name(), column::TOTAL_AMOUNT);
        assert_eq!(schema.field(8).name(), column::AVG_AMOUNT);
        assert_eq!(schema.field(9).name(), column::ERROR_COUNT);
        assert_eq!(schema.field(10).name(), column::UNIQUE_USERS);
    }

    #[test]
    fn test_dimension_nullability() {
        let schema = cube_schema();
        assert!(!schema.field(0).is_nullable());
        assert!(schema.field(2).is_nullable());
        assert!(schema.field(3).is_nullable());
        assert!(schema.field(4).is_nullable());
        assert!(!schema.field(5).is_nullable());
        assert!(schema.field(8).is_nullable());
    }

    #[test]
    fn test_categorical_dimensions_are_dictionary_encoded() {
        let schema = cube_schema();
        for idx in [2, 3] {
            match schema.field(idx).data_type() {
                DataType::Dictionary(key, value) => {
                    assert_eq!(**key, DataType::Int32);
                    assert_eq!(**value, DataType::Utf8);
                }
                other => panic!("expected dictionary column, got {other:?}"),
            }
        }
    }
}
