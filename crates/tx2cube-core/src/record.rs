// Raw transaction rows and their normalized form
//
// The CSV carries currency-formatted amounts, textual yes/no flags and
// wide integer types. Normalization narrows the numeric columns, cleans
// the amount and derives the boolean flags the cube aggregates over.

use chrono::NaiveDate;
use serde::Deserialize;

/// One row of the transaction CSV, deserialized with the file's exact
/// (punctuated, case-sensitive) header names.
///
/// Integer columns are narrowed at parse time: the year fits 16 bits,
/// month/day/card fit 8, the merchant category code fits 16. Rows whose
/// values fall outside these domains fail deserialization and are dropped
/// by the scanner as malformed.
#[derive(Debug, Deserialize)]
pub struct RawTransaction {
    #[serde(rename = "User")]
    pub user: i32,
    #[serde(rename = "Card")]
    pub card: i8,
    #[serde(rename = "Year")]
    pub year: i16,
    #[serde(rename = "Month")]
    pub month: i8,
    #[serde(rename = "Day")]
    pub day: i8,
    #[serde(rename = "Amount")]
    pub amount: String,
    #[serde(rename = "Use Chip")]
    pub use_chip: Option<String>,
    #[serde(rename = "Merchant City")]
    pub merchant_city: Option<String>,
    #[serde(rename = "Merchant State")]
    pub merchant_state: Option<String>,
    #[serde(rename = "MCC")]
    pub mcc: Option<i16>,
    #[serde(rename = "Errors?")]
    pub errors: Option<String>,
    #[serde(rename = "Is Fraud?")]
    pub is_fraud: Option<String>,
}

/// A normalized transaction ready for aggregation.
#[derive(Debug, Clone)]
pub struct CleanTransaction {
    pub user: i32,
    pub card: i8,
    pub year: i16,
    pub month: i8,
    pub day: i8,
    /// Composite date derived from Year/Month/Day. Rows whose components
    /// do not form a real calendar date never reach this type.
    pub date: NaiveDate,
    /// Cleaned amount; `None` when the currency string did not parse.
    pub amount: Option<f64>,
    pub use_chip: Option<String>,
    pub merchant_city: Option<String>,
    pub merchant_state: Option<String>,
    pub mcc: Option<i16>,
    pub is_fraud: bool,
    pub has_error: bool,
}

impl RawTransaction {
    /// Normalize this row, deriving flags and the composite date.
    ///
    /// Returns `None` when Year/Month/Day do not form a valid calendar
    /// date (e.g. Feb 31); such rows are dropped rather than wrapped.
    pub fn normalize(self) -> Option<CleanTransaction> {
        let date = compose_date(self.year, self.month, self.day)?;

        let is_fraud = matches!(
            self.is_fraud.as_deref(),
            Some(flag) if flag.eq_ignore_ascii_case("yes")
        );
        let has_error = self.errors.as_deref().is_some_and(|e| !e.is_empty());
        let amount = clean_amount(&self.amount);

        Some(CleanTransaction {
            user: self.user,
            card: self.card,
            year: self.year,
            month: self.month,
            day: self.day,
            date,
            amount,
            use_chip: self.use_chip,
            merchant_city: self.merchant_city,
            merchant_state: self.merchant_state,
            mcc: self.mcc,
            is_fraud,
            has_error,
        })
    }
}

/// Strip the currency symbol and grouping separators from an amount
/// string and parse it as a float. Parse failures yield `None`.
pub fn clean_amount(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| *c != '$' && *c != ',')
        .collect();
    cleaned.trim().parse::<f64>().ok()
}

fn compose_date(year: i16, month: i8, day: i8) -> Option<NaiveDate> {
    let month = u32::try_from(month).ok()?;
    let day = u32::try_from(day).ok()?;
    NaiveDate::from_ymd_opt(i32::from(year), month, day)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(amount: &str, is_fraud: Option<&str>, errors: Option<&str>) -> RawTransaction {
        RawTransaction {
            user: 1,
            card: 0,
            year: 2020,
            month: 1,
            day: 15,
            amount: amount.to_string(),
            use_chip: Some("Chip Transaction".to_string()),
            merchant_city: Some("La Verne".to_string()),
            merchant_state: Some("CA".to_string()),
            mcc: Some(5912),
            errors: errors.map(str::to_string),
            is_fraud: is_fraud.map(str::to_string),
        }
    }

    #[test]
    fn test_clean_amount() {
        assert_eq!(clean_amount("$134.09"), Some(134.09));
        assert_eq!(clean_amount("$1,234.50"), Some(1234.5));
        assert_eq!(clean_amount("-$12.00"), Some(-12.0));
        assert_eq!(clean_amount("42"), Some(42.0));
        assert_eq!(clean_amount(""), None);
        assert_eq!(clean_amount("N/A"), None);
    }

    #[test]
    fn test_fraud_flag_case_insensitive() {
        for flag in ["Yes", "yes", "YES"] {
            let tx = raw("$1.00", Some(flag), None).normalize().unwrap();
            assert!(tx.is_fraud, "{flag:?} should flag fraud");
        }
        for flag in [Some("No"), Some("no"), Some(""), None] {
            let tx = raw("$1.00", flag, None).normalize().unwrap();
            assert!(!tx.is_fraud, "{flag:?} should not flag fraud");
        }
    }

    #[test]
    fn test_error_flag_from_presence() {
        let tx = raw("$1.00", None, Some("Bad PIN")).normalize().unwrap();
        assert!(tx.has_error);

        let tx = raw("$1.00", None, None).normalize().unwrap();
        assert!(!tx.has_error);
    }

    #[test]
    fn test_invalid_date_fails_row() {
        let mut bad = raw("$1.00", None, None);
        bad.month = 2;
        bad.day = 31;
        assert!(bad.normalize().is_none());

        let mut negative = raw("$1.00", None, None);
        negative.month = -1;
        assert!(negative.normalize().is_none());
    }

    #[test]
    fn test_unparseable_amount_is_null_not_fatal() {
        let tx = raw("garbage", None, None).normalize().unwrap();
        assert_eq!(tx.amount, None);
    }

    #[test]
    fn test_composite_date() {
        let tx = raw("$1.00", None, None).normalize().unwrap();
        assert_eq!(tx.date, NaiveDate::from_ymd_opt(2020, 1, 15).unwrap());
    }
}
