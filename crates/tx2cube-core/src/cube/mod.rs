// Group-wise aggregation into the fixed BI cube
//
// Six dimensions, five measures, not configurable at runtime. Group keys
// hold dictionary codes for the categorical dimensions so 24M rows hash
// integers, not strings.

mod to_arrow;

pub use to_arrow::build_batch;

use std::collections::{HashMap, HashSet};

use crate::categorical::Dictionary;
use crate::record::CleanTransaction;

/// The fixed dimension tuple a cube row is keyed by.
///
/// `merchant_state` and `use_chip` are codes into the cube's
/// dictionaries; null dimension values group together like any other
/// value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupKey {
    pub year: i16,
    pub month: i8,
    pub merchant_state: Option<u32>,
    pub use_chip: Option<u32>,
    pub mcc: Option<i16>,
    pub is_fraud: bool,
}

#[derive(Debug, Default)]
struct Measures {
    transactions: u32,
    amount_sum: f64,
    amount_count: u32,
    error_count: u32,
    users: HashSet<i32>,
}

impl Measures {
    fn observe(&mut self, tx: &CleanTransaction) {
        self.transactions += 1;
        if let Some(amount) = tx.amount {
            self.amount_sum += amount;
            self.amount_count += 1;
        }
        if tx.has_error {
            self.error_count += 1;
        }
        self.users.insert(tx.user);
    }
}

/// One finalized cube row.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupRow {
    pub key: GroupKey,
    pub total_transactions: u32,
    pub total_amount: f64,
    /// Rows whose amount parsed; the mean denominator.
    pub amount_count: u32,
    pub error_count: u32,
    pub unique_users: u32,
}

impl GroupRow {
    /// Mean over parsed amounts; `None` when no amount in the group
    /// parsed.
    pub fn avg_amount(&self) -> Option<f64> {
        (self.amount_count > 0).then(|| self.total_amount / f64::from(self.amount_count))
    }
}

/// Accumulates transactions into per-group measures.
#[derive(Debug, Default)]
pub struct CubeBuilder {
    states: Dictionary,
    chips: Dictionary,
    groups: HashMap<GroupKey, Measures>,
}

impl CubeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, tx: &CleanTransaction) {
        let key = GroupKey {
            year: tx.year,
            month: tx.month,
            merchant_state: tx.merchant_state.as_deref().map(|s| self.states.intern(s)),
            use_chip: tx.use_chip.as_deref().map(|s| self.chips.intern(s)),
            mcc: tx.mcc,
            is_fraud: tx.is_fraud,
        };
        self.groups.entry(key).or_default().observe(tx);
    }

    pub fn finish(self) -> Cube {
        let rows = self
            .groups
            .into_iter()
            .map(|(key, m)| GroupRow {
                key,
                total_transactions: m.transactions,
                total_amount: m.amount_sum,
                amount_count: m.amount_count,
                error_count: m.error_count,
                unique_users: u32::try_from(m.users.len()).expect("user count overflow"),
            })
            .collect();

        Cube {
            states: self.states,
            chips: self.chips,
            rows,
        }
    }
}

/// The fully aggregated cube: one row per unique dimension tuple.
///
/// Row order carries no meaning; downstream consumers sort explicitly if
/// order matters.
#[derive(Debug)]
pub struct Cube {
    states: Dictionary,
    chips: Dictionary,
    rows: Vec<GroupRow>,
}

impl Cube {
    pub fn rows(&self) -> &[GroupRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Resolve a row's merchant-state dimension back to its string value.
    pub fn state_of(&self, row: &GroupRow) -> Option<&str> {
        row.key.merchant_state.map(|code| self.states.resolve(code))
    }

    /// Resolve a row's chip-use dimension back to its string value.
    pub fn chip_of(&self, row: &GroupRow) -> Option<&str> {
        row.key.use_chip.map(|code| self.chips.resolve(code))
    }
}
