//! Transaction feature engineering.
//!
//! Every transaction maps to a fixed four-column vector. Column order is the
//! order a trained model expects and must not change without retraining.

pub mod extractor;

use serde::{Deserialize, Serialize};

pub use extractor::{extract_features, LARGE_AMOUNT_THRESHOLD};

/// Number of columns in a feature row.
pub const FEATURE_COUNT: usize = 4;

/// Column names, in row order.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = ["amount", "hour", "is_large_amount", "tx_count"];

/// Model input derived from one transaction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub amount: f64,
    /// Hour of day, 0-23.
    pub hour: u32,
    /// 1 when the amount is above [`LARGE_AMOUNT_THRESHOLD`], else 0.
    pub is_large_amount: u8,
    /// Transactions in the same batch sharing this wallet, itself included.
    pub tx_count: u32,
}

impl FeatureVector {
    pub fn to_row(&self) -> [f64; FEATURE_COUNT] {
        [
            self.amount,
            f64::from(self.hour),
            f64::from(self.is_large_amount),
            f64::from(self.tx_count),
        ]
    }
}
