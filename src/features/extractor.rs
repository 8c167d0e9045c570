use std::collections::HashMap;

use bigdecimal::{BigDecimal, ToPrimitive, Zero};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Timelike};

use crate::error::ExtractionError;
use crate::ingest::Transaction;

use super::FeatureVector;

/// Amounts strictly above this are flagged as large.
pub const LARGE_AMOUNT_THRESHOLD: u32 = 3000;

/// Naive layouts accepted when the timestamp carries no offset.
const NAIVE_FORMATS: [&str; 6] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Extract one feature vector per transaction, position-aligned with the batch.
///
/// `tx_count` is the number of transactions in this batch that share the
/// wallet, including the transaction itself. It is not time-windowed.
///
/// Fails on the first transaction whose timestamp or amount is unusable; no
/// partial feature set is returned.
pub fn extract_features(batch: &[Transaction]) -> Result<Vec<FeatureVector>, ExtractionError> {
    let mut per_wallet: HashMap<&str, u32> = HashMap::new();
    for tx in batch {
        *per_wallet.entry(tx.wallet_id.as_str()).or_default() += 1;
    }

    let large = BigDecimal::from(LARGE_AMOUNT_THRESHOLD);
    let mut features = Vec::with_capacity(batch.len());
    for (position, tx) in batch.iter().enumerate() {
        let fail = |reason: String| ExtractionError {
            transaction_id: tx.transaction_id.clone(),
            position,
            reason,
        };

        if tx.amount < BigDecimal::zero() {
            return Err(fail(format!("amount {} is negative", tx.amount)));
        }
        let amount = tx
            .amount
            .to_f64()
            .filter(|a| a.is_finite())
            .ok_or_else(|| fail(format!("amount {} is not representable", tx.amount)))?;

        let hour = hour_of_day(&tx.timestamp).map_err(fail)?;

        features.push(FeatureVector {
            amount,
            hour,
            is_large_amount: u8::from(tx.amount > large),
            tx_count: per_wallet[tx.wallet_id.as_str()],
        });
    }

    tracing::debug!(
        transactions = batch.len(),
        wallets = per_wallet.len(),
        "Features extracted"
    );
    Ok(features)
}

/// Hour-of-day in the timestamp's own encoding. An explicit offset is honoured
/// as written; nothing is converted to UTC.
pub fn hour_of_day(timestamp: &str) -> Result<u32, String> {
    let raw = timestamp.trim();
    if raw.is_empty() {
        return Err("timestamp is empty".to_string());
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.hour());
    }
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Ok(dt.hour());
    }
    for format in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(dt.hour());
        }
    }
    // A bare date is midnight.
    if NaiveDate::parse_from_str(raw, "%Y-%m-%d").is_ok() {
        return Ok(0);
    }

    Err(format!("timestamp '{}' is not a point in time", raw))
}
