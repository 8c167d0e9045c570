use crate::features::FeatureVector;
use crate::ingest::Transaction;

/// A transaction annotated by the scoring model.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreResult {
    pub transaction: Transaction,
    pub features: FeatureVector,
    /// More negative means more anomalous.
    pub fraud_score: f64,
    pub is_anomaly: bool,
}

impl ScoreResult {
    pub fn transaction_id(&self) -> &str {
        &self.transaction.transaction_id
    }

    pub fn wallet_id(&self) -> &str {
        &self.transaction.wallet_id
    }
}

/// Keep only the results the model classified as anomalous, in input order.
pub fn filter_anomalies(results: &[ScoreResult]) -> Vec<ScoreResult> {
    results.iter().filter(|r| r.is_anomaly).cloned().collect()
}
