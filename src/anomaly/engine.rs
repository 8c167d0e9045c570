use std::sync::Arc;

use crate::error::DetectionError;
use crate::features::extract_features;
use crate::ingest::Transaction;
use crate::model::ScoringModel;

use super::types::ScoreResult;

/// Scores a batch of transactions against an injected, read-only model.
#[derive(Clone)]
pub struct AnomalyDetector {
    model: Arc<dyn ScoringModel>,
}

impl AnomalyDetector {
    pub fn new(model: Arc<dyn ScoringModel>) -> Self {
        Self { model }
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    /// Annotate every transaction with `fraud_score` and `is_anomaly`.
    ///
    /// Output has the input's length and order. Each transaction is scored
    /// exactly once. Any extraction or scoring failure aborts the whole batch.
    pub fn detect(&self, transactions: &[Transaction]) -> Result<Vec<ScoreResult>, DetectionError> {
        let features = extract_features(transactions)?;

        let mut results = Vec::with_capacity(transactions.len());
        for (tx, vector) in transactions.iter().zip(features) {
            let row = vector.to_row();
            let scoring_error = |source| DetectionError::Scoring {
                transaction_id: tx.transaction_id.clone(),
                source,
            };
            let fraud_score = self.model.score(&row).map_err(scoring_error)?;
            let is_anomaly = self.model.classify(&row).map_err(scoring_error)?;

            results.push(ScoreResult {
                transaction: tx.clone(),
                features: vector,
                fraud_score,
                is_anomaly,
            });
        }

        let anomalies = results.iter().filter(|r| r.is_anomaly).count();
        tracing::info!(
            model = self.model.name(),
            transactions = results.len(),
            anomalies,
            "Batch scored"
        );
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anomaly::types::filter_anomalies;
    use crate::error::ScoringError;
    use crate::ingest::TransactionType;
    use crate::model::{ForestParams, IsolationForest};
    use bigdecimal::BigDecimal;
    use std::str::FromStr;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Flags anything above a fixed amount; score is the negated amount.
    struct AmountModel {
        limit: f64,
        calls: AtomicUsize,
    }

    impl AmountModel {
        fn new(limit: f64) -> Self {
            Self {
                limit,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl ScoringModel for AmountModel {
        fn score(&self, row: &[f64]) -> Result<f64, ScoringError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(-row[0] / 1000.0)
        }

        fn classify(&self, row: &[f64]) -> Result<bool, ScoringError> {
            Ok(row[0] > self.limit)
        }
    }

    /// Model trained on a different feature layout.
    struct ThreeFeatureModel;

    impl ScoringModel for ThreeFeatureModel {
        fn score(&self, row: &[f64]) -> Result<f64, ScoringError> {
            Err(ScoringError::FeatureCountMismatch {
                expected: 3,
                actual: row.len(),
            })
        }

        fn classify(&self, row: &[f64]) -> Result<bool, ScoringError> {
            self.score(row).map(|s| s < 0.0)
        }
    }

    fn tx(id: &str, wallet: &str, timestamp: &str, amount: &str) -> Transaction {
        Transaction {
            transaction_id: id.to_string(),
            wallet_id: wallet.to_string(),
            timestamp: timestamp.to_string(),
            amount: BigDecimal::from_str(amount).unwrap(),
            tx_type: TransactionType::Transfer,
            ip_address: "192.168.0.10".to_string(),
        }
    }

    fn batch() -> Vec<Transaction> {
        vec![
            tx("tx-a", "w1", "2024-03-01 12:05:00", "100"),
            tx("tx-b", "w1", "2024-03-01 12:20:00", "4000"),
            tx("tx-c", "w1", "2024-03-01 12:55:00", "50"),
        ]
    }

    #[test]
    fn test_detect_preserves_transactions_and_order() {
        let model = Arc::new(AmountModel::new(3000.0));
        let detector = AnomalyDetector::new(model.clone());
        let input = batch();

        let results = detector.detect(&input).unwrap();
        assert_eq!(results.len(), 3);
        for (r, original) in results.iter().zip(&input) {
            assert_eq!(&r.transaction, original);
        }
        assert_eq!(model.calls.load(Ordering::SeqCst), 3);

        let anomalies = filter_anomalies(&results);
        assert_eq!(anomalies.len(), 1);
        assert_eq!(anomalies[0].transaction_id(), "tx-b");
        assert_eq!(anomalies[0].fraud_score, -4.0);
        assert_eq!(anomalies[0].features.tx_count, 3);
        assert_eq!(anomalies[0].features.is_large_amount, 1);
    }

    #[test]
    fn test_detect_is_idempotent_for_a_loaded_model() {
        let rows: Vec<[f64; 4]> = (0..100)
            .map(|i| [20.0 + (i * 37 % 400) as f64, (i % 24) as f64, 0.0, 1.0 + (i % 4) as f64])
            .collect();
        let forest = IsolationForest::fit(&rows, &ForestParams::default()).unwrap();
        let detector = AnomalyDetector::new(Arc::new(forest));

        let mut input = batch();
        input.push(tx("tx-d", "w2", "2024-03-01 03:00:00", "4999.99"));

        let first = detector.detect(&input).unwrap();
        let second = detector.detect(&input).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_extraction_error_aborts_batch() {
        let detector = AnomalyDetector::new(Arc::new(AmountModel::new(3000.0)));
        let mut input = batch();
        input[2].timestamp = "not-a-time".to_string();

        match detector.detect(&input) {
            Err(DetectionError::Extraction(e)) => assert_eq!(e.transaction_id, "tx-c"),
            other => panic!("expected extraction error, got {:?}", other),
        }
    }

    #[test]
    fn test_scoring_error_names_transaction() {
        let detector = AnomalyDetector::new(Arc::new(ThreeFeatureModel));

        match detector.detect(&batch()) {
            Err(DetectionError::Scoring {
                transaction_id,
                source,
            }) => {
                assert_eq!(transaction_id, "tx-a");
                assert_eq!(
                    source,
                    ScoringError::FeatureCountMismatch {
                        expected: 3,
                        actual: 4
                    }
                );
            }
            other => panic!("expected scoring error, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_batch_scores_nothing() {
        let detector = AnomalyDetector::new(Arc::new(AmountModel::new(0.0)));
        assert!(detector.detect(&[]).unwrap().is_empty());
    }
}
