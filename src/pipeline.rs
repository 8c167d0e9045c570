use crate::alert::{AlertDispatcher, DispatchReport};
use crate::anomaly::{filter_anomalies, AnomalyDetector, ScoreResult};
use crate::error::DetectionError;
use crate::ingest::Transaction;

/// Result of running the detection pipeline on one batch.
#[derive(Debug, Default)]
pub struct PipelineResult {
    /// Every transaction with its score, in input order.
    pub results: Vec<ScoreResult>,
    pub anomalies: Vec<ScoreResult>,
    pub report: DispatchReport,
}

/// Orchestrates one batch end to end:
/// 1. Feature extraction and scoring
/// 2. Anomaly filtering
/// 3. Alert dispatch, one per anomaly
pub struct DetectionPipeline {
    detector: AnomalyDetector,
    dispatcher: AlertDispatcher,
}

impl DetectionPipeline {
    pub fn new(detector: AnomalyDetector, dispatcher: AlertDispatcher) -> Self {
        Self {
            detector,
            dispatcher,
        }
    }

    /// Score the batch and alert on its anomalies.
    ///
    /// Detection errors abort before any alert is sent. Delivery failures do
    /// not; they are only recorded in the returned report.
    pub async fn run(&self, batch: &[Transaction]) -> Result<PipelineResult, DetectionError> {
        if batch.is_empty() {
            return Ok(PipelineResult::default());
        }

        let results = self.detector.detect(batch)?;
        let anomalies = filter_anomalies(&results);

        for anomaly in &anomalies {
            tracing::warn!(
                transaction_id = %anomaly.transaction_id(),
                wallet_id = %anomaly.wallet_id(),
                fraud_score = anomaly.fraud_score,
                "ANOMALY DETECTED"
            );
        }

        let report = self.dispatcher.dispatch(&anomalies).await;

        tracing::info!(
            transactions = results.len(),
            anomalies = anomalies.len(),
            alerts_acknowledged = report.acknowledged(),
            "Batch processed"
        );

        Ok(PipelineResult {
            results,
            anomalies,
            report,
        })
    }
}
