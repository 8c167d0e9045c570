use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use bigdecimal::BigDecimal;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use txguard::alert::{AlertDispatcher, AlertMessage, AlertSink, DeliveryStatus, HttpAlertSink};
use txguard::anomaly::AnomalyDetector;
use txguard::error::ScoringError;
use txguard::ingest::{Transaction, TransactionType};
use txguard::model::ScoringModel;
use txguard::pipeline::DetectionPipeline;

/// Anomalous iff the amount column exceeds 3000.
struct ThresholdModel;

impl ScoringModel for ThresholdModel {
    fn score(&self, row: &[f64]) -> Result<f64, ScoringError> {
        Ok(if row[0] > 3000.0 { -0.2 } else { 0.1 })
    }

    fn classify(&self, row: &[f64]) -> Result<bool, ScoringError> {
        Ok(row[0] > 3000.0)
    }
}

async fn start_receiver() -> (HttpAlertSink, CancellationToken, tokio::task::JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let shutdown = CancellationToken::new();

    let token = shutdown.clone();
    let handle = tokio::spawn(async move {
        txguard::api::serve_on(listener, token).await.unwrap();
    });

    let sink = HttpAlertSink::new("127.0.0.1", port, Duration::from_secs(5)).unwrap();
    (sink, shutdown, handle)
}

fn tx(id: &str, timestamp: &str, amount: &str) -> Transaction {
    Transaction {
        transaction_id: id.to_string(),
        wallet_id: "w1".to_string(),
        timestamp: timestamp.to_string(),
        amount: BigDecimal::from_str(amount).unwrap(),
        tx_type: TransactionType::Redeem,
        ip_address: "203.0.113.9".to_string(),
    }
}

#[tokio::test]
async fn test_sample_alert_is_acknowledged() {
    let (sink, shutdown, handle) = start_receiver().await;

    let alert = AlertMessage {
        wallet_id: "1234-abcd".to_string(),
        transaction_id: "tx-5678".to_string(),
        fraud_score: -0.25,
    };
    let status = DeliveryStatus::from(sink.deliver(&alert).await);

    match status {
        DeliveryStatus::Acknowledged { status, body } => {
            assert_eq!(status, 200);
            let json: serde_json::Value = serde_json::from_str(&body).unwrap();
            assert_eq!(json["status"], "alert sent");
        }
        other => panic!("expected acknowledgement, got {:?}", other),
    }

    shutdown.cancel();
    handle.await.unwrap();
}

#[tokio::test]
async fn test_pipeline_alerts_real_receiver() {
    let (sink, shutdown, handle) = start_receiver().await;

    let pipeline = DetectionPipeline::new(
        AnomalyDetector::new(Arc::new(ThresholdModel)),
        AlertDispatcher::new(Arc::new(sink)),
    );
    let batch = vec![
        tx("tx-1", "2024-07-01 18:00:05", "100"),
        tx("tx-2", "2024-07-01 18:20:00", "4000"),
        tx("tx-3", "2024-07-01 18:45:10", "50"),
    ];

    let result = pipeline.run(&batch).await.unwrap();

    assert_eq!(result.anomalies.len(), 1);
    assert_eq!(result.report.attempted(), 1);
    assert_eq!(result.report.acknowledged(), 1);
    let outcome = &result.report.outcomes[0];
    assert_eq!(outcome.alert.transaction_id, "tx-2");
    assert_eq!(outcome.alert.wallet_id, "w1");
    assert!((outcome.alert.fraud_score + 0.2).abs() < 1e-12);

    shutdown.cancel();
    handle.await.unwrap();
}

#[tokio::test]
async fn test_stopped_receiver_is_unreachable() {
    let (sink, shutdown, handle) = start_receiver().await;
    shutdown.cancel();
    handle.await.unwrap();

    let pipeline = DetectionPipeline::new(
        AnomalyDetector::new(Arc::new(ThresholdModel)),
        AlertDispatcher::new(Arc::new(sink)),
    );
    let batch = vec![
        tx("tx-1", "2024-07-01 18:00:05", "4500"),
        tx("tx-2", "2024-07-01 18:20:00", "4000"),
    ];

    let result = pipeline.run(&batch).await.unwrap();
    assert_eq!(result.report.attempted(), 2);
    assert_eq!(result.report.unreachable(), 2);
    assert_eq!(result.report.failed_alerts().len(), 2);
}
