//! Delivers one alert per anomaly.
//!
//! Every alert gets its own attempt. A rejected or unreachable delivery is
//! recorded in the report and the loop moves on; nothing is retried here.

use std::sync::Arc;
use std::time::Instant;

use crate::anomaly::ScoreResult;

use super::sink::AlertSink;
use super::types::{AlertMessage, DeliveryStatus, DispatchOutcome, DispatchReport};

pub struct AlertDispatcher {
    sink: Arc<dyn AlertSink>,
}

impl AlertDispatcher {
    pub fn new(sink: Arc<dyn AlertSink>) -> Self {
        Self { sink }
    }

    /// Build an alert from each anomalous result and deliver them in input order.
    pub async fn dispatch(&self, anomalies: &[ScoreResult]) -> DispatchReport {
        let alerts: Vec<AlertMessage> = anomalies.iter().map(AlertMessage::from).collect();
        self.dispatch_alerts(&alerts).await
    }

    /// Deliver prebuilt alerts, e.g. the failures of an earlier report.
    pub async fn dispatch_alerts(&self, alerts: &[AlertMessage]) -> DispatchReport {
        let mut outcomes = Vec::with_capacity(alerts.len());

        for alert in alerts {
            let start = Instant::now();
            let status = DeliveryStatus::from(self.sink.deliver(alert).await);
            let duration_ms = start.elapsed().as_millis() as u64;

            match &status {
                DeliveryStatus::Acknowledged { .. } => tracing::info!(
                    transaction_id = %alert.transaction_id,
                    wallet_id = %alert.wallet_id,
                    channel = self.sink.channel_name(),
                    duration_ms,
                    "Alert sent"
                ),
                DeliveryStatus::Rejected { status, body } => tracing::warn!(
                    transaction_id = %alert.transaction_id,
                    channel = self.sink.channel_name(),
                    status,
                    body = %body,
                    duration_ms,
                    "Alert rejected by receiver"
                ),
                DeliveryStatus::Unreachable { reason } => tracing::warn!(
                    transaction_id = %alert.transaction_id,
                    channel = self.sink.channel_name(),
                    error = %reason,
                    duration_ms,
                    "Alert receiver unreachable"
                ),
            }

            outcomes.push(DispatchOutcome {
                alert: alert.clone(),
                status,
                duration_ms,
            });
        }

        let report = DispatchReport { outcomes };
        if report.attempted() > 0 {
            tracing::info!(
                attempted = report.attempted(),
                acknowledged = report.acknowledged(),
                rejected = report.rejected(),
                unreachable = report.unreachable(),
                "Alert dispatch finished"
            );
        }
        report
    }
}
