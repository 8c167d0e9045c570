use serde::{Deserialize, Serialize};

use crate::anomaly::ScoreResult;
use crate::error::DeliveryError;

/// Wire payload sent to the alert receiver. Exactly these three fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertMessage {
    pub wallet_id: String,
    pub transaction_id: String,
    pub fraud_score: f64,
}

impl From<&ScoreResult> for AlertMessage {
    fn from(result: &ScoreResult) -> Self {
        Self {
            wallet_id: result.transaction.wallet_id.clone(),
            transaction_id: result.transaction.transaction_id.clone(),
            fraud_score: result.fraud_score,
        }
    }
}

/// Receiver's answer to an accepted alert.
#[derive(Debug, Clone, PartialEq)]
pub struct Acknowledgement {
    pub status: u16,
    pub body: String,
}

/// Classified result of one delivery attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum DeliveryStatus {
    Acknowledged { status: u16, body: String },
    Rejected { status: u16, body: String },
    Unreachable { reason: String },
}

impl DeliveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Acknowledged { .. } => "acknowledged",
            Self::Rejected { .. } => "rejected",
            Self::Unreachable { .. } => "unreachable",
        }
    }

    pub fn is_acknowledged(&self) -> bool {
        matches!(self, Self::Acknowledged { .. })
    }
}

impl From<Result<Acknowledgement, DeliveryError>> for DeliveryStatus {
    fn from(result: Result<Acknowledgement, DeliveryError>) -> Self {
        match result {
            Ok(ack) => Self::Acknowledged {
                status: ack.status,
                body: ack.body,
            },
            Err(DeliveryError::Rejected { status, body }) => Self::Rejected { status, body },
            Err(DeliveryError::Unreachable(reason)) => Self::Unreachable { reason },
        }
    }
}

/// Outcome of delivering one alert.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchOutcome {
    pub alert: AlertMessage,
    pub status: DeliveryStatus,
    pub duration_ms: u64,
}

/// Outcomes of one dispatch call, in the order alerts were attempted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DispatchReport {
    pub outcomes: Vec<DispatchOutcome>,
}

impl DispatchReport {
    pub fn attempted(&self) -> usize {
        self.outcomes.len()
    }

    pub fn acknowledged(&self) -> usize {
        self.count(|s| matches!(s, DeliveryStatus::Acknowledged { .. }))
    }

    pub fn rejected(&self) -> usize {
        self.count(|s| matches!(s, DeliveryStatus::Rejected { .. }))
    }

    pub fn unreachable(&self) -> usize {
        self.count(|s| matches!(s, DeliveryStatus::Unreachable { .. }))
    }

    pub fn all_acknowledged(&self) -> bool {
        self.outcomes.iter().all(|o| o.status.is_acknowledged())
    }

    /// Alerts that were not acknowledged, for a caller-side retry.
    pub fn failed_alerts(&self) -> Vec<AlertMessage> {
        self.outcomes
            .iter()
            .filter(|o| !o.status.is_acknowledged())
            .map(|o| o.alert.clone())
            .collect()
    }

    fn count(&self, pred: impl Fn(&DeliveryStatus) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(&o.status)).count()
    }
}
