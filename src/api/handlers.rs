use axum::extract::State;
use axum::Json;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use crate::alert::AlertMessage;

use super::types::{AlertAck, HealthResponse};
use super::AppState;

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        alerts_received: state.alerts_received.load(Ordering::Relaxed),
    })
}

/// Accept one alert and acknowledge it. Forwarding (email, storage) is not
/// done here; the alert is only logged.
pub async fn receive_alert(
    State(state): State<Arc<AppState>>,
    Json(alert): Json<AlertMessage>,
) -> Json<AlertAck> {
    state.alerts_received.fetch_add(1, Ordering::Relaxed);

    tracing::info!(
        wallet_id = %alert.wallet_id,
        transaction_id = %alert.transaction_id,
        fraud_score = alert.fraud_score,
        "ALERT: suspicious transaction received"
    );

    Json(AlertAck::sent())
}
