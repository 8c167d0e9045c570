//! Alert delivery channels.

use std::time::Duration;

use crate::error::DeliveryError;

use super::types::{Acknowledgement, AlertMessage};

/// Fixed path the receiver accepts alerts on.
pub const ALERT_PATH: &str = "/alert";

/// A channel that delivers one alert and reports how the receiver answered.
#[async_trait::async_trait]
pub trait AlertSink: Send + Sync {
    async fn deliver(&self, alert: &AlertMessage) -> Result<Acknowledgement, DeliveryError>;

    /// Human-readable name for logs (e.g. "http").
    fn channel_name(&self) -> &str;
}

/// Posts alerts as JSON to `http://{host}:{port}/alert`.
#[derive(Debug, Clone)]
pub struct HttpAlertSink {
    endpoint: String,
    timeout: Duration,
    /// Shared client (connection pooling).
    client: reqwest::Client,
}

impl HttpAlertSink {
    pub fn new(host: &str, port: u16, timeout: Duration) -> eyre::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| eyre::eyre!("Failed to build alert HTTP client: {}", e))?;

        Ok(Self {
            endpoint: format!("http://{}:{}{}", host, port, ALERT_PATH),
            timeout,
            client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait::async_trait]
impl AlertSink for HttpAlertSink {
    async fn deliver(&self, alert: &AlertMessage) -> Result<Acknowledgement, DeliveryError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(alert)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    DeliveryError::Unreachable(format!(
                        "timed out after {}ms: {}",
                        self.timeout.as_millis(),
                        e
                    ))
                } else {
                    DeliveryError::Unreachable(e.to_string())
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());

        if !status.is_success() {
            tracing::debug!(
                endpoint = %self.endpoint,
                %status,
                body = %body,
                "alert receiver returned non-2xx status"
            );
            return Err(DeliveryError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        Ok(Acknowledgement {
            status: status.as_u16(),
            body,
        })
    }

    fn channel_name(&self) -> &str {
        "http"
    }
}
