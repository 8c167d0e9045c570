use serde::{Deserialize, Serialize};

/// Body returned for every accepted alert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertAck {
    pub status: String,
}

impl AlertAck {
    pub fn sent() -> Self {
        Self {
            status: "alert sent".to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub alerts_received: u64,
}
