//! Anomaly-scoring models.
//!
//! The detector only sees [`ScoringModel`]. The isolation forest is the model
//! this crate trains and ships, but any implementation can be injected.

pub mod isolation_forest;
pub mod loader;

use crate::error::ScoringError;

pub use isolation_forest::{ForestParams, IsolationForest};
pub use loader::{load_model, save_model};

/// Read-only scoring capability of a trained model.
///
/// `score` is negative-is-anomalous and only reported; `classify` decides
/// anomaly membership. Implementations must agree with themselves for a given
/// trained instance and must not mutate while scoring.
pub trait ScoringModel: Send + Sync {
    fn score(&self, row: &[f64]) -> Result<f64, ScoringError>;

    fn classify(&self, row: &[f64]) -> Result<bool, ScoringError>;

    fn name(&self) -> &str {
        "model"
    }
}

/// Errors from fitting, saving, or loading a model artifact.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("invalid training parameters: {0}")]
    InvalidParams(String),

    #[error("training data rejected: {0}")]
    InvalidTrainingData(String),

    #[error("model artifact is invalid: {0}")]
    InvalidArtifact(String),

    #[error("failed to access model artifact '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode model artifact: {0}")]
    Format(#[from] serde_json::Error),
}
