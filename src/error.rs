//! Error taxonomy of the scoring pipeline.
//!
//! Extraction and scoring failures are fatal for a batch and propagate to the
//! caller. Delivery failures never propagate: the dispatcher folds them into a
//! per-alert outcome.

/// A transaction in the batch could not be turned into a feature vector.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("failed to extract features for transaction '{transaction_id}' (position {position}): {reason}")]
pub struct ExtractionError {
    pub transaction_id: String,
    pub position: usize,
    pub reason: String,
}

/// The model could not score a feature vector.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScoringError {
    #[error("feature count mismatch: model expects {expected}, got {actual}")]
    FeatureCountMismatch { expected: usize, actual: usize },

    #[error("feature '{feature}' is not a finite number")]
    NonFiniteFeature { feature: usize },

    #[error("model is not usable: {0}")]
    InvalidModel(String),
}

/// Fatal failure of a `detect` call. No partial result accompanies it.
#[derive(Debug, thiserror::Error)]
pub enum DetectionError {
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error("scoring failed for transaction '{transaction_id}': {source}")]
    Scoring {
        transaction_id: String,
        #[source]
        source: ScoringError,
    },
}

/// Why a single alert was not acknowledged.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DeliveryError {
    /// The receiver answered with a non-success status.
    #[error("receiver rejected alert with status {status}: {body}")]
    Rejected { status: u16, body: String },

    /// The receiver could not be reached (connect failure, DNS, timeout).
    #[error("receiver unreachable: {0}")]
    Unreachable(String),
}
