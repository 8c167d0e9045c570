pub mod engine;
pub mod types;

pub use engine::AnomalyDetector;
pub use types::{filter_anomalies, ScoreResult};
