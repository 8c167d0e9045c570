pub mod alert;
pub mod anomaly;
pub mod api;
pub mod config;
pub mod error;
pub mod features;
pub mod ingest;
pub mod model;
pub mod pipeline;
pub mod seed;
