use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::model::ForestParams;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub alert: AlertConfig,
    #[serde(default)]
    pub receiver: ReceiverConfig,
    #[serde(default)]
    pub generator: GeneratorConfig,
}

// ============================================================
// Data Paths
// ============================================================

#[derive(Debug, Deserialize, Clone)]
pub struct DataConfig {
    #[serde(default = "default_transactions_path")]
    pub transactions_path: PathBuf,
    #[serde(default = "default_wallets_path")]
    pub wallets_path: PathBuf,
    #[serde(default = "default_features_path")]
    pub features_path: PathBuf,
    #[serde(default = "default_report_path")]
    pub report_path: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            transactions_path: default_transactions_path(),
            wallets_path: default_wallets_path(),
            features_path: default_features_path(),
            report_path: default_report_path(),
        }
    }
}

fn default_transactions_path() -> PathBuf {
    PathBuf::from("data/generated_data.csv")
}

fn default_wallets_path() -> PathBuf {
    PathBuf::from("data/wallets.csv")
}

fn default_features_path() -> PathBuf {
    PathBuf::from("data/features.csv")
}

fn default_report_path() -> PathBuf {
    PathBuf::from("data/scored.csv")
}

// ============================================================
// Model
// ============================================================

#[derive(Debug, Deserialize, Clone)]
pub struct ModelConfig {
    #[serde(default = "default_model_path")]
    pub path: PathBuf,
    #[serde(default = "default_n_estimators")]
    pub n_estimators: usize,
    #[serde(default = "default_max_samples")]
    pub max_samples: usize,
    #[serde(default = "default_contamination")]
    pub contamination: f64,
    #[serde(default = "default_model_seed")]
    pub seed: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: default_model_path(),
            n_estimators: default_n_estimators(),
            max_samples: default_max_samples(),
            contamination: default_contamination(),
            seed: default_model_seed(),
        }
    }
}

impl ModelConfig {
    pub fn forest_params(&self) -> ForestParams {
        ForestParams {
            n_estimators: self.n_estimators,
            max_samples: self.max_samples,
            contamination: self.contamination,
            seed: self.seed,
        }
    }
}

fn default_model_path() -> PathBuf {
    PathBuf::from("models/fraud_model.json")
}

fn default_n_estimators() -> usize {
    100
}

fn default_max_samples() -> usize {
    256
}

fn default_contamination() -> f64 {
    0.05
}

fn default_model_seed() -> u64 {
    42
}

// ============================================================
// Alert Delivery / Receiver
// ============================================================

/// Where alerts are delivered.
#[derive(Debug, Deserialize, Clone)]
pub struct AlertConfig {
    #[serde(default = "default_local_host")]
    pub host: String,
    #[serde(default = "default_alert_port")]
    pub port: u16,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            host: default_local_host(),
            port: default_alert_port(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl AlertConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Where the bundled receiver binds.
#[derive(Debug, Deserialize, Clone)]
pub struct ReceiverConfig {
    #[serde(default = "default_local_host")]
    pub host: String,
    #[serde(default = "default_alert_port")]
    pub port: u16,
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            host: default_local_host(),
            port: default_alert_port(),
        }
    }
}

fn default_local_host() -> String {
    "127.0.0.1".to_string()
}

fn default_alert_port() -> u16 {
    8000
}

fn default_timeout_ms() -> u64 {
    5000
}

// ============================================================
// Synthetic Data
// ============================================================

#[derive(Debug, Deserialize, Clone)]
pub struct GeneratorConfig {
    #[serde(default = "default_wallet_count")]
    pub wallets: usize,
    #[serde(default = "default_transaction_count")]
    pub transactions: usize,
    pub seed: Option<u64>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            wallets: default_wallet_count(),
            transactions: default_transaction_count(),
            seed: None,
        }
    }
}

fn default_wallet_count() -> usize {
    100
}

fn default_transaction_count() -> usize {
    1000
}

impl Config {
    pub fn load(path: &str) -> eyre::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| eyre::eyre!("Failed to read config file '{}': {}", path, e))?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| eyre::eyre!("Failed to parse config file '{}': {}", path, e))?;
        config.validate()?;
        Ok(config)
    }

    /// Like [`Config::load`], but a missing file yields the defaults.
    pub fn load_or_default(path: &str) -> eyre::Result<Self> {
        if std::path::Path::new(path).exists() {
            Self::load(path)
        } else {
            tracing::info!(path, "Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    fn validate(&self) -> eyre::Result<()> {
        self.model
            .forest_params()
            .validate()
            .map_err(|e| eyre::eyre!("Invalid [model] section: {}", e))?;
        if self.alert.timeout_ms == 0 {
            return Err(eyre::eyre!("alert.timeout_ms must be positive"));
        }
        if self.generator.wallets == 0 || self.generator.transactions == 0 {
            return Err(eyre::eyre!(
                "generator.wallets and generator.transactions must be positive"
            ));
        }
        Ok(())
    }
}
