use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use txguard::alert::{AlertDispatcher, AlertMessage, AlertSink, DeliveryStatus, HttpAlertSink};
use txguard::anomaly::AnomalyDetector;
use txguard::config::Config;
use txguard::features::extract_features;
use txguard::ingest::csv_source;
use txguard::model::{self, IsolationForest};
use txguard::pipeline::DetectionPipeline;
use txguard::seed::generator;

/// Wallet transaction anomaly scoring and alert dispatch.
#[derive(Parser, Debug)]
#[command(name = "txguard", about = "Wallet transaction anomaly scoring and alert dispatch")]
struct Cli {
    /// Path to config file (defaults apply when it does not exist)
    #[arg(long, env = "TXGUARD_CONFIG", default_value = "config.toml")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write synthetic wallets and transactions to the configured data paths
    Generate,
    /// Extract feature vectors from a transaction CSV
    Features {
        #[arg(long)]
        input: Option<PathBuf>,
    },
    /// Train the isolation forest on the feature CSV and save the artifact
    Train,
    /// Score a transaction batch and alert on every anomaly
    Detect {
        #[arg(long)]
        input: Option<PathBuf>,
    },
    /// Run the alert receiver until Ctrl+C
    ServeAlerts,
    /// Send one sample alert to the configured receiver
    TestAlert,
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    color_eyre::install()?;

    // Initialize structured logging (set RUST_LOG=debug for more output)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let cli = Cli::parse();
    let config = Config::load_or_default(&cli.config)?;

    match cli.command {
        Command::Generate => generate(&config),
        Command::Features { input } => features(&config, input),
        Command::Train => train(&config),
        Command::Detect { input } => detect(&config, input).await,
        Command::ServeAlerts => serve_alerts(&config).await,
        Command::TestAlert => test_alert(&config).await,
    }
}

fn generate(config: &Config) -> eyre::Result<()> {
    let mut rng = match config.generator.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let now = chrono::Utc::now().naive_utc();

    let wallets = generator::generate_wallets(config.generator.wallets, now.date(), &mut rng);
    let transactions =
        generator::generate_transactions(&wallets, config.generator.transactions, now, &mut rng)?;

    csv_source::write_records(&config.data.wallets_path, &wallets)?;
    csv_source::write_records(&config.data.transactions_path, &transactions)?;

    tracing::info!(
        wallets = wallets.len(),
        transactions = transactions.len(),
        path = %config.data.transactions_path.display(),
        "Synthetic data written"
    );
    Ok(())
}

fn features(config: &Config, input: Option<PathBuf>) -> eyre::Result<()> {
    let input = input.unwrap_or_else(|| config.data.transactions_path.clone());
    let transactions = csv_source::load_transactions(&input)?;
    let vectors = extract_features(&transactions)?;

    csv_source::write_records(&config.data.features_path, &vectors)?;
    tracing::info!(
        rows = vectors.len(),
        path = %config.data.features_path.display(),
        "Feature matrix written"
    );
    Ok(())
}

fn train(config: &Config) -> eyre::Result<()> {
    let vectors = csv_source::load_features(&config.data.features_path)?;
    let rows: Vec<_> = vectors.iter().map(|v| v.to_row()).collect();

    let forest = IsolationForest::fit(&rows, &config.model.forest_params())?;
    model::save_model(&config.model.path, &forest)?;

    tracing::info!(
        trees = forest.n_trees(),
        rows = rows.len(),
        path = %config.model.path.display(),
        "Model trained and saved"
    );
    Ok(())
}

async fn detect(config: &Config, input: Option<PathBuf>) -> eyre::Result<()> {
    // Loaded once; shared read-only by every scoring call.
    let forest = model::load_model(&config.model.path)?;
    let sink = HttpAlertSink::new(&config.alert.host, config.alert.port, config.alert.timeout())?;
    tracing::info!(endpoint = sink.endpoint(), "Alert sink configured");

    let pipeline = DetectionPipeline::new(
        AnomalyDetector::new(Arc::new(forest)),
        AlertDispatcher::new(Arc::new(sink)),
    );

    let input = input.unwrap_or_else(|| config.data.transactions_path.clone());
    let batch = csv_source::load_transactions(&input)?;
    let result = pipeline.run(&batch).await?;

    csv_source::write_scored_report(&config.data.report_path, &result.results)?;

    if !result.report.all_acknowledged() {
        tracing::warn!(
            failed = result.report.failed_alerts().len(),
            "Some alerts were not delivered"
        );
    }
    tracing::info!(
        transactions = result.results.len(),
        anomalies = result.anomalies.len(),
        report = %config.data.report_path.display(),
        "Detection finished"
    );
    Ok(())
}

async fn serve_alerts(config: &Config) -> eyre::Result<()> {
    let shutdown = CancellationToken::new();

    let signal = shutdown.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        }
        tracing::info!("Shutdown signal received, stopping alert receiver...");
        signal.cancel();
    });

    txguard::api::serve(&config.receiver.host, config.receiver.port, shutdown).await
}

async fn test_alert(config: &Config) -> eyre::Result<()> {
    let sink = HttpAlertSink::new(&config.alert.host, config.alert.port, config.alert.timeout())?;
    let alert = AlertMessage {
        wallet_id: "1234-abcd".to_string(),
        transaction_id: "tx-5678".to_string(),
        fraud_score: -0.25,
    };

    match DeliveryStatus::from(sink.deliver(&alert).await) {
        DeliveryStatus::Acknowledged { status, body } => {
            tracing::info!(status, body = %body, endpoint = sink.endpoint(), "Test alert acknowledged");
            Ok(())
        }
        DeliveryStatus::Rejected { status, body } => Err(eyre::eyre!(
            "Test alert rejected by '{}': {} {}",
            sink.endpoint(),
            status,
            body
        )),
        DeliveryStatus::Unreachable { reason } => Err(eyre::eyre!(
            "Alert receiver '{}' unreachable: {}",
            sink.endpoint(),
            reason
        )),
    }
}
