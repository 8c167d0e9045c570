use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::anomaly::types::ScoreResult;
use crate::features::FeatureVector;

use super::types::{Transaction, Wallet};

/// Load a transaction batch from a CSV file with a header row.
/// Row order is preserved; it is the batch order seen by the detector.
pub fn load_transactions(path: &Path) -> eyre::Result<Vec<Transaction>> {
    let transactions: Vec<Transaction> = read_records(path, "transactions")?;
    tracing::info!(count = transactions.len(), path = %path.display(), "Loaded transactions");
    Ok(transactions)
}

pub fn load_wallets(path: &Path) -> eyre::Result<Vec<Wallet>> {
    let wallets: Vec<Wallet> = read_records(path, "wallets")?;
    tracing::info!(count = wallets.len(), path = %path.display(), "Loaded wallets");
    Ok(wallets)
}

/// Load a feature matrix previously written by [`write_records`].
pub fn load_features(path: &Path) -> eyre::Result<Vec<FeatureVector>> {
    let features: Vec<FeatureVector> = read_records(path, "features")?;
    tracing::info!(rows = features.len(), path = %path.display(), "Loaded feature matrix");
    Ok(features)
}

/// Write any serializable records as CSV, creating parent directories.
pub fn write_records<T: Serialize>(path: &Path, records: &[T]) -> eyre::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| {
                eyre::eyre!("Failed to create directory '{}': {}", parent.display(), e)
            })?;
        }
    }

    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| eyre::eyre!("Failed to create CSV '{}': {}", path.display(), e))?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;

    tracing::debug!(rows = records.len(), path = %path.display(), "CSV written");
    Ok(())
}

/// One row of the scored report: every transaction field plus its score.
#[derive(Debug, Serialize)]
struct ScoredRow<'a> {
    transaction_id: &'a str,
    wallet_id: &'a str,
    timestamp: &'a str,
    amount: String,
    #[serde(rename = "type")]
    tx_type: &'static str,
    ip_address: &'a str,
    fraud_score: f64,
    is_anomaly: bool,
}

/// Write every scored transaction, anomalous or not, to a CSV report.
pub fn write_scored_report(path: &Path, results: &[ScoreResult]) -> eyre::Result<()> {
    let rows: Vec<ScoredRow<'_>> = results
        .iter()
        .map(|r| ScoredRow {
            transaction_id: &r.transaction.transaction_id,
            wallet_id: &r.transaction.wallet_id,
            timestamp: &r.transaction.timestamp,
            amount: r.transaction.amount.to_string(),
            tx_type: r.transaction.tx_type.as_str(),
            ip_address: &r.transaction.ip_address,
            fraud_score: r.fraud_score,
            is_anomaly: r.is_anomaly,
        })
        .collect();

    write_records(path, &rows)
}

fn read_records<T: DeserializeOwned>(path: &Path, what: &str) -> eyre::Result<Vec<T>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| eyre::eyre!("Failed to open {} CSV '{}': {}", what, path.display(), e))?;

    let mut records = Vec::new();
    for (line, result) in reader.deserialize().enumerate() {
        let record = result.map_err(|e| {
            eyre::eyre!(
                "Failed to parse {} CSV '{}' at record {}: {}",
                what,
                path.display(),
                line + 1,
                e
            )
        })?;
        records.push(record);
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::types::TransactionType;
    use bigdecimal::BigDecimal;
    use chrono::NaiveDate;
    use std::io::Write;
    use std::str::FromStr;

    #[test]
    fn test_load_transactions_preserves_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("generated_data.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "transaction_id,wallet_id,timestamp,amount,type,ip_address").unwrap();
        writeln!(file, "tx-2,w1,2024-03-01 12:00:00,100,deposit,1.2.3.4").unwrap();
        writeln!(file, "tx-1,w2,2024-03-01 13:30:00.250000,4000.75,transfer,5.6.7.8").unwrap();
        writeln!(file, "tx-3,w1,2024-03-01T14:00:00+02:00,50.10,redeem,9.9.9.9").unwrap();
        drop(file);

        let txs = load_transactions(&path).unwrap();
        let ids: Vec<&str> = txs.iter().map(|t| t.transaction_id.as_str()).collect();
        assert_eq!(ids, vec!["tx-2", "tx-1", "tx-3"]);
        assert_eq!(txs[1].amount, BigDecimal::from_str("4000.75").unwrap());
        assert_eq!(txs[2].tx_type, TransactionType::Redeem);
        assert_eq!(txs[2].timestamp, "2024-03-01T14:00:00+02:00");
    }

    #[test]
    fn test_wallets_round_trip_through_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("wallets.csv");
        let wallets = vec![
            Wallet {
                wallet_id: "w1".to_string(),
                kyc_verified: true,
                registration_date: NaiveDate::from_ymd_opt(2023, 1, 2).unwrap(),
            },
            Wallet {
                wallet_id: "w2".to_string(),
                kyc_verified: false,
                registration_date: NaiveDate::from_ymd_opt(2024, 6, 30).unwrap(),
            },
        ];

        write_records(&path, &wallets).unwrap();
        assert_eq!(load_wallets(&path).unwrap(), wallets);
    }

    #[test]
    fn test_wallets_accept_integer_kyc_flag() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wallets.csv");
        std::fs::write(
            &path,
            "wallet_id,kyc_verified,registration_date\nw1,1,2023-01-02\nw2,0,2023-01-03\n",
        )
        .unwrap();

        let wallets = load_wallets(&path).unwrap();
        assert!(wallets[0].kyc_verified);
        assert!(!wallets[1].kyc_verified);
    }

    #[test]
    fn test_bad_row_reports_record_number() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        std::fs::write(
            &path,
            "transaction_id,wallet_id,timestamp,amount,type,ip_address\n\
             tx-1,w1,2024-03-01 12:00:00,100,deposit,1.2.3.4\n\
             tx-2,w1,2024-03-01 12:00:00,abc,deposit,1.2.3.4\n",
        )
        .unwrap();

        let err = load_transactions(&path).unwrap_err().to_string();
        assert!(err.contains("record 2"), "unexpected error: {}", err);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let err = load_transactions(Path::new("/nonexistent/generated_data.csv")).unwrap_err();
        assert!(err.to_string().contains("Failed to open transactions CSV"));
    }
}
