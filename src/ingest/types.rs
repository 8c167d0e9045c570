use std::fmt;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Kind of wallet movement. Closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Deposit,
    Transfer,
    Redeem,
}

impl TransactionType {
    pub const ALL: [TransactionType; 3] = [Self::Deposit, Self::Transfer, Self::Redeem];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Deposit => "deposit",
            Self::Transfer => "transfer",
            Self::Redeem => "redeem",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A raw wallet transaction as produced upstream.
///
/// `timestamp` is kept as the encoded text so the feature extractor decides
/// whether it resolves to a point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub transaction_id: String,
    pub wallet_id: String,
    pub timestamp: String,
    #[serde(
        serialize_with = "serialize_decimal",
        deserialize_with = "deserialize_decimal"
    )]
    pub amount: BigDecimal,
    #[serde(rename = "type")]
    pub tx_type: TransactionType,
    pub ip_address: String,
}

/// Wallet record referenced by transactions. The scoring path never reads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wallet {
    pub wallet_id: String,
    #[serde(deserialize_with = "deserialize_flag")]
    pub kyc_verified: bool,
    pub registration_date: NaiveDate,
}

fn serialize_decimal<S: Serializer>(value: &BigDecimal, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

/// CSV and JSON sources disagree on whether amounts are text or numbers.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawAmount {
    Text(String),
    Integer(u64),
    Float(f64),
}

fn deserialize_decimal<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BigDecimal, D::Error> {
    let text = match RawAmount::deserialize(deserializer)? {
        RawAmount::Text(s) => s,
        RawAmount::Integer(n) => n.to_string(),
        RawAmount::Float(f) => f.to_string(),
    };
    BigDecimal::from_str(text.trim())
        .map_err(|e| serde::de::Error::custom(format!("invalid amount '{}': {}", text, e)))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawFlag {
    Bool(bool),
    Int(u64),
    Text(String),
}

fn deserialize_flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    match RawFlag::deserialize(deserializer)? {
        RawFlag::Bool(b) => Ok(b),
        RawFlag::Int(0) => Ok(false),
        RawFlag::Int(1) => Ok(true),
        RawFlag::Int(n) => Err(serde::de::Error::custom(format!("invalid flag value {}", n))),
        RawFlag::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            other => Err(serde::de::Error::custom(format!("invalid flag value '{}'", other))),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_from_json_numeric_amount() {
        let json = r#"{
            "transaction_id": "tx-1",
            "wallet_id": "w1",
            "timestamp": "2024-03-01 12:34:56",
            "amount": 4000.5,
            "type": "transfer",
            "ip_address": "10.0.0.1"
        }"#;

        let tx: Transaction = serde_json::from_str(json).unwrap();
        assert_eq!(tx.amount, BigDecimal::from_str("4000.5").unwrap());
        assert_eq!(tx.tx_type, TransactionType::Transfer);
    }

    #[test]
    fn test_transaction_amount_serializes_as_text() {
        let tx = Transaction {
            transaction_id: "tx-1".to_string(),
            wallet_id: "w1".to_string(),
            timestamp: "2024-03-01 12:00:00".to_string(),
            amount: BigDecimal::new(12345.into(), 2),
            tx_type: TransactionType::Redeem,
            ip_address: "10.0.0.1".to_string(),
        };

        let value = serde_json::to_value(&tx).unwrap();
        assert_eq!(value["amount"], "123.45");
        assert_eq!(value["type"], "redeem");
    }

    #[test]
    fn test_unknown_transaction_type_rejected() {
        let json = r#"{
            "transaction_id": "tx-1",
            "wallet_id": "w1",
            "timestamp": "2024-03-01 12:34:56",
            "amount": "1",
            "type": "withdrawal",
            "ip_address": "10.0.0.1"
        }"#;

        assert!(serde_json::from_str::<Transaction>(json).is_err());
    }

    #[test]
    fn test_wallet_flag_accepts_integers() {
        let json = r#"{"wallet_id": "w1", "kyc_verified": 1, "registration_date": "2023-05-04"}"#;
        let wallet: Wallet = serde_json::from_str(json).unwrap();
        assert!(wallet.kyc_verified);
        assert_eq!(wallet.registration_date, NaiveDate::from_ymd_opt(2023, 5, 4).unwrap());
    }
}
