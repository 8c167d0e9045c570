//! Synthetic wallet and transaction data for exercising the pipeline.

use bigdecimal::BigDecimal;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::ingest::{Transaction, TransactionType, Wallet};

/// How far back registrations may go.
const REGISTRATION_WINDOW_DAYS: i64 = 730;

/// Inclusive amount bounds, in cents.
const MIN_AMOUNT_CENTS: i64 = 1_000;
const MAX_AMOUNT_CENTS: i64 = 500_000;

/// Layout the generator writes timestamps in.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

fn random_id<R: Rng>(rng: &mut R) -> String {
    uuid::Builder::from_random_bytes(rng.gen()).into_uuid().to_string()
}

fn random_ipv4<R: Rng>(rng: &mut R) -> String {
    format!(
        "{}.{}.{}.{}",
        rng.gen_range(1..=223u8),
        rng.gen::<u8>(),
        rng.gen::<u8>(),
        rng.gen_range(1..=254u8)
    )
}

/// Wallets registered uniformly within the two years up to `today`.
pub fn generate_wallets<R: Rng>(count: usize, today: NaiveDate, rng: &mut R) -> Vec<Wallet> {
    (0..count)
        .map(|_| Wallet {
            wallet_id: random_id(rng),
            kyc_verified: rng.gen_bool(0.5),
            registration_date: today - Duration::days(rng.gen_range(0..=REGISTRATION_WINDOW_DAYS)),
        })
        .collect()
}

/// Transactions on random wallets, each timestamped between its wallet's
/// registration and `now`.
pub fn generate_transactions<R: Rng>(
    wallets: &[Wallet],
    count: usize,
    now: NaiveDateTime,
    rng: &mut R,
) -> eyre::Result<Vec<Transaction>> {
    if wallets.is_empty() && count > 0 {
        return Err(eyre::eyre!("Cannot generate transactions without wallets"));
    }

    let mut transactions = Vec::with_capacity(count);
    for _ in 0..count {
        let wallet = wallets
            .choose(rng)
            .ok_or_else(|| eyre::eyre!("Wallet selection failed"))?;

        let start = wallet.registration_date.and_time(chrono::NaiveTime::MIN);
        let span_secs = (now - start).num_seconds().max(0);
        let timestamp = start
            + Duration::seconds(rng.gen_range(0..=span_secs))
            + Duration::microseconds(rng.gen_range(0..1_000_000));
        let timestamp = timestamp.min(now);

        let cents = rng.gen_range(MIN_AMOUNT_CENTS..=MAX_AMOUNT_CENTS);
        let tx_type = *TransactionType::ALL
            .choose(rng)
            .ok_or_else(|| eyre::eyre!("Transaction type selection failed"))?;

        transactions.push(Transaction {
            transaction_id: random_id(rng),
            wallet_id: wallet.wallet_id.clone(),
            timestamp: timestamp.format(TIMESTAMP_FORMAT).to_string(),
            amount: BigDecimal::new(cents.into(), 2),
            tx_type,
            ip_address: random_ipv4(rng),
        });
    }

    tracing::info!(
        wallets = wallets.len(),
        transactions = transactions.len(),
        "Synthetic transactions generated"
    );
    Ok(transactions)
}
