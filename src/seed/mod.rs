pub mod generator;

pub use generator::{generate_transactions, generate_wallets};
