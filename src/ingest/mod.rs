pub mod csv_source;
pub mod types;

pub use types::{Transaction, TransactionType, Wallet};
