//! rewardly-ingest: transaction CSV import and wallet (cards, themes, settings) loading.

pub mod parsers;
pub mod types;
pub mod wallet;

pub use parsers::amount::AmountParser;
pub use parsers::transactions_csv::{parse_transactions_csv, parse_transactions_reader};
pub use types::{ImportReport, SkippedRow};
pub use wallet::{Wallet, load_wallet, parse_wallet};
