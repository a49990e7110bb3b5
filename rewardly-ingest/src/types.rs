use rewardly_core::Transaction;
use serde::{Deserialize, Serialize};

/// A source row that could not be turned into a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedRow {
    /// 1-based line in the source file (header is line 1).
    pub line: u64,
    pub reason: String,
}

/// Outcome of a transaction import: parsed rows plus what was skipped and why.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportReport {
    pub transactions: Vec<Transaction>,
    pub skipped: Vec<SkippedRow>,
}

impl ImportReport {
    pub fn rows_read(&self) -> usize {
        self.transactions.len() + self.skipped.len()
    }

    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }
}
