//! Budgeting transactions as delivered by the external data source.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const MILLIUNITS_PER_DOLLAR: i64 = 1000;

/// An immutable transaction. Amounts are milliunits; negative = spend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Transaction {
    pub id: String,
    pub date: NaiveDate,
    pub amount: i64,
    pub account_id: String,
    /// Classification tag (flag color in the budgeting app).
    #[serde(default)]
    pub tag: Option<String>,
}

impl Transaction {
    pub fn new(
        id: impl Into<String>,
        date: NaiveDate,
        amount: i64,
        account_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            date,
            amount,
            account_id: account_id.into(),
            tag: None,
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Outflows only; refunds and inflows are never netted against spend.
    pub fn is_spend(&self) -> bool {
        self.amount < 0
    }

    /// Absolute amount in milliunits, saturating at `i64::MAX`.
    pub fn spend_milliunits(&self) -> i64 {
        self.amount.saturating_abs()
    }

    pub fn spend_dollars(&self) -> f64 {
        milliunits_to_dollars(self.spend_milliunits())
    }
}

pub fn milliunits_to_dollars(milliunits: i64) -> f64 {
    milliunits as f64 / MILLIUNITS_PER_DOLLAR as f64
}

/// Round a dollar figure to the nearest milliunit.
pub fn dollars_to_milliunits(dollars: f64) -> i64 {
    (dollars * MILLIUNITS_PER_DOLLAR as f64).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spend_detection() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 4).unwrap();
        let spend = Transaction::new("t1", date, -12_340, "acct");
        let refund = Transaction::new("t2", date, 5_000, "acct");
        let zero = Transaction::new("t3", date, 0, "acct");

        assert!(spend.is_spend());
        assert!(!refund.is_spend());
        assert!(!zero.is_spend());
        assert_eq!(spend.spend_dollars(), 12.34);

        let lowest = Transaction::new("t4", date, i64::MIN, "acct");
        assert!(lowest.is_spend());
        assert_eq!(lowest.spend_milliunits(), i64::MAX);
    }

    #[test]
    fn test_milliunit_conversions() {
        assert_eq!(milliunits_to_dollars(600_000), 600.0);
        assert_eq!(dollars_to_milliunits(12.345), 12_345);
        assert_eq!(dollars_to_milliunits(0.1 + 0.2), 300);
    }
}
