//! Transaction matching: spend-only, account-matched, in-period.

use std::collections::BTreeSet;

use crate::card::Card;
use crate::period::CalculationPeriod;
use crate::subcategory::normalize_tag;
use crate::transaction::{Transaction, milliunits_to_dollars};

/// True if `txn` counts toward `card` in `period`.
pub fn is_matching(card: &Card, txn: &Transaction, period: &CalculationPeriod) -> bool {
    txn.account_id == card.account_id && txn.is_spend() && period.contains(txn.date)
}

/// Filter `transactions` down to the ones the calculator sees, preserving input order.
pub fn match_transactions<'a>(
    card: &Card,
    transactions: &'a [Transaction],
    period: &CalculationPeriod,
) -> Vec<&'a Transaction> {
    transactions
        .iter()
        .filter(|t| is_matching(card, t, period))
        .collect()
}

/// Sum of absolute spend in milliunits, saturating instead of overflowing.
pub fn total_spend_milliunits<'a>(
    transactions: impl IntoIterator<Item = &'a Transaction>,
) -> i64 {
    transactions
        .into_iter()
        .map(Transaction::spend_milliunits)
        .fold(0i64, i64::saturating_add)
}

/// Sum of absolute spend in dollars.
pub fn total_spend<'a>(transactions: impl IntoIterator<Item = &'a Transaction>) -> f64 {
    milliunits_to_dollars(total_spend_milliunits(transactions))
}

/// Distinct normalized tags present on tagged transactions, sorted.
///
/// Used for tag-name hints when configuring subcategories.
pub fn distinct_tags<'a>(transactions: impl IntoIterator<Item = &'a Transaction>) -> Vec<String> {
    transactions
        .into_iter()
        .filter_map(|t| t.tag.as_deref())
        .filter(|tag| !tag.trim().is_empty())
        .map(|tag| normalize_tag(Some(tag)))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::RewardType;
    use chrono::NaiveDate;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, day).unwrap()
    }

    fn march() -> CalculationPeriod {
        CalculationPeriod {
            start: d(1),
            end: d(31),
            label: "March 2026".to_string(),
        }
    }

    fn card() -> Card {
        Card::new("c1", "Card", RewardType::Cashback, "acct-1")
    }

    #[test]
    fn test_filters_account_sign_and_dates() {
        let txns = vec![
            Transaction::new("keep", d(5), -10_000, "acct-1"),
            Transaction::new("other-account", d(5), -10_000, "acct-2"),
            Transaction::new("refund", d(5), 10_000, "acct-1"),
            Transaction::new("zero", d(5), 0, "acct-1"),
            Transaction::new(
                "before",
                NaiveDate::from_ymd_opt(2026, 2, 28).unwrap(),
                -10_000,
                "acct-1",
            ),
            Transaction::new("first-day", d(1), -1_000, "acct-1"),
            Transaction::new("last-day", d(31), -2_000, "acct-1"),
            Transaction::new(
                "after",
                NaiveDate::from_ymd_opt(2026, 4, 1).unwrap(),
                -10_000,
                "acct-1",
            ),
        ];

        let matched = match_transactions(&card(), &txns, &march());
        let ids: Vec<&str> = matched.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["keep", "first-day", "last-day"]);
        assert_eq!(total_spend(matched), 13.0);
    }

    #[test]
    fn test_total_spend_empty() {
        assert_eq!(total_spend(Vec::<&Transaction>::new()), 0.0);
    }

    #[test]
    fn test_total_spend_saturates() {
        let txns = vec![
            Transaction::new("a", d(10), i64::MIN, "acct"),
            Transaction::new("b", d(10), -5_000, "acct"),
        ];
        assert_eq!(total_spend_milliunits(&txns), i64::MAX);
    }

    #[test]
    fn test_distinct_tags_normalized_and_sorted() {
        let txns = vec![
            Transaction::new("1", d(2), -1, "a").with_tag("Red"),
            Transaction::new("2", d(2), -1, "a").with_tag("red"),
            Transaction::new("3", d(2), -1, "a").with_tag(" blue "),
            Transaction::new("4", d(2), -1, "a"),
            Transaction::new("5", d(2), -1, "a").with_tag(""),
        ];
        assert_eq!(distinct_tags(&txns), vec!["blue", "red"]);
    }
}
