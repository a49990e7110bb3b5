//! Billing-period windows derived from a card's cycle and an explicit "today".

use chrono::{Datelike, Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::card::{BillingCycle, Card};

/// Inclusive date window a calculation covers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CalculationPeriod {
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Display only.
    pub label: String,
}

impl CalculationPeriod {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Number of calendar days covered, both ends included.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

/// Current period for `card` as seen on `today`.
pub fn calculate_period(card: &Card, today: NaiveDate) -> CalculationPeriod {
    period_for_cycle(card.billing_cycle, today)
}

pub fn period_for_cycle(cycle: BillingCycle, today: NaiveDate) -> CalculationPeriod {
    let month_start = first_of_month(today);

    match cycle {
        BillingCycle::Calendar => {
            let end = day_before(add_months(month_start, 1));
            CalculationPeriod {
                start: month_start,
                end,
                label: month_start.format("%B %Y").to_string(),
            }
        }
        BillingCycle::Billing { day } => {
            let anchor = day.clamp(1, 31);
            let this_anchor = anchor_in_month(month_start, anchor);

            let (start, next_anchor) = if today >= this_anchor {
                (this_anchor, anchor_in_month(add_months(month_start, 1), anchor))
            } else {
                (anchor_in_month(add_months(month_start, -1), anchor), this_anchor)
            };
            let end = day_before(next_anchor);

            CalculationPeriod {
                start,
                end,
                label: billing_label(start, end),
            }
        }
    }
}

fn billing_label(start: NaiveDate, end: NaiveDate) -> String {
    if start.year() == end.year() {
        format!("{} - {}", start.format("%b %-d"), end.format("%b %-d, %Y"))
    } else {
        format!("{} - {}", start.format("%b %-d, %Y"), end.format("%b %-d, %Y"))
    }
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.checked_sub_days(Days::new(u64::from(date.day0()))).unwrap_or(date)
}

fn add_months(date: NaiveDate, months: i32) -> NaiveDate {
    let shifted = if months >= 0 {
        date.checked_add_months(Months::new(months.unsigned_abs()))
    } else {
        date.checked_sub_months(Months::new(months.unsigned_abs()))
    };
    shifted.unwrap_or(date)
}

fn day_before(date: NaiveDate) -> NaiveDate {
    date.pred_opt().unwrap_or(date)
}

fn days_in_month(month_start: NaiveDate) -> u32 {
    let next = add_months(month_start, 1);
    u32::try_from((next - month_start).num_days()).unwrap_or(28)
}

/// Anchor day within the month starting at `month_start`, clamped to the month's length.
fn anchor_in_month(month_start: NaiveDate, day: u32) -> NaiveDate {
    let clamped = day.clamp(1, days_in_month(month_start));
    month_start
        .checked_add_days(Days::new(u64::from(clamped - 1)))
        .unwrap_or(month_start)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::RewardType;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_calendar_period() {
        let p = period_for_cycle(BillingCycle::Calendar, d(2026, 2, 18));
        assert_eq!(p.start, d(2026, 2, 1));
        assert_eq!(p.end, d(2026, 2, 28));
        assert_eq!(p.label, "February 2026");
        assert_eq!(p.days(), 28);
    }

    #[test]
    fn test_calendar_period_leap_year() {
        let p = period_for_cycle(BillingCycle::Calendar, d(2028, 2, 29));
        assert_eq!(p.start, d(2028, 2, 1));
        assert_eq!(p.end, d(2028, 2, 29));
    }

    #[test]
    fn test_billing_period_on_or_after_anchor() {
        let p = period_for_cycle(BillingCycle::Billing { day: 15 }, d(2026, 10, 15));
        assert_eq!(p.start, d(2026, 10, 15));
        assert_eq!(p.end, d(2026, 11, 14));
        assert_eq!(p.label, "Oct 15 - Nov 14, 2026");
    }

    #[test]
    fn test_billing_period_before_anchor() {
        let p = period_for_cycle(BillingCycle::Billing { day: 15 }, d(2026, 10, 3));
        assert_eq!(p.start, d(2026, 9, 15));
        assert_eq!(p.end, d(2026, 10, 14));
    }

    #[test]
    fn test_billing_period_crosses_year() {
        let p = period_for_cycle(BillingCycle::Billing { day: 20 }, d(2026, 1, 5));
        assert_eq!(p.start, d(2025, 12, 20));
        assert_eq!(p.end, d(2026, 1, 19));
        assert_eq!(p.label, "Dec 20, 2025 - Jan 19, 2026");
    }

    #[test]
    fn test_billing_anchor_clamped_to_short_month() {
        // Anchor 31 in February lands on the 28th.
        let p = period_for_cycle(BillingCycle::Billing { day: 31 }, d(2026, 2, 28));
        assert_eq!(p.start, d(2026, 2, 28));
        assert_eq!(p.end, d(2026, 3, 30));

        let before = period_for_cycle(BillingCycle::Billing { day: 31 }, d(2026, 2, 27));
        assert_eq!(before.start, d(2026, 1, 31));
        assert_eq!(before.end, d(2026, 2, 27));
    }

    #[test]
    fn test_billing_periods_are_contiguous() {
        let cycle = BillingCycle::Billing { day: 30 };
        let mut today = d(2026, 1, 1);
        let mut prev = period_for_cycle(cycle, today);
        for _ in 0..400 {
            today = today.succ_opt().unwrap();
            let p = period_for_cycle(cycle, today);
            assert!(p.contains(today), "{today} not in {p:?}");
            if p != prev {
                assert_eq!(p.start, prev.end.succ_opt().unwrap());
                prev = p;
            }
        }
    }

    #[test]
    fn test_anchor_day_one_matches_calendar() {
        let today = d(2026, 7, 9);
        let billing = period_for_cycle(BillingCycle::Billing { day: 1 }, today);
        let calendar = period_for_cycle(BillingCycle::Calendar, today);
        assert_eq!(billing.start, calendar.start);
        assert_eq!(billing.end, calendar.end);
    }

    #[test]
    fn test_out_of_range_anchor_is_clamped() {
        let p = period_for_cycle(BillingCycle::Billing { day: 0 }, d(2026, 7, 9));
        assert_eq!(p.start, d(2026, 7, 1));
        let p = period_for_cycle(BillingCycle::Billing { day: 45 }, d(2026, 7, 9));
        assert_eq!(p.start, d(2026, 6, 30));
        assert_eq!(p.end, d(2026, 7, 30));
    }

    #[test]
    fn test_calculate_period_uses_card_cycle() {
        let card = Card::new("c", "Card", RewardType::Cashback, "a").with_billing_day(10);
        let p = calculate_period(&card, d(2026, 10, 16));
        assert_eq!(p.start, d(2026, 10, 10));
        assert_eq!(p.end, d(2026, 11, 9));
    }
}
