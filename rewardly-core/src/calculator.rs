//! Rewards calculator: one calculation per card per period.
//!
//! Pipeline:
//! 1. match transactions (account, spend-only, in period)
//! 2. aggregate spend, per subcategory when rules are in effect
//! 3. derive minimum-spend status from total spend
//! 4. allocate the card's maximum as a shared pool, in priority order
//! 5. truncate each consumed bucket to earning blocks and convert to reward
//!
//! All arithmetic on spend happens in milliunits; dollars appear only at bucket boundaries.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::card::{Card, RewardType, Settings, Subcategory};
use crate::matcher::{match_transactions, total_spend_milliunits};
use crate::period::{CalculationPeriod, calculate_period};
use crate::reward_math::{
    CapPool, MaximumSpendStatus, MinimumSpendStatus, Reward, apply_block, compute_reward,
    maximum_status, minimum_status, positive, resolve_block_size, resolve_rate,
};
use crate::subcategory::{Resolution, SubcategoryResolver};
use crate::transaction::{Transaction, dollars_to_milliunits, milliunits_to_dollars};
use chrono::NaiveDate;

/// Engine output for one card and period.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimplifiedCalculation {
    pub card_id: String,
    pub reward_type: RewardType,
    pub period: CalculationPeriod,
    pub transaction_count: usize,
    pub total_spend: f64,
    /// Capped spend after earning-block truncation.
    pub eligible_spend: f64,
    /// Capped spend before earning-block truncation.
    pub eligible_spend_before_blocks: f64,
    /// Cashback dollars or miles.
    pub reward_earned: f64,
    pub reward_earned_dollars: f64,
    pub minimum_spend: Option<f64>,
    pub minimum_spend_met: bool,
    pub minimum_spend_progress: Option<f64>,
    pub maximum_spend: Option<f64>,
    pub maximum_spend_exceeded: bool,
    pub maximum_spend_progress: Option<f64>,
    /// Present only when per-subcategory rules are enabled; priority order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcategory_breakdowns: Option<Vec<SubcategoryBreakdown>>,
}

/// Per-subcategory slice of a calculation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubcategoryBreakdown {
    pub subcategory_id: String,
    pub name: String,
    pub tag: String,
    pub reward_rate: f64,
    pub exclude_from_rewards: bool,
    pub transaction_count: usize,
    pub total_spend: f64,
    pub eligible_spend: f64,
    pub eligible_spend_before_blocks: f64,
    pub reward_earned: f64,
    pub reward_earned_dollars: f64,
    pub minimum_spend: Option<f64>,
    pub minimum_spend_met: bool,
    pub minimum_spend_progress: Option<f64>,
    pub maximum_spend: Option<f64>,
    pub maximum_spend_exceeded: bool,
    pub maximum_spend_progress: Option<f64>,
}

/// Earnings for one consumed bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct BucketEarnings {
    consumed: i64,
    eligible: f64,
    reward: Reward,
}

impl BucketEarnings {
    fn eligible_before_blocks(&self) -> f64 {
        milliunits_to_dollars(self.consumed)
    }
}

fn earn_bucket(
    card: &Card,
    subcategory: Option<&Subcategory>,
    consumed: i64,
    earns: bool,
    settings: &Settings,
) -> BucketEarnings {
    let eligible = apply_block(
        milliunits_to_dollars(consumed),
        resolve_block_size(card, subcategory),
    );
    let reward = if earns {
        compute_reward(
            card.reward_type,
            eligible,
            resolve_rate(card, subcategory),
            settings,
        )
    } else {
        Reward::default()
    };
    BucketEarnings {
        consumed,
        eligible,
        reward,
    }
}

/// Running totals across buckets.
#[derive(Debug, Clone, Copy, Default)]
struct Totals {
    consumed: i64,
    eligible: f64,
    reward: Reward,
}

impl Totals {
    fn add(&mut self, bucket: &BucketEarnings) {
        self.consumed = self.consumed.saturating_add(bucket.consumed);
        self.eligible += bucket.eligible;
        self.reward.native += bucket.reward.native;
        self.reward.dollars += bucket.reward.dollars;
    }
}

/// Spend routed to one active subcategory.
#[derive(Debug, Clone, Copy, Default)]
struct SpendBucket {
    milliunits: i64,
    count: usize,
}

impl SpendBucket {
    fn add(&mut self, txn: &Transaction) {
        self.milliunits = self.milliunits.saturating_add(txn.spend_milliunits());
        self.count += 1;
    }
}

/// Compute rewards for `card` over `period`. `transactions` may be unfiltered.
pub fn calculate_card_rewards(
    card: &Card,
    transactions: &[Transaction],
    period: &CalculationPeriod,
    settings: &Settings,
) -> SimplifiedCalculation {
    let matched = match_transactions(card, transactions, period);
    let resolver = SubcategoryResolver::for_card(card);

    let (total_milliunits, transaction_count, totals, breakdowns) = if resolver.in_effect() {
        calculate_with_subcategories(card, &matched, &resolver, settings)
    } else {
        let (total, totals) = calculate_flat(card, &matched, settings);
        let breakdowns = card.subcategories_enabled.then(Vec::new);
        (total, matched.len(), totals, breakdowns)
    };

    let total_spend = milliunits_to_dollars(total_milliunits);
    let eligible_spend_before_blocks = milliunits_to_dollars(totals.consumed);
    let MinimumSpendStatus {
        met: minimum_spend_met,
        progress: minimum_spend_progress,
    } = minimum_status(card.minimum_spend, total_spend);
    let MaximumSpendStatus {
        exceeded: maximum_spend_exceeded,
        progress: maximum_spend_progress,
    } = maximum_status(card.maximum_spend, total_spend, eligible_spend_before_blocks);

    debug!(
        card = %card.id,
        period = %period.label,
        transactions = transaction_count,
        total_spend,
        eligible_spend = totals.eligible,
        reward_dollars = totals.reward.dollars,
        "calculated card rewards"
    );

    SimplifiedCalculation {
        card_id: card.id.clone(),
        reward_type: card.reward_type,
        period: period.clone(),
        transaction_count,
        total_spend,
        eligible_spend: totals.eligible,
        eligible_spend_before_blocks,
        reward_earned: totals.reward.native,
        reward_earned_dollars: totals.reward.dollars,
        minimum_spend: card.minimum_spend,
        minimum_spend_met,
        minimum_spend_progress,
        maximum_spend: card.maximum_spend,
        maximum_spend_exceeded,
        maximum_spend_progress,
        subcategory_breakdowns: breakdowns,
    }
}

/// Flat path: the card cap is applied transaction by transaction in matched order.
fn calculate_flat(card: &Card, matched: &[&Transaction], settings: &Settings) -> (i64, Totals) {
    let total = total_spend_milliunits(matched.iter().copied());

    let (_pool, consumed) = matched.iter().fold(
        (CapPool::new(card.maximum_spend), 0i64),
        |(mut pool, consumed), txn| {
            let taken = pool.consume(txn.spend_milliunits(), None);
            (pool, consumed.saturating_add(taken))
        },
    );

    let mut totals = Totals::default();
    totals.add(&earn_bucket(card, None, consumed, true, settings));
    (total, totals)
}

fn calculate_with_subcategories(
    card: &Card,
    matched: &[&Transaction],
    resolver: &SubcategoryResolver<'_>,
    settings: &Settings,
) -> (i64, usize, Totals, Option<Vec<SubcategoryBreakdown>>) {
    let active = resolver.active();
    let mut buckets = vec![SpendBucket::default(); active.len()];
    let mut unassigned = SpendBucket::default();

    for txn in matched {
        match resolver.classify(txn.tag.as_deref()) {
            Resolution::Excluded(_, sub) => {
                trace!(txn = %txn.id, subcategory = %sub.id, "excluded from all totals");
            }
            Resolution::Matched(idx, _) => buckets[idx].add(txn),
            Resolution::Unassigned => {
                trace!(txn = %txn.id, "no subcategory; earning at card rate");
                unassigned.add(txn);
            }
        }
    }

    let total = buckets
        .iter()
        .map(|b| b.milliunits)
        .fold(unassigned.milliunits, i64::saturating_add);
    let count = buckets.iter().map(|b| b.count).sum::<usize>() + unassigned.count;
    let card_minimum = minimum_status(card.minimum_spend, milliunits_to_dollars(total));

    // Fold over priority order with (remaining cap, breakdowns so far): the order is load-bearing.
    let (mut pool, (mut totals, breakdowns)) = active.iter().zip(&buckets).fold(
        (
            CapPool::new(card.maximum_spend),
            (Totals::default(), Vec::with_capacity(active.len())),
        ),
        |(mut pool, (mut totals, mut breakdowns)), (&sub, bucket)| {
            let breakdown = if sub.exclude_from_rewards {
                excluded_breakdown(card, sub)
            } else {
                let own_cap = positive(sub.maximum_spend).map(dollars_to_milliunits);
                let consumed = pool.consume(bucket.milliunits, own_cap);
                let spend = milliunits_to_dollars(bucket.milliunits);
                let sub_minimum = minimum_status(sub.minimum_spend, spend);
                let earns = card_minimum.met && sub_minimum.met;
                let earned = earn_bucket(card, Some(sub), consumed, earns, settings);
                totals.add(&earned);

                debug!(
                    card = %card.id,
                    subcategory = %sub.id,
                    spend,
                    consumed = earned.eligible_before_blocks(),
                    remaining_cap = ?pool.remaining().map(milliunits_to_dollars),
                    earns,
                    "allocated subcategory bucket"
                );

                let maximum =
                    maximum_status(sub.maximum_spend, spend, earned.eligible_before_blocks());
                SubcategoryBreakdown {
                    subcategory_id: sub.id.clone(),
                    name: sub.name.clone(),
                    tag: sub.tag.clone(),
                    reward_rate: resolve_rate(card, Some(sub)),
                    exclude_from_rewards: false,
                    transaction_count: bucket.count,
                    total_spend: spend,
                    eligible_spend: earned.eligible,
                    eligible_spend_before_blocks: earned.eligible_before_blocks(),
                    reward_earned: earned.reward.native,
                    reward_earned_dollars: earned.reward.dollars,
                    minimum_spend: sub.minimum_spend,
                    minimum_spend_met: sub_minimum.met,
                    minimum_spend_progress: sub_minimum.progress,
                    maximum_spend: sub.maximum_spend,
                    maximum_spend_exceeded: maximum.exceeded,
                    maximum_spend_progress: maximum.progress,
                }
            };
            breakdowns.push(breakdown);
            (pool, (totals, breakdowns))
        },
    );

    if unassigned.milliunits > 0 {
        let consumed = pool.consume(unassigned.milliunits, None);
        let earned = earn_bucket(card, None, consumed, card_minimum.met, settings);
        totals.add(&earned);
    }

    (total, count, totals, Some(breakdowns))
}

fn excluded_breakdown(card: &Card, sub: &Subcategory) -> SubcategoryBreakdown {
    let minimum = minimum_status(sub.minimum_spend, 0.0);
    let maximum = maximum_status(sub.maximum_spend, 0.0, 0.0);
    SubcategoryBreakdown {
        subcategory_id: sub.id.clone(),
        name: sub.name.clone(),
        tag: sub.tag.clone(),
        reward_rate: resolve_rate(card, Some(sub)),
        exclude_from_rewards: true,
        transaction_count: 0,
        total_spend: 0.0,
        eligible_spend: 0.0,
        eligible_spend_before_blocks: 0.0,
        reward_earned: 0.0,
        reward_earned_dollars: 0.0,
        minimum_spend: sub.minimum_spend,
        minimum_spend_met: minimum.met,
        minimum_spend_progress: minimum.progress,
        maximum_spend: sub.maximum_spend,
        maximum_spend_exceeded: maximum.exceeded,
        maximum_spend_progress: maximum.progress,
    }
}

/// Reward dollars per dollar of spend, as a percent. Zero spend yields 0.
pub fn calculate_effective_rate(calculation: &SimplifiedCalculation) -> f64 {
    effective_rate(calculation.reward_earned_dollars, calculation.total_spend)
}

pub(crate) fn effective_rate(reward_dollars: f64, spend: f64) -> f64 {
    if spend <= 0.0 {
        return 0.0;
    }
    reward_dollars / spend * 100.0
}

/// Calculate every card over its own current period as of `today`.
pub fn calculate_all(
    cards: &[Card],
    transactions: &[Transaction],
    today: NaiveDate,
    settings: &Settings,
) -> Vec<SimplifiedCalculation> {
    cards
        .iter()
        .map(|card| {
            let period = calculate_period(card, today);
            calculate_card_rewards(card, transactions, &period, settings)
        })
        .collect()
}
