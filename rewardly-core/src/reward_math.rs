//! Pure reward arithmetic: rate and block resolution, block truncation, cap pools,
//! and minimum/maximum spend status.

use serde::{Deserialize, Serialize};

use crate::card::{Card, RewardType, Settings, Subcategory};
use crate::transaction::dollars_to_milliunits;

/// Absorbs float noise such as 0.3 / 0.1 = 2.9999999999999996.
const BLOCK_EPSILON: f64 = 1e-9;

/// Subcategory rate when matched, otherwise the card's flat rate; absent = 0.
pub fn resolve_rate(card: &Card, subcategory: Option<&Subcategory>) -> f64 {
    subcategory
        .and_then(|s| s.reward_rate)
        .or(card.earning_rate)
        .unwrap_or(0.0)
}

/// Subcategory block size overrides the card's; non-positive sizes mean no block.
pub fn resolve_block_size(card: &Card, subcategory: Option<&Subcategory>) -> Option<f64> {
    subcategory
        .and_then(|s| positive(s.earning_block_size))
        .or_else(|| positive(card.earning_block_size))
}

/// Truncate `amount` down to whole earning blocks. The remainder is lost for the period.
pub fn apply_block(amount: f64, block_size: Option<f64>) -> f64 {
    match positive(block_size) {
        None => amount,
        Some(block) => {
            let blocks = (amount / block + BLOCK_EPSILON).floor().max(0.0);
            blocks * block
        }
    }
}

/// `Some(v)` only for strictly positive values.
pub fn positive(value: Option<f64>) -> Option<f64> {
    value.filter(|v| *v > 0.0)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Reward {
    /// Cashback dollars or miles.
    pub native: f64,
    pub dollars: f64,
}

/// Convert earnable spend into reward at `rate`.
pub fn compute_reward(
    reward_type: RewardType,
    earnable: f64,
    rate: f64,
    settings: &Settings,
) -> Reward {
    let native = match reward_type {
        RewardType::Cashback => earnable * (rate / 100.0),
        RewardType::Miles => earnable * rate,
    };
    Reward {
        native,
        dollars: native_to_dollars(reward_type, native, settings),
    }
}

pub fn native_to_dollars(reward_type: RewardType, native: f64, settings: &Settings) -> f64 {
    match reward_type {
        RewardType::Cashback => native,
        RewardType::Miles => native * settings.miles_valuation,
    }
}

/// Nominal return of `rate` expressed as a percent of spend in dollars.
pub fn nominal_dollar_rate(reward_type: RewardType, rate: f64, settings: &Settings) -> f64 {
    match reward_type {
        RewardType::Cashback => rate,
        RewardType::Miles => rate * settings.miles_valuation * 100.0,
    }
}

/// Shared spend cap, tracked in milliunits. `None` = uncapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapPool {
    remaining: Option<i64>,
}

impl CapPool {
    pub fn new(maximum: Option<f64>) -> Self {
        Self {
            remaining: positive(maximum).map(dollars_to_milliunits),
        }
    }

    pub fn unlimited() -> Self {
        Self { remaining: None }
    }

    pub fn remaining(&self) -> Option<i64> {
        self.remaining
    }

    /// Take up to `requested`, limited by `own_cap` and what is left in the pool.
    pub fn consume(&mut self, requested: i64, own_cap: Option<i64>) -> i64 {
        let mut take = requested.max(0);
        if let Some(cap) = own_cap {
            take = take.min(cap.max(0));
        }
        if let Some(left) = self.remaining {
            take = take.min(left);
            self.remaining = Some(left - take);
        }
        take
    }
}

/// `part / whole * 100`, capped at 100; a zero denominator yields 0.
pub fn progress_percent(part: f64, whole: f64) -> f64 {
    if whole <= 0.0 {
        return 0.0;
    }
    (part / whole * 100.0).min(100.0)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinimumSpendStatus {
    pub met: bool,
    /// Undefined when no minimum is configured.
    pub progress: Option<f64>,
}

/// Tri-state minimum: unset has no requirement, zero is always met, positive needs `spend >= min`.
pub fn minimum_status(minimum: Option<f64>, spend: f64) -> MinimumSpendStatus {
    match minimum {
        None => MinimumSpendStatus {
            met: true,
            progress: None,
        },
        Some(min) if min <= 0.0 => MinimumSpendStatus {
            met: true,
            progress: Some(100.0),
        },
        Some(min) => MinimumSpendStatus {
            met: spend >= min,
            progress: Some(progress_percent(spend, min)),
        },
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaximumSpendStatus {
    pub exceeded: bool,
    pub progress: Option<f64>,
}

/// Exceeded when either raw spend or pre-block eligible spend reaches the cap.
/// Progress is measured against pre-block eligible spend.
pub fn maximum_status(
    maximum: Option<f64>,
    total_spend: f64,
    eligible_before_blocks: f64,
) -> MaximumSpendStatus {
    match positive(maximum) {
        None => MaximumSpendStatus {
            exceeded: false,
            progress: None,
        },
        Some(max) => MaximumSpendStatus {
            exceeded: total_spend >= max || eligible_before_blocks >= max,
            progress: Some(progress_percent(eligible_before_blocks, max)),
        },
    }
}
