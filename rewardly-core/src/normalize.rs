//! Storage-normalization boundary.
//!
//! The calculator assumes unique-by-tag, priority-sorted subcategories with a single
//! `unflagged` fallback. Cards loaded from user-edited files pass through here first.

use std::collections::HashSet;

use anyhow::{Result, bail};
use tracing::warn;

use crate::card::{BillingCycle, Card, Subcategory, UNFLAGGED_TAG};
use crate::reward_math::positive;
pub use crate::subcategory::normalize_tag;

/// Normalize tags, drop later duplicates of a tag, stable-sort by priority and make sure
/// an enabled card has a fallback rule.
pub fn normalize_card(mut card: Card) -> Card {
    let mut seen: HashSet<String> = HashSet::new();
    let mut subcategories: Vec<Subcategory> = Vec::with_capacity(card.subcategories.len());

    for mut sub in card.subcategories.drain(..) {
        sub.tag = normalize_tag(Some(&sub.tag));
        if !seen.insert(sub.tag.clone()) {
            warn!(card = %card.id, subcategory = %sub.id, tag = %sub.tag, "duplicate tag dropped");
            continue;
        }
        subcategories.push(sub);
    }
    subcategories.sort_by_key(|s| s.priority);

    if card.subcategories_enabled && !seen.contains(UNFLAGGED_TAG) {
        let priority = subcategories.last().map_or(0, |s| s.priority.saturating_add(1));
        let mut fallback =
            Subcategory::unflagged(format!("{}-unflagged", card.id)).with_priority(priority);
        fallback.reward_rate = card.earning_rate;
        subcategories.push(fallback);
    }

    card.subcategories = subcategories;
    card
}

/// Reject configurations the engine cannot interpret sensibly.
pub fn validate_card(card: &Card) -> Result<()> {
    if card.id.trim().is_empty() {
        bail!("card has an empty id");
    }
    if card.account_id.trim().is_empty() {
        bail!("card {} has no linked account", card.id);
    }
    if let BillingCycle::Billing { day } = card.billing_cycle {
        if !(1..=31).contains(&day) {
            bail!("card {}: billing day {day} is outside 1..=31", card.id);
        }
    }
    check_non_negative(&card.id, "earning_rate", card.earning_rate)?;
    check_non_negative(&card.id, "earning_block_size", card.earning_block_size)?;
    check_range(&card.id, card.minimum_spend, card.maximum_spend)?;

    let mut ids: HashSet<&str> = HashSet::new();
    for sub in &card.subcategories {
        let scope = format!("{}/{}", card.id, sub.id);
        if sub.id.trim().is_empty() {
            bail!("card {} has a subcategory with an empty id", card.id);
        }
        if !ids.insert(sub.id.as_str()) {
            bail!("card {} has duplicate subcategory id {}", card.id, sub.id);
        }
        check_non_negative(&scope, "reward_rate", sub.reward_rate)?;
        check_non_negative(&scope, "earning_block_size", sub.earning_block_size)?;
        check_range(&scope, sub.minimum_spend, sub.maximum_spend)?;
    }
    Ok(())
}

fn check_non_negative(scope: &str, field: &str, value: Option<f64>) -> Result<()> {
    match value {
        Some(v) if !v.is_finite() || v < 0.0 => {
            bail!("{scope}: {field} must be a non-negative number, got {v}")
        }
        _ => Ok(()),
    }
}

fn check_range(scope: &str, minimum: Option<f64>, maximum: Option<f64>) -> Result<()> {
    check_non_negative(scope, "minimum_spend", minimum)?;
    check_non_negative(scope, "maximum_spend", maximum)?;
    if let (Some(min), Some(max)) = (positive(minimum), positive(maximum)) {
        if max < min {
            bail!("{scope}: maximum_spend {max} is below minimum_spend {min}");
        }
    }
    Ok(())
}
