//! Card reward configuration: flat rate, earning blocks, spend caps and tag-driven subcategories.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Reserved tag for transactions that carry no classification tag.
pub const UNFLAGGED_TAG: &str = "unflagged";

/// How a card pays out.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum RewardType {
    /// Rate is a percentage of eligible spend, paid in the settings currency.
    Cashback,
    /// Rate is miles per dollar of eligible spend.
    Miles,
}

impl RewardType {
    /// Short unit label used in summaries.
    pub fn unit(&self) -> &'static str {
        match self {
            RewardType::Cashback => "cashback",
            RewardType::Miles => "miles",
        }
    }
}

/// Recurring reward period definition.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BillingCycle {
    /// First through last day of each calendar month.
    #[default]
    Calendar,
    /// Anchored to a statement day-of-month (1-31, clamped to short months).
    Billing { day: u32 },
}

/// A per-tag reward rule within a card.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Subcategory {
    pub id: String,
    pub name: String,
    /// Normalized (lowercased) tag value this rule matches.
    pub tag: String,
    /// Overrides the card's flat rate when this rule matches.
    #[serde(default)]
    pub reward_rate: Option<f64>,
    /// Overrides the card's earning block size.
    #[serde(default)]
    pub earning_block_size: Option<f64>,
    #[serde(default)]
    pub minimum_spend: Option<f64>,
    #[serde(default)]
    pub maximum_spend: Option<f64>,
    /// Lower runs first when allocating the shared card cap.
    #[serde(default)]
    pub priority: i32,
    #[serde(default = "default_active")]
    pub active: bool,
    /// Spend matching this rule is dropped from every total, not just from rewards.
    #[serde(default)]
    pub exclude_from_rewards: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

fn default_active() -> bool {
    true
}

impl Subcategory {
    pub fn new(id: impl Into<String>, name: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            tag: tag.into(),
            reward_rate: None,
            earning_block_size: None,
            minimum_spend: None,
            maximum_spend: None,
            priority: 0,
            active: true,
            exclude_from_rewards: false,
            created_at: None,
            updated_at: None,
        }
    }

    /// Fallback rule for untagged and unmatched transactions.
    pub fn unflagged(id: impl Into<String>) -> Self {
        Self::new(id, "Everything else", UNFLAGGED_TAG)
    }

    pub fn with_rate(mut self, rate: f64) -> Self {
        self.reward_rate = Some(rate);
        self
    }

    pub fn with_block_size(mut self, block_size: f64) -> Self {
        self.earning_block_size = Some(block_size);
        self
    }

    pub fn with_minimum_spend(mut self, minimum: f64) -> Self {
        self.minimum_spend = Some(minimum);
        self
    }

    pub fn with_maximum_spend(mut self, maximum: f64) -> Self {
        self.maximum_spend = Some(maximum);
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn excluded(mut self) -> Self {
        self.exclude_from_rewards = true;
        self
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    pub fn is_fallback(&self) -> bool {
        self.tag == UNFLAGGED_TAG
    }
}

/// A credit card and its reward configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Card {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub issuer: String,
    pub reward_type: RewardType,
    /// Budgeting account whose transactions belong to this card.
    pub account_id: String,
    #[serde(default)]
    pub billing_cycle: BillingCycle,
    /// Percent for cashback, miles per dollar for miles.
    #[serde(default)]
    pub earning_rate: Option<f64>,
    #[serde(default)]
    pub earning_block_size: Option<f64>,
    /// Unset = no requirement, zero = trivially met, positive = spend target.
    #[serde(default)]
    pub minimum_spend: Option<f64>,
    /// Positive values cap eligible spend per period; unset or zero = uncapped.
    #[serde(default)]
    pub maximum_spend: Option<f64>,
    #[serde(default)]
    pub subcategories_enabled: bool,
    #[serde(default)]
    pub subcategories: Vec<Subcategory>,
}

impl Card {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        reward_type: RewardType,
        account_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            issuer: String::new(),
            reward_type,
            account_id: account_id.into(),
            billing_cycle: BillingCycle::Calendar,
            earning_rate: None,
            earning_block_size: None,
            minimum_spend: None,
            maximum_spend: None,
            subcategories_enabled: false,
            subcategories: Vec::new(),
        }
    }

    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self
    }

    pub fn with_rate(mut self, rate: f64) -> Self {
        self.earning_rate = Some(rate);
        self
    }

    pub fn with_block_size(mut self, block_size: f64) -> Self {
        self.earning_block_size = Some(block_size);
        self
    }

    pub fn with_minimum_spend(mut self, minimum: f64) -> Self {
        self.minimum_spend = Some(minimum);
        self
    }

    pub fn with_maximum_spend(mut self, maximum: f64) -> Self {
        self.maximum_spend = Some(maximum);
        self
    }

    pub fn with_billing_day(mut self, day: u32) -> Self {
        self.billing_cycle = BillingCycle::Billing { day };
        self
    }

    /// Append a subcategory and switch per-subcategory rules on.
    pub fn with_subcategory(mut self, subcategory: Subcategory) -> Self {
        self.subcategories_enabled = true;
        self.subcategories.push(subcategory);
        self
    }

    pub fn subcategory(&self, id: &str) -> Option<&Subcategory> {
        self.subcategories.iter().find(|s| s.id == id)
    }
}

/// Per-user settings the engine needs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Dollar value of one mile.
    #[serde(default = "default_miles_valuation")]
    pub miles_valuation: f64,
}

fn default_currency() -> String {
    "USD".to_string()
}

fn default_miles_valuation() -> f64 {
    0.01
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            currency: default_currency(),
            miles_valuation: default_miles_valuation(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_card_builder_enables_subcategories() {
        let card = Card::new("c1", "Dining Card", RewardType::Cashback, "acct-1")
            .with_rate(1.0)
            .with_subcategory(Subcategory::new("s1", "Dining", "red").with_rate(4.0));

        assert!(card.subcategories_enabled);
        assert_eq!(card.subcategory("s1").map(|s| s.tag.as_str()), Some("red"));
        assert!(card.subcategory("missing").is_none());
    }

    #[test]
    fn test_reward_type_serde_lowercase() {
        let json = serde_json::to_string(&RewardType::Miles).unwrap();
        assert_eq!(json, "\"miles\"");
        let back: RewardType = serde_json::from_str("\"cashback\"").unwrap();
        assert_eq!(back, RewardType::Cashback);
    }

    #[test]
    fn test_billing_cycle_tagged_serde() {
        let cycle: BillingCycle = serde_json::from_str(r#"{"type":"billing","day":15}"#).unwrap();
        assert_eq!(cycle, BillingCycle::Billing { day: 15 });
        let calendar: BillingCycle = serde_json::from_str(r#"{"type":"calendar"}"#).unwrap();
        assert_eq!(calendar, BillingCycle::Calendar);
    }

    #[test]
    fn test_subcategory_defaults_active() {
        let sub: Subcategory =
            serde_json::from_str(r#"{"id":"s1","name":"Dining","tag":"red"}"#).unwrap();
        assert!(sub.active);
        assert!(!sub.exclude_from_rewards);
        assert_eq!(sub.priority, 0);
    }

    #[test]
    fn test_settings_default_valuation() {
        let settings = Settings::default();
        assert_eq!(settings.currency, "USD");
        assert_eq!(settings.miles_valuation, 0.01);
    }
}
