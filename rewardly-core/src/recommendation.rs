//! Recommendation engine: per-theme card ranking and dashboard-wide card alerts.
//!
//! Deterministic and calculation-driven. Themes bundle whole cards or specific
//! (card, subcategory) pairs; each linked card becomes one `CardInsight`.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calculator::{
    SimplifiedCalculation, SubcategoryBreakdown, calculate_effective_rate, effective_rate,
};
use crate::card::{Card, RewardType, Settings};
use crate::reward_math::{nominal_dollar_rate, positive, resolve_rate};

/// Reference to one subcategory of one card.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct SubcategoryRef {
    pub card_id: String,
    pub subcategory_id: String,
}

/// A user-defined bundle of cards and/or subcategories for one kind of spending.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ThemeGroup {
    pub id: String,
    pub name: String,
    /// Whole-card links.
    #[serde(default)]
    pub cards: Vec<String>,
    #[serde(default)]
    pub subcategories: Vec<SubcategoryRef>,
}

impl ThemeGroup {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            cards: Vec::new(),
            subcategories: Vec::new(),
        }
    }

    pub fn with_card(mut self, card_id: impl Into<String>) -> Self {
        self.cards.push(card_id.into());
        self
    }

    pub fn with_subcategory(
        mut self,
        card_id: impl Into<String>,
        subcategory_id: impl Into<String>,
    ) -> Self {
        self.subcategories.push(SubcategoryRef {
            card_id: card_id.into(),
            subcategory_id: subcategory_id.into(),
        });
        self
    }

    /// Linked card ids in first-appearance order, whole-card links first.
    pub fn linked_card_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = Vec::new();
        let all = self
            .cards
            .iter()
            .map(String::as_str)
            .chain(self.subcategories.iter().map(|r| r.card_id.as_str()));
        for id in all {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        ids
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum UsageStatus {
    Use,
    Consider,
    Avoid,
}

/// How one card performs for one theme.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CardInsight {
    pub card_id: String,
    pub card_name: String,
    pub reward_type: RewardType,
    pub status: UsageStatus,
    /// Subcategory ids the insight aggregates; empty for whole-card links.
    pub linked_subcategories: Vec<String>,
    pub total_spend: f64,
    pub reward_earned: f64,
    pub reward_earned_dollars: f64,
    pub effective_rate: f64,
    /// Configured return in dollar-percent, used to break ties.
    pub nominal_rate: f64,
    pub minimum_spend_met: bool,
    pub minimum_target: Option<f64>,
    pub minimum_remaining: Option<f64>,
    pub maximum_cap: Option<f64>,
    /// Tightest remaining headroom across the binding caps.
    pub maximum_remaining: Option<f64>,
    pub maximum_exceeded: bool,
    pub should_stop_using: bool,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ThemeRecommendation {
    pub theme_id: String,
    pub theme_name: String,
    /// First ranked candidate that is not `avoid`.
    pub recommended_card_id: Option<String>,
    pub candidates: Vec<CardInsight>,
}

/// Rank linked cards for every theme.
pub fn generate_theme_recommendations(
    themes: &[ThemeGroup],
    cards: &[Card],
    calculations: &[SimplifiedCalculation],
    settings: &Settings,
) -> Vec<ThemeRecommendation> {
    themes
        .iter()
        .map(|theme| recommend_theme(theme, cards, calculations, settings))
        .collect()
}

fn recommend_theme(
    theme: &ThemeGroup,
    cards: &[Card],
    calculations: &[SimplifiedCalculation],
    settings: &Settings,
) -> ThemeRecommendation {
    let mut candidates: Vec<CardInsight> = Vec::new();

    for card_id in theme.linked_card_ids() {
        let Some(card) = cards.iter().find(|c| c.id == card_id) else {
            debug!(theme = %theme.id, card = card_id, "linked card not found; skipping");
            continue;
        };
        let Some(calc) = calculations.iter().find(|c| c.card_id == card_id) else {
            debug!(theme = %theme.id, card = card_id, "no calculation for linked card; skipping");
            continue;
        };

        let whole_card = theme.cards.iter().any(|id| id == card_id);
        let linked: Vec<&str> = theme
            .subcategories
            .iter()
            .filter(|r| r.card_id == card_id)
            .map(|r| r.subcategory_id.as_str())
            .collect();

        let insight = if whole_card {
            whole_card_insight(card, calc, settings)
        } else {
            subcategory_insight(card, calc, &linked, settings)
                .unwrap_or_else(|| whole_card_insight(card, calc, settings))
        };
        candidates.push(insight);
    }

    rank_candidates(&mut candidates);

    let recommended_card_id = candidates
        .iter()
        .find(|c| c.status != UsageStatus::Avoid)
        .map(|c| c.card_id.clone());

    ThemeRecommendation {
        theme_id: theme.id.clone(),
        theme_name: theme.name.clone(),
        recommended_card_id,
        candidates,
    }
}

/// Short-of-minimum candidates first, then by effective rate, then nominal rate, descending.
pub fn rank_candidates(candidates: &mut [CardInsight]) {
    candidates.sort_by(|a, b| {
        a.minimum_spend_met
            .cmp(&b.minimum_spend_met)
            .then_with(|| b.effective_rate.total_cmp(&a.effective_rate))
            .then_with(|| b.nominal_rate.total_cmp(&a.nominal_rate))
    });
}

fn whole_card_insight(
    card: &Card,
    calc: &SimplifiedCalculation,
    settings: &Settings,
) -> CardInsight {
    let minimum_target = positive(card.minimum_spend);
    let maximum_cap = positive(card.maximum_spend);

    let mut insight = CardInsight {
        card_id: card.id.clone(),
        card_name: card.name.clone(),
        reward_type: card.reward_type,
        status: UsageStatus::Use,
        linked_subcategories: Vec::new(),
        total_spend: calc.total_spend,
        reward_earned: calc.reward_earned,
        reward_earned_dollars: calc.reward_earned_dollars,
        effective_rate: calculate_effective_rate(calc),
        nominal_rate: nominal_dollar_rate(card.reward_type, resolve_rate(card, None), settings),
        minimum_spend_met: calc.minimum_spend_met,
        minimum_target,
        minimum_remaining: minimum_target.map(|min| (min - calc.total_spend).max(0.0)),
        maximum_cap,
        maximum_remaining: maximum_cap
            .map(|max| (max - calc.eligible_spend_before_blocks).max(0.0)),
        maximum_exceeded: calc.maximum_spend_exceeded,
        should_stop_using: calc.maximum_spend_exceeded,
        reason: String::new(),
    };
    classify(&mut insight);
    insight
}

/// Aggregate only the linked subcategories. `None` when none of them appear in the breakdown.
fn subcategory_insight(
    card: &Card,
    calc: &SimplifiedCalculation,
    linked: &[&str],
    settings: &Settings,
) -> Option<CardInsight> {
    let breakdowns: Vec<&SubcategoryBreakdown> = calc
        .subcategory_breakdowns
        .as_deref()?
        .iter()
        .filter(|b| linked.contains(&b.subcategory_id.as_str()))
        .collect();
    if breakdowns.is_empty() {
        return None;
    }

    let total_spend: f64 = breakdowns.iter().map(|b| b.total_spend).sum();
    let reward_earned: f64 = breakdowns.iter().map(|b| b.reward_earned).sum();
    let reward_earned_dollars: f64 = breakdowns.iter().map(|b| b.reward_earned_dollars).sum();

    // Minimum: subcategory targets combine; with none configured the card target applies.
    let sub_targets: Vec<(f64, f64)> = breakdowns
        .iter()
        .filter_map(|b| positive(b.minimum_spend).map(|min| (min, b.total_spend)))
        .collect();
    let (minimum_target, minimum_remaining) = if sub_targets.is_empty() {
        let target = positive(card.minimum_spend);
        (target, target.map(|min| (min - calc.total_spend).max(0.0)))
    } else {
        let target: f64 = sub_targets.iter().map(|(min, _)| min).sum();
        let remaining: f64 = sub_targets
            .iter()
            .map(|(min, spend)| (min - spend).max(0.0))
            .sum();
        (Some(target), Some(remaining))
    };
    let minimum_spend_met =
        calc.minimum_spend_met && breakdowns.iter().all(|b| b.minimum_spend_met);

    // Maximum: caps add up, but the tightest remaining headroom binds.
    let sub_caps: Vec<f64> = breakdowns
        .iter()
        .filter_map(|b| positive(b.maximum_spend))
        .collect();
    let maximum_cap = (!sub_caps.is_empty()).then(|| sub_caps.iter().sum::<f64>());
    let headroom = breakdowns
        .iter()
        .filter_map(|b| {
            positive(b.maximum_spend).map(|max| (max - b.eligible_spend_before_blocks).max(0.0))
        })
        .chain(
            positive(card.maximum_spend)
                .map(|max| (max - calc.eligible_spend_before_blocks).max(0.0)),
        )
        .reduce(f64::min);
    let maximum_exceeded =
        calc.maximum_spend_exceeded || breakdowns.iter().any(|b| b.maximum_spend_exceeded);
    let all_excluded = breakdowns.iter().all(|b| b.exclude_from_rewards);
    let should_stop_using = all_excluded || headroom == Some(0.0);

    let nominal_rate = breakdowns
        .iter()
        .filter(|b| !b.exclude_from_rewards)
        .map(|b| nominal_dollar_rate(card.reward_type, b.reward_rate, settings))
        .reduce(f64::max)
        .unwrap_or(0.0);

    let mut insight = CardInsight {
        card_id: card.id.clone(),
        card_name: card.name.clone(),
        reward_type: card.reward_type,
        status: UsageStatus::Use,
        linked_subcategories: breakdowns.iter().map(|b| b.subcategory_id.clone()).collect(),
        total_spend,
        reward_earned,
        reward_earned_dollars,
        effective_rate: effective_rate(reward_earned_dollars, total_spend),
        nominal_rate,
        minimum_spend_met,
        minimum_target,
        minimum_remaining,
        maximum_cap,
        maximum_remaining: headroom,
        maximum_exceeded,
        should_stop_using,
        reason: String::new(),
    };
    classify(&mut insight);
    Some(insight)
}

fn classify(insight: &mut CardInsight) {
    let (status, reason) = if insight.should_stop_using || insight.maximum_exceeded {
        (UsageStatus::Avoid, "maximum spend reached for this period".to_string())
    } else if !insight.minimum_spend_met {
        let reason = match insight.minimum_remaining {
            Some(left) if left > 0.0 => format!("${left:.2} left to reach minimum spend"),
            _ => "minimum spend not yet met".to_string(),
        };
        (UsageStatus::Consider, reason)
    } else {
        (
            UsageStatus::Use,
            format!("earning {:.2}% effective", insight.effective_rate),
        )
    };
    insight.status = status;
    insight.reason = reason;
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AlertPriority {
    High,
    Medium,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    MaximumReached,
    MinimumNearlyMet,
    HighEffectiveRate,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CardAlert {
    pub card_id: String,
    pub card_name: String,
    pub kind: AlertKind,
    pub status: UsageStatus,
    pub priority: AlertPriority,
    pub message: String,
}

/// Thresholds for the dashboard alert pass.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AlertThresholds {
    /// Minimum-spend progress (percent) above which a card needs attention.
    pub minimum_attention_progress: f64,
    /// Effective rate (percent) above which a card is worth highlighting.
    pub good_effective_rate: f64,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            minimum_attention_progress: 80.0,
            good_effective_rate: 2.0,
        }
    }
}

/// Per-card alerts with default thresholds.
pub fn generate_card_alerts(
    cards: &[Card],
    calculations: &[SimplifiedCalculation],
) -> Vec<CardAlert> {
    generate_card_alerts_with(cards, calculations, AlertThresholds::default())
}

/// Per-card alerts, independent of themes. High priority first, card order within a priority.
pub fn generate_card_alerts_with(
    cards: &[Card],
    calculations: &[SimplifiedCalculation],
    thresholds: AlertThresholds,
) -> Vec<CardAlert> {
    let mut alerts = Vec::new();

    for card in cards {
        let Some(calc) = calculations.iter().find(|c| c.card_id == card.id) else {
            continue;
        };
        let alert = |kind, status, priority, message: String| CardAlert {
            card_id: card.id.clone(),
            card_name: card.name.clone(),
            kind,
            status,
            priority,
            message,
        };

        if calc.maximum_spend_exceeded {
            alerts.push(alert(
                AlertKind::MaximumReached,
                UsageStatus::Avoid,
                AlertPriority::High,
                format!("{} reached its maximum spend; switch cards", card.name),
            ));
        }

        if let Some(progress) = calc.minimum_spend_progress {
            if progress > thresholds.minimum_attention_progress && progress < 100.0 {
                alerts.push(alert(
                    AlertKind::MinimumNearlyMet,
                    UsageStatus::Use,
                    AlertPriority::Medium,
                    format!("{} is {progress:.0}% of the way to its minimum spend", card.name),
                ));
            }
        }

        let rate = calculate_effective_rate(calc);
        if rate > thresholds.good_effective_rate {
            alerts.push(alert(
                AlertKind::HighEffectiveRate,
                UsageStatus::Use,
                AlertPriority::Medium,
                format!("{} is earning {rate:.2}% effective", card.name),
            ));
        }
    }

    alerts.sort_by_key(|a| a.priority);
    alerts
}
