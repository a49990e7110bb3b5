//! rewardly-core: credit-card reward calculation and recommendation engine.
//!
//! Every engine function is a pure transformation of its inputs. Time enters only as an
//! explicit `NaiveDate`; see [`time`] for turning a clock reading into one.

pub mod calculator;
pub mod card;
pub mod matcher;
pub mod normalize;
pub mod period;
pub mod recommendation;
pub mod reward_math;
pub mod subcategory;
pub mod time;
pub mod transaction;

pub use calculator::{
    SimplifiedCalculation, SubcategoryBreakdown, calculate_all, calculate_card_rewards,
    calculate_effective_rate,
};
pub use card::{BillingCycle, Card, RewardType, Settings, Subcategory, UNFLAGGED_TAG};
pub use matcher::{distinct_tags, match_transactions, total_spend, total_spend_milliunits};
pub use normalize::{normalize_card, validate_card};
pub use period::{CalculationPeriod, calculate_period};
pub use recommendation::{
    AlertKind, AlertPriority, AlertThresholds, CardAlert, CardInsight, SubcategoryRef,
    ThemeGroup, ThemeRecommendation, UsageStatus, generate_card_alerts,
    generate_card_alerts_with, generate_theme_recommendations,
};
pub use subcategory::{Resolution, SubcategoryResolver, normalize_tag};
pub use time::{
    Clock, FixedClock, SystemClock, local_today, parse_iso_date, parse_timezone, today_from,
};
pub use transaction::{MILLIUNITS_PER_DOLLAR, Transaction};
