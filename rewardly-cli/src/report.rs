//! Plain-text rendering for terminal output.

use rewardly_core::{
    CardAlert, CardInsight, RewardType, SimplifiedCalculation, SubcategoryBreakdown,
    ThemeRecommendation, calculate_effective_rate,
};
use std::fmt::Write;

fn reward_text(reward_type: RewardType, native: f64, dollars: f64) -> String {
    match reward_type {
        RewardType::Cashback => format!("${dollars:.2}"),
        RewardType::Miles => format!("{native:.0} miles (${dollars:.2})"),
    }
}

fn progress_text(progress: Option<f64>) -> String {
    progress.map_or_else(|| "-".to_string(), |p| format!("{p:.0}%"))
}

pub fn render_calculation(name: &str, calc: &SimplifiedCalculation) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} [{}] {}", name, calc.card_id, calc.period.label);
    let _ = writeln!(
        out,
        "  spend ${:.2} over {} txns | eligible ${:.2} (before blocks ${:.2})",
        calc.total_spend,
        calc.transaction_count,
        calc.eligible_spend,
        calc.eligible_spend_before_blocks
    );
    let _ = writeln!(
        out,
        "  earned {} | effective {:.2}%",
        reward_text(calc.reward_type, calc.reward_earned, calc.reward_earned_dollars),
        calculate_effective_rate(calc)
    );
    if calc.minimum_spend.is_some() || calc.maximum_spend.is_some() {
        let _ = writeln!(
            out,
            "  minimum {} ({}) | maximum {} ({})",
            if calc.minimum_spend_met { "met" } else { "not met" },
            progress_text(calc.minimum_spend_progress),
            if calc.maximum_spend_exceeded { "reached" } else { "open" },
            progress_text(calc.maximum_spend_progress),
        );
    }
    for b in calc.subcategory_breakdowns.iter().flatten() {
        out.push_str(&render_breakdown(calc.reward_type, b));
    }
    out
}

fn render_breakdown(reward_type: RewardType, b: &SubcategoryBreakdown) -> String {
    let earned = if b.exclude_from_rewards {
        "excluded".to_string()
    } else {
        reward_text(reward_type, b.reward_earned, b.reward_earned_dollars)
    };
    format!(
        "    - {:<16} #{:<10} ${:>9.2} -> {}\n",
        b.name, b.tag, b.total_spend, earned
    )
}

pub fn render_recommendation(rec: &ThemeRecommendation) -> String {
    let mut out = String::new();
    let pick = rec.recommended_card_id.as_deref().unwrap_or("none");
    let _ = writeln!(out, "{} -> {}", rec.theme_name, pick);
    for c in &rec.candidates {
        out.push_str(&render_insight(c));
    }
    out
}

fn render_insight(c: &CardInsight) -> String {
    let scope = if c.linked_subcategories.is_empty() {
        String::new()
    } else {
        format!(" ({})", c.linked_subcategories.join(", "))
    };
    format!(
        "  [{:?}] {}{}: {:.2}% effective, {:.2}% nominal; {}\n",
        c.status, c.card_name, scope, c.effective_rate, c.nominal_rate, c.reason
    )
}

pub fn render_alert(alert: &CardAlert) -> String {
    format!("[{:?}] {}\n", alert.priority, alert.message)
}
