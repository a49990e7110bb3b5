use chrono::NaiveDate;
use rewardly_core::{
    AlertKind, UsageStatus, calculate_all, calculate_effective_rate, distinct_tags,
    generate_card_alerts, generate_theme_recommendations,
};
use rewardly_ingest::{load_wallet, parse_transactions_csv};
use std::path::PathBuf;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 25).unwrap()
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}

/// Fixture import: one bad row is reported, the rest parse.
#[test]
fn test_import_fixture_transactions() {
    let report = parse_transactions_csv(fixture("transactions.csv")).unwrap();
    assert_eq!(report.transactions.len(), 10);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].line, 12);

    let tags = distinct_tags(&report.transactions);
    assert_eq!(tags, vec!["green", "purple", "red"]);
}

/// End to end: wallet + CSV through every card's current period.
#[test]
fn test_calculations_from_fixtures() {
    let wallet = load_wallet(fixture("wallet.toml")).unwrap();
    let report = parse_transactions_csv(fixture("transactions.csv")).unwrap();
    let calcs = calculate_all(&wallet.cards, &report.transactions, today(), &wallet.settings);

    let everyday = &calcs[0];
    assert_eq!(everyday.card_id, "everyday");
    assert_eq!(everyday.total_spend, 600.0);
    assert!(everyday.minimum_spend_met);
    assert_eq!(everyday.eligible_spend, 600.0);
    assert!(close(everyday.reward_earned_dollars, 12.0));
    assert!(close(calculate_effective_rate(everyday), 2.0));

    let voyager = &calcs[1];
    assert_eq!(voyager.period.start, NaiveDate::from_ymd_opt(2026, 3, 15).unwrap());
    assert_eq!(voyager.eligible_spend_before_blocks, 123.0);
    assert_eq!(voyager.eligible_spend, 120.0);
    assert_eq!(voyager.reward_earned, 240.0);
    assert!(close(voyager.reward_earned_dollars, 2.4));

    let dining = &calcs[2];
    assert_eq!(dining.total_spend, 80.0);
    assert!(close(dining.reward_earned_dollars, 2.3));
    let breakdowns = dining.subcategory_breakdowns.as_ref().unwrap();
    let ids: Vec<&str> = breakdowns.iter().map(|b| b.subcategory_id.as_str()).collect();
    assert_eq!(ids, vec!["restaurants", "rent", "rest"]);
    assert_eq!(breakdowns[1].total_spend, 0.0);

    // Flat cards omit the breakdown key entirely.
    let json = serde_json::to_value(&calcs).unwrap();
    assert!(json[0].get("subcategory_breakdowns").is_none());
    assert_eq!(json[2]["subcategory_breakdowns"][0]["tag"], "red");
    assert_eq!(json[1]["reward_type"], "miles");
}

/// Theme ranking and dashboard alerts over the fixture wallet.
#[test]
fn test_recommendations_from_fixtures() {
    let wallet = load_wallet(fixture("wallet.toml")).unwrap();
    let report = parse_transactions_csv(fixture("transactions.csv")).unwrap();
    let calcs = calculate_all(&wallet.cards, &report.transactions, today(), &wallet.settings);

    let recs =
        generate_theme_recommendations(&wallet.themes, &wallet.cards, &calcs, &wallet.settings);
    assert_eq!(recs.len(), 2);

    let eating_out = &recs[0];
    let order: Vec<&str> = eating_out.candidates.iter().map(|c| c.card_id.as_str()).collect();
    assert_eq!(order, vec!["dining", "everyday"]);
    assert_eq!(eating_out.recommended_card_id.as_deref(), Some("dining"));
    assert!(close(eating_out.candidates[0].effective_rate, 4.0));
    assert_eq!(eating_out.candidates[0].linked_subcategories, vec!["restaurants"]);

    let travel = &recs[1];
    let order: Vec<&str> = travel.candidates.iter().map(|c| c.card_id.as_str()).collect();
    assert_eq!(order, vec!["everyday", "voyager"]);
    assert!(travel.candidates.iter().all(|c| c.status == UsageStatus::Use));

    let alerts = generate_card_alerts(&wallet.cards, &calcs);
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].card_id, "dining");
    assert_eq!(alerts[0].kind, AlertKind::HighEffectiveRate);
}
