//! Parse budgeting-app transaction exports into engine transactions.
//!
//! Header-driven CSV. Required columns: `id,date,account_id` plus one of
//! `amount_milliunits` (signed integer) or `amount` (currency text, e.g. `-$1,234.56`).
//! Optional: `tag`. Rows that fail to parse are skipped and reported, never fatal.

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use rewardly_core::Transaction;
use serde::Deserialize;
use tracing::{info, warn};

use crate::parsers::amount::AmountParser;
use crate::types::{ImportReport, SkippedRow};

const REQUIRED_HEADERS: [&str; 3] = ["id", "date", "account_id"];

#[derive(Debug, Deserialize)]
struct RawRow {
    id: String,
    date: String,
    account_id: String,
    #[serde(default)]
    amount: Option<String>,
    #[serde(default)]
    amount_milliunits: Option<String>,
    #[serde(default)]
    tag: Option<String>,
}

/// Parse a transaction CSV file.
pub fn parse_transactions_csv(path: impl AsRef<Path>) -> Result<ImportReport> {
    let path = path.as_ref();
    let file = std::fs::File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let report = parse_transactions_reader(file)
        .with_context(|| format!("parsing {}", path.display()))?;
    info!(
        path = %path.display(),
        imported = report.transactions.len(),
        skipped = report.skipped.len(),
        "imported transactions"
    );
    Ok(report)
}

/// Parse transaction CSV from any reader.
pub fn parse_transactions_reader(reader: impl Read) -> Result<ImportReport> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = rdr.headers().context("reading CSV header")?.clone();
    let has = |name: &str| headers.iter().any(|h| h == name);
    let missing: Vec<&str> = REQUIRED_HEADERS.iter().copied().filter(|h| !has(h)).collect();
    if !missing.is_empty() {
        bail!("missing required column(s): {}", missing.join(", "));
    }
    if !has("amount") && !has("amount_milliunits") {
        bail!("missing amount column: expected `amount` or `amount_milliunits`");
    }

    let amounts = AmountParser::new()?;
    let mut report = ImportReport::default();

    for (idx, row) in rdr.deserialize::<RawRow>().enumerate() {
        // Header is line 1.
        let line = idx as u64 + 2;
        let parsed = row
            .map_err(|e| anyhow::anyhow!("{e}"))
            .and_then(|raw| to_transaction(raw, &amounts));

        match parsed {
            Ok(txn) => report.transactions.push(txn),
            Err(e) => {
                warn!(line, error = %e, "skipping transaction row");
                report.skipped.push(SkippedRow {
                    line,
                    reason: e.to_string(),
                });
            }
        }
    }

    Ok(report)
}

fn to_transaction(raw: RawRow, amounts: &AmountParser) -> Result<Transaction> {
    if raw.id.is_empty() {
        bail!("empty id");
    }
    if raw.account_id.is_empty() {
        bail!("empty account_id");
    }

    let date = NaiveDate::parse_from_str(&raw.date, "%Y-%m-%d")
        .with_context(|| format!("invalid date '{}'", raw.date))?;

    let amount = match (non_empty(raw.amount_milliunits), non_empty(raw.amount)) {
        (Some(milli), _) => milli
            .parse::<i64>()
            .with_context(|| format!("invalid amount_milliunits '{milli}'"))?,
        (None, Some(text)) => amounts.to_milliunits(&text)?,
        (None, None) => bail!("missing amount"),
    };

    let mut txn = Transaction::new(raw.id, date, amount, raw.account_id);
    txn.tag = non_empty(raw.tag);
    Ok(txn)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
