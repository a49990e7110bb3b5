//! Wallet file: settings, cards (with subcategories) and themes in one TOML document.
//!
//! ```toml
//! [settings]
//! currency = "USD"
//! miles_valuation = 0.012
//!
//! [[cards]]
//! id = "dining"
//! name = "Dining Rewards"
//! reward_type = "cashback"
//! account_id = "acct-1"
//! earning_rate = 1.0
//! billing_cycle = { type = "billing", day = 15 }
//! subcategories_enabled = true
//!
//! [[cards.subcategories]]
//! id = "restaurants"
//! name = "Restaurants"
//! tag = "red"
//! reward_rate = 4.0
//!
//! [[themes]]
//! id = "eating-out"
//! name = "Eating out"
//! subcategories = [{ card_id = "dining", subcategory_id = "restaurants" }]
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use rewardly_core::{Card, Settings, ThemeGroup, normalize_card, validate_card};
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Wallet {
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub cards: Vec<Card>,
    #[serde(default)]
    pub themes: Vec<ThemeGroup>,
}

impl Wallet {
    pub fn card(&self, id: &str) -> Option<&Card> {
        self.cards.iter().find(|c| c.id == id)
    }
}

pub fn load_wallet(path: impl AsRef<Path>) -> Result<Wallet> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    parse_wallet(&text).with_context(|| format!("parse {}", path.display()))
}

/// Parse, normalize and validate a wallet document.
pub fn parse_wallet(text: &str) -> Result<Wallet> {
    let mut wallet: Wallet = toml::from_str(text).context("invalid wallet TOML")?;

    if !wallet.settings.miles_valuation.is_finite() || wallet.settings.miles_valuation < 0.0 {
        bail!(
            "settings.miles_valuation must be a non-negative number, got {}",
            wallet.settings.miles_valuation
        );
    }

    let mut ids: HashSet<String> = HashSet::new();
    let mut cards = Vec::with_capacity(wallet.cards.len());
    for card in wallet.cards.drain(..) {
        let card = normalize_card(card);
        validate_card(&card).with_context(|| format!("card `{}`", card.id))?;
        if !ids.insert(card.id.clone()) {
            bail!("duplicate card id `{}`", card.id);
        }
        cards.push(card);
    }
    wallet.cards = cards;

    for theme in &wallet.themes {
        for card_id in theme.linked_card_ids() {
            if !ids.contains(card_id) {
                warn!(theme = %theme.id, card = card_id, "theme links an unknown card");
            }
        }
        for r in &theme.subcategories {
            let known = wallet
                .card(&r.card_id)
                .is_some_and(|c| c.subcategory(&r.subcategory_id).is_some());
            if !known {
                warn!(
                    theme = %theme.id,
                    card = %r.card_id,
                    subcategory = %r.subcategory_id,
                    "theme links an unknown subcategory"
                );
            }
        }
    }

    Ok(wallet)
}
