//! Tag-to-subcategory resolution.
//!
//! Contract, over a card's active subcategories sorted by priority:
//! 1. exact match on the normalized tag;
//! 2. otherwise the `unflagged` fallback, if subcategories are enabled and it is active;
//! 3. otherwise no match.
//!
//! Inactive subcategories never match. Untagged transactions normalize to `unflagged`
//! and therefore land on the fallback through step 1.

use crate::card::{Card, Subcategory, UNFLAGGED_TAG};

/// Trim + lowercase; absent or blank tags become the `unflagged` sentinel.
pub fn normalize_tag(raw: Option<&str>) -> String {
    match raw.map(str::trim) {
        Some(tag) if !tag.is_empty() => tag.to_lowercase(),
        _ => UNFLAGGED_TAG.to_string(),
    }
}

/// Active subcategories, stable-sorted ascending by priority (ties keep array order).
pub fn active_by_priority(card: &Card) -> Vec<&Subcategory> {
    let mut active: Vec<&Subcategory> = card.subcategories.iter().filter(|s| s.active).collect();
    active.sort_by_key(|s| s.priority);
    active
}

/// How a transaction's tag routes through a card's subcategory rules.
/// Matched and excluded rules carry their index into [`SubcategoryResolver::active`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolution<'a> {
    /// Spend counts toward this subcategory.
    Matched(usize, &'a Subcategory),
    /// Spend is dropped from every total.
    Excluded(usize, &'a Subcategory),
    /// No rule applies; spend earns at the card's flat configuration.
    Unassigned,
}

#[derive(Debug, Clone)]
pub struct SubcategoryResolver<'a> {
    enabled: bool,
    active: Vec<&'a Subcategory>,
}

impl<'a> SubcategoryResolver<'a> {
    pub fn for_card(card: &'a Card) -> Self {
        Self {
            enabled: card.subcategories_enabled,
            active: active_by_priority(card),
        }
    }

    /// Subcategory rules apply only when enabled and at least one rule is active.
    pub fn in_effect(&self) -> bool {
        self.enabled && !self.active.is_empty()
    }

    /// Active subcategories in priority order.
    pub fn active(&self) -> &[&'a Subcategory] {
        &self.active
    }

    pub fn fallback(&self) -> Option<&'a Subcategory> {
        if !self.enabled {
            return None;
        }
        self.active.iter().copied().find(|s| s.is_fallback())
    }

    /// Index into [`Self::active`] of the rule a raw tag resolves to.
    pub fn resolve_index(&self, tag: Option<&str>) -> Option<usize> {
        if !self.enabled {
            return None;
        }
        let normalized = normalize_tag(tag);
        self.active
            .iter()
            .position(|s| s.tag == normalized)
            .or_else(|| self.active.iter().position(|s| s.is_fallback()))
    }

    /// Resolve a raw tag using the two-step precedence above.
    pub fn resolve(&self, tag: Option<&str>) -> Option<&'a Subcategory> {
        self.resolve_index(tag).map(|idx| self.active[idx])
    }

    pub fn classify(&self, tag: Option<&str>) -> Resolution<'a> {
        match self.resolve_index(tag) {
            Some(idx) if self.active[idx].exclude_from_rewards => {
                Resolution::Excluded(idx, self.active[idx])
            }
            Some(idx) => Resolution::Matched(idx, self.active[idx]),
            None => Resolution::Unassigned,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::RewardType;

    fn card() -> Card {
        Card::new("c1", "Card", RewardType::Cashback, "acct")
            .with_rate(1.0)
            .with_subcategory(
                Subcategory::new("dining", "Dining", "red")
                    .with_rate(4.0)
                    .with_priority(1),
            )
            .with_subcategory(
                Subcategory::new("travel", "Travel", "blue")
                    .with_rate(3.0)
                    .with_priority(0),
            )
            .with_subcategory(
                Subcategory::new("rent", "Rent", "purple")
                    .excluded()
                    .with_priority(2),
            )
            .with_subcategory(Subcategory::new("old", "Old", "green").inactive())
            .with_subcategory(Subcategory::unflagged("rest").with_rate(1.0).with_priority(9))
    }

    #[test]
    fn test_normalize_tag() {
        assert_eq!(normalize_tag(Some("  Red ")), "red");
        assert_eq!(normalize_tag(Some("")), "unflagged");
        assert_eq!(normalize_tag(Some("   ")), "unflagged");
        assert_eq!(normalize_tag(None), "unflagged");
    }

    #[test]
    fn test_active_sorted_by_priority() {
        let card = card();
        let ids: Vec<&str> = active_by_priority(&card).iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["travel", "dining", "rent", "rest"]);
    }

    #[test]
    fn test_priority_ties_keep_array_order() {
        let card = Card::new("c", "Card", RewardType::Miles, "a")
            .with_subcategory(Subcategory::new("b", "B", "b"))
            .with_subcategory(Subcategory::new("a", "A", "a"));
        let ids: Vec<&str> = active_by_priority(&card).iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[test]
    fn test_exact_match_case_insensitive() {
        let card = card();
        let resolver = SubcategoryResolver::for_card(&card);
        assert_eq!(resolver.resolve(Some("RED")).map(|s| s.id.as_str()), Some("dining"));
    }

    #[test]
    fn test_unknown_and_missing_tags_fall_back() {
        let card = card();
        let resolver = SubcategoryResolver::for_card(&card);
        assert_eq!(resolver.resolve(Some("orange")).map(|s| s.id.as_str()), Some("rest"));
        assert_eq!(resolver.resolve(None).map(|s| s.id.as_str()), Some("rest"));
    }

    #[test]
    fn test_inactive_never_matches() {
        let card = card();
        let resolver = SubcategoryResolver::for_card(&card);
        // "green" belongs to an inactive rule, so it falls through to the fallback.
        assert_eq!(resolver.resolve(Some("green")).map(|s| s.id.as_str()), Some("rest"));
    }

    #[test]
    fn test_no_fallback_means_no_match() {
        let card = Card::new("c", "Card", RewardType::Cashback, "a")
            .with_subcategory(Subcategory::new("dining", "Dining", "red"));
        let resolver = SubcategoryResolver::for_card(&card);
        assert!(resolver.resolve(Some("blue")).is_none());
        assert_eq!(resolver.classify(Some("blue")), Resolution::Unassigned);
    }

    #[test]
    fn test_disabled_feature_never_resolves() {
        let mut card = card();
        card.subcategories_enabled = false;
        let resolver = SubcategoryResolver::for_card(&card);
        assert!(!resolver.in_effect());
        assert!(resolver.resolve(Some("red")).is_none());
        assert!(resolver.fallback().is_none());
    }

    #[test]
    fn test_excluded_classification() {
        let card = card();
        let resolver = SubcategoryResolver::for_card(&card);
        assert!(matches!(
            resolver.classify(Some("purple")),
            Resolution::Excluded(2, s) if s.id == "rent"
        ));
        assert!(matches!(
            resolver.classify(Some("red")),
            Resolution::Matched(1, s) if s.id == "dining"
        ));
    }

    #[test]
    fn test_resolve_index_points_into_active_order() {
        let card = card();
        let resolver = SubcategoryResolver::for_card(&card);
        assert_eq!(resolver.resolve_index(Some("blue")), Some(0));
        assert_eq!(resolver.resolve_index(Some("Red")), Some(1));
        assert_eq!(resolver.resolve_index(Some("orange")), Some(3));
        assert_eq!(resolver.resolve_index(None), Some(3));
        assert_eq!(resolver.active()[3].id, "rest");
    }
}
