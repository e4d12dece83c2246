//! Record lookup used by handlers to tell a known record from a new one.
//!
//! Handlers only see the [`RecordLookup`] trait. The bundled
//! [`StaticRegistry`] scores records by keyword containment first and falls
//! back to fuzzy name matching.

use serde::Serialize;
use strsim::{jaro_winkler, normalized_damerau_levenshtein};

use crate::normalizer::{fold, mentions};
use crate::types::CardField;

/// Below this confidence a lookup reports no record.
pub const MATCH_THRESHOLD: f64 = 0.60;

const KEYWORD_CONFIDENCE: f64 = 0.90;
const NAME_CONFIDENCE: f64 = 0.95;
const FUZZY_WEIGHT: f64 = 0.85;
/// Per-word Jaro-Winkler floor for a fuzzy name hit.
const TOKEN_SIMILARITY: f64 = 0.85;
/// Edit-distance floor, so a longer word sharing a prefix is not a typo.
const TOKEN_EDIT_SIMILARITY: f64 = 0.75;
const MIN_TOKEN_CHARS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Vip,
    Inventory,
    Asset,
    Staff,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub id: String,
    pub kind: RecordKind,
    pub name: String,
    pub keywords: Vec<String>,
    pub attributes: Vec<CardField>,
}

impl Record {
    pub fn new(id: &str, kind: RecordKind, name: &str) -> Self {
        Self {
            id: id.to_string(),
            kind,
            name: name.to_string(),
            keywords: Vec::new(),
            attributes: Vec::new(),
        }
    }

    pub fn keywords(mut self, keywords: &[&str]) -> Self {
        self.keywords = keywords.iter().map(|k| k.to_lowercase()).collect();
        self
    }

    pub fn attribute(mut self, label: &str, value: &str) -> Self {
        self.attributes.push(CardField::new(label, value));
        self
    }

    pub fn attribute_value(&self, label: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.label.eq_ignore_ascii_case(label))
            .map(|a| a.value.as_str())
    }
}

/// Outcome of a lookup. `record` is `None` when nothing clears the threshold.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupResult {
    pub record: Option<Record>,
    pub confidence: f64,
}

impl LookupResult {
    pub fn unmatched(confidence: f64) -> Self {
        Self {
            record: None,
            confidence,
        }
    }

    pub fn is_match(&self) -> bool {
        self.record.is_some()
    }
}

/// Read-only record search, queried synchronously during dispatch.
pub trait RecordLookup: Send + Sync {
    /// Best record of the given kind (any kind if `None`).
    fn search_kind(&self, query: &str, kind: Option<RecordKind>) -> LookupResult;

    fn search(&self, query: &str) -> LookupResult {
        self.search_kind(query, None)
    }
}

/// In-memory registry.
#[derive(Debug, Clone, Default)]
pub struct StaticRegistry {
    records: Vec<Record>,
}

impl StaticRegistry {
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    /// Small seed catalog covering each record kind.
    pub fn seeded() -> Self {
        Self::new(vec![
            Record::new("vip-001", RecordKind::Vip, "Chief Minister")
                .keywords(&["cm", "chief minister"])
                .attribute("Protocol", "State guest")
                .attribute("Last visit", "Brahmotsavam 2025"),
            Record::new("vip-002", RecordKind::Vip, "Governor")
                .keywords(&["governor", "raj bhavan"])
                .attribute("Protocol", "Constitutional head"),
            Record::new("vip-003", RecordKind::Vip, "Jeeyar Swamy")
                .keywords(&["jeeyar", "pontiff"])
                .attribute("Protocol", "Peetadhipathi honours"),
            Record::new("inv-ghee", RecordKind::Inventory, "Ghee")
                .keywords(&["ghee", "neyyi"])
                .attribute("Stock", "1,850 kg")
                .attribute("Reorder level", "1,200 kg")
                .attribute("Days of cover", "9"),
            Record::new("inv-rice", RecordKind::Inventory, "Sona Masoori Rice")
                .keywords(&["rice"])
                .attribute("Stock", "42 tonnes")
                .attribute("Reorder level", "30 tonnes")
                .attribute("Days of cover", "12"),
            Record::new("inv-besan", RecordKind::Inventory, "Besan")
                .keywords(&["besan", "gram flour"])
                .attribute("Stock", "640 kg")
                .attribute("Reorder level", "900 kg")
                .attribute("Days of cover", "3"),
            Record::new("ast-chariot", RecordKind::Asset, "Festival Chariot")
                .keywords(&["chariot", "ratham"])
                .attribute("Condition", "Wheel axle due for inspection"),
            Record::new("stf-priest", RecordKind::Staff, "Head Priest")
                .keywords(&["head priest", "pradhana archaka"])
                .attribute("On duty", "5:00 AM - 1:00 PM"),
        ])
    }

    fn score(record: &Record, query: &str) -> f64 {
        let name = record.name.to_lowercase();
        if mentions(query, &name) {
            return NAME_CONFIDENCE;
        }
        if record.keywords.iter().any(|k| mentions(query, k)) {
            return KEYWORD_CONFIDENCE;
        }

        // Every name word must have a close counterpart in the query
        let tokens: Vec<&str> = query
            .split_whitespace()
            .filter(|w| w.chars().count() >= MIN_TOKEN_CHARS)
            .collect();
        let mut total = 0.0;
        let mut count = 0;
        for part in name.split_whitespace() {
            let best = tokens
                .iter()
                .filter(|t| normalized_damerau_levenshtein(t, part) >= TOKEN_EDIT_SIMILARITY)
                .map(|t| jaro_winkler(t, part))
                .fold(0.0, f64::max);
            if best < TOKEN_SIMILARITY {
                return 0.0;
            }
            total += best;
            count += 1;
        }
        if count == 0 {
            return 0.0;
        }
        total / count as f64 * FUZZY_WEIGHT
    }
}

impl RecordLookup for StaticRegistry {
    fn search_kind(&self, query: &str, kind: Option<RecordKind>) -> LookupResult {
        let q = fold(query);
        let best = self
            .records
            .iter()
            .filter(|r| kind.map(|k| r.kind == k).unwrap_or(true))
            .map(|r| (r, Self::score(r, &q)))
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

        match best {
            Some((record, confidence)) if confidence >= MATCH_THRESHOLD => LookupResult {
                record: Some(record.clone()),
                confidence,
            },
            Some((_, confidence)) => LookupResult::unmatched(confidence),
            None => LookupResult::unmatched(0.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_match() {
        let registry = StaticRegistry::seeded();
        let result = registry.search_kind("do we have enough ghee", Some(RecordKind::Inventory));
        assert_eq!(result.record.map(|r| r.id), Some("inv-ghee".to_string()));
        assert!(result.confidence >= KEYWORD_CONFIDENCE);
    }

    #[test]
    fn test_name_match_beats_keyword() {
        let registry = StaticRegistry::seeded();
        let result = registry.search("the Chief Minister is visiting");
        assert_eq!(result.confidence, NAME_CONFIDENCE);
        assert_eq!(result.record.map(|r| r.id), Some("vip-001".to_string()));
    }

    #[test]
    fn test_fuzzy_match_tolerates_typo() {
        let registry = StaticRegistry::seeded();
        let result = registry.search_kind("the govenor arrives", Some(RecordKind::Vip));
        assert_eq!(result.record.map(|r| r.id), Some("vip-002".to_string()));
    }

    #[test]
    fn test_similar_titles_stay_unregistered() {
        let registry = StaticRegistry::seeded();
        for query in [
            "the chief justice is visiting",
            "the union minister is visiting on friday",
            "government delegation is visiting tomorrow",
        ] {
            let result = registry.search_kind(query, Some(RecordKind::Vip));
            assert!(!result.is_match(), "{} matched {:?}", query, result.record);
        }
    }

    #[test]
    fn test_multi_word_name_tolerates_typo() {
        let registry = StaticRegistry::seeded();
        let result = registry.search_kind("the cheif minster arrives", Some(RecordKind::Vip));
        assert_eq!(result.record.map(|r| r.id), Some("vip-001".to_string()));
    }

    #[test]
    fn test_unknown_is_low_confidence_sentinel() {
        let registry = StaticRegistry::seeded();
        let result = registry.search_kind("saffron", Some(RecordKind::Inventory));
        assert!(!result.is_match());
        assert!(result.confidence < MATCH_THRESHOLD);
    }

    #[test]
    fn test_kind_filter() {
        let registry = StaticRegistry::seeded();
        let result = registry.search_kind("ghee", Some(RecordKind::Vip));
        assert!(result.record.map(|r| r.kind == RecordKind::Vip).unwrap_or(true));
    }

    #[test]
    fn test_empty_registry() {
        let registry = StaticRegistry::default();
        assert_eq!(registry.search("anything"), LookupResult::unmatched(0.0));
    }
}
