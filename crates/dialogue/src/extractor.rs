//! Pattern-based slot extraction from free-text turns
//!
//! Tries whole-sentence templates combining commodity, area and time first,
//! then per-slot fallback patterns for whichever slots remain empty.
//! Vocabulary substring matching runs before the fixed patterns, and every
//! candidate is validated before it is stored, so a slot never holds raw
//! free text. Already-filled slots are never overwritten.

use std::sync::Arc;

use chrono::NaiveDate;
use regex::Regex;

use mandi_config::Vocabulary;
use mandi_core::{SlotKind, SlotSet};

use crate::temporal::normalize_time;

pub struct SlotExtractor {
    vocabulary: Arc<Vocabulary>,
    global_patterns: Vec<Regex>,
    commodity_patterns: Vec<Regex>,
    area_patterns: Vec<Regex>,
    time_patterns: Vec<Regex>,
}

impl SlotExtractor {
    pub fn new(vocabulary: Arc<Vocabulary>) -> Self {
        Self {
            vocabulary,
            global_patterns: build_global_patterns(),
            commodity_patterns: build_commodity_patterns(),
            area_patterns: build_area_patterns(),
            time_patterns: build_time_patterns(),
        }
    }

    /// Extract candidates for every still-empty slot from `text`.
    ///
    /// `reference` anchors relative date expressions.
    pub fn extract(&self, text: &str, slots: &mut SlotSet, reference: NaiveDate) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }

        self.apply_global_templates(text, slots, reference);
        self.fill_commodity(text, slots);
        self.fill_area(text, slots);
        self.fill_time(text, slots, reference);
    }

    fn apply_global_templates(&self, text: &str, slots: &mut SlotSet, reference: NaiveDate) {
        for pattern in &self.global_patterns {
            let Some(caps) = pattern.captures(text) else {
                continue;
            };

            if !slots.is_filled(SlotKind::Commodity) {
                if let Some(candidate) = caps.name("commodity") {
                    if let Some(found) = self.vocabulary.match_commodity_in(candidate.as_str()) {
                        tracing::debug!(slot = "commodity", value = found, "Template match");
                        slots.set(SlotKind::Commodity, found.to_string());
                    }
                }
            }
            if !slots.is_filled(SlotKind::Area) {
                if let Some(candidate) = caps.name("area") {
                    if let Some(found) = self.vocabulary.match_area_in(candidate.as_str()) {
                        tracing::debug!(slot = "area", value = found, "Template match");
                        slots.set(SlotKind::Area, found.to_string());
                    }
                }
            }
            if !slots.is_filled(SlotKind::Time) {
                if let Some(candidate) = caps.name("time") {
                    if let Some(date) = normalize_time(candidate.as_str(), reference) {
                        slots.set(SlotKind::Time, date.to_string());
                    }
                }
            }
        }
    }

    fn fill_commodity(&self, text: &str, slots: &mut SlotSet) {
        if slots.is_filled(SlotKind::Commodity) {
            return;
        }

        if let Some(found) = self.vocabulary.match_commodity_in(text) {
            slots.set(SlotKind::Commodity, found.to_string());
            return;
        }

        for pattern in &self.commodity_patterns {
            let Some(caps) = pattern.captures(text) else {
                continue;
            };
            if let Some(candidate) = caps.get(1) {
                let candidate = candidate.as_str().trim().to_lowercase();
                if self.vocabulary.is_known_commodity(&candidate) {
                    slots.set(SlotKind::Commodity, candidate);
                    return;
                }
            }
        }
    }

    fn fill_area(&self, text: &str, slots: &mut SlotSet) {
        if slots.is_filled(SlotKind::Area) {
            return;
        }

        if let Some(found) = self.vocabulary.match_area_in(text) {
            slots.set(SlotKind::Area, found.to_string());
            return;
        }

        for pattern in &self.area_patterns {
            let Some(caps) = pattern.captures(text) else {
                continue;
            };
            if let Some(candidate) = caps.get(1) {
                let candidate = candidate.as_str().trim().to_lowercase();
                if self.vocabulary.is_known_area(&candidate) {
                    slots.set(SlotKind::Area, candidate);
                    return;
                }
            }
        }
    }

    fn fill_time(&self, text: &str, slots: &mut SlotSet, reference: NaiveDate) {
        if slots.is_filled(SlotKind::Time) {
            return;
        }

        for pattern in &self.time_patterns {
            let Some(caps) = pattern.captures(text) else {
                continue;
            };
            if let Some(candidate) = caps.get(1) {
                if let Some(date) = normalize_time(candidate.as_str(), reference) {
                    slots.set(SlotKind::Time, date.to_string());
                    return;
                }
            }
        }
    }
}

fn build_global_patterns() -> Vec<Regex> {
    vec![
        Regex::new(
            r"(?i)\bprice\s+of\s+(?P<commodity>\w+)(?:\s+in\s+(?P<area>[\w\s]+?))?(?:\s+(?:on|for|at)\s+(?P<time>.+))?$",
        )
        .unwrap(),
        Regex::new(
            r"(?i)^(?P<commodity>\w+)\s+prices?(?:\s+in\s+(?P<area>[\w\s]+?))?(?:\s+(?:on|for|at)\s+(?P<time>.+))?$",
        )
        .unwrap(),
        Regex::new(
            r"(?i)\bget\s+(?P<commodity>\w+)\s+(?:rates?|prices?)\s+(?:in|for)\s+(?P<area>[\w\s]+?)(?:\s+(?:on|for|at)\s+(?P<time>.+))?$",
        )
        .unwrap(),
    ]
}

fn build_commodity_patterns() -> Vec<Regex> {
    vec![
        Regex::new(r"(?i)\bcommodity[:\s]+(\w+)\b").unwrap(),
        Regex::new(r"(?i)\bhow\s+much\s+is\s+(\w+)\b").unwrap(),
    ]
}

fn build_area_patterns() -> Vec<Regex> {
    vec![Regex::new(r"(?i)\b(?:in|at|for)\s+([\w\s]+?)\b").unwrap()]
}

fn build_time_patterns() -> Vec<Regex> {
    vec![
        // Longer alternatives first so "day after tomorrow" is not eaten by
        // "tomorrow".
        Regex::new(
            r"(?i)\b(day after tomorrow|day before yesterday|next week|last week|this week|today|tomorrow|yesterday|now)\b",
        )
        .unwrap(),
        Regex::new(r"(\d{4}-\d{2}-\d{2})").unwrap(),
        Regex::new(r"(\d{1,2}[/-]\d{1,2}[/-]\d{2,4})").unwrap(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    }

    fn extractor() -> SlotExtractor {
        let vocabulary = Vocabulary::from_parts(
            vec![
                ("Wheat".to_string(), "23".to_string()),
                ("Rice".to_string(), "1".to_string()),
                ("Onion".to_string(), "47".to_string()),
            ],
            vec![
                ("Agra".to_string(), "7".to_string()),
                ("Lucknow".to_string(), "33".to_string()),
                ("Varanasi".to_string(), "68".to_string()),
            ],
        );
        SlotExtractor::new(Arc::new(vocabulary))
    }

    #[test]
    fn test_full_sentence_template() {
        let ex = extractor();
        let mut slots = SlotSet::default();
        ex.extract("price of wheat in agra on tomorrow", &mut slots, reference());

        assert_eq!(slots.commodity.as_deref(), Some("wheat"));
        assert_eq!(slots.area.as_deref(), Some("agra"));
        assert_eq!(slots.time.as_deref(), Some("2024-05-02"));
    }

    #[test]
    fn test_commodity_price_template() {
        let ex = extractor();
        let mut slots = SlotSet::default();
        ex.extract("onion price in lucknow", &mut slots, reference());

        assert_eq!(slots.commodity.as_deref(), Some("onion"));
        assert_eq!(slots.area.as_deref(), Some("lucknow"));
        assert!(slots.time.is_none());
    }

    #[test]
    fn test_per_slot_fallbacks() {
        let ex = extractor();
        let mut slots = SlotSet::default();
        ex.extract("rice rates please, for today", &mut slots, reference());

        assert_eq!(slots.commodity.as_deref(), Some("rice"));
        assert_eq!(slots.time.as_deref(), Some("2024-05-01"));
        assert!(slots.area.is_none());
    }

    #[test]
    fn test_filled_slots_are_not_overwritten() {
        let ex = extractor();
        let mut slots = SlotSet::default();
        slots.set(SlotKind::Commodity, "wheat".to_string());

        ex.extract("price of rice in varanasi", &mut slots, reference());

        assert_eq!(slots.commodity.as_deref(), Some("wheat"));
        assert_eq!(slots.area.as_deref(), Some("varanasi"));
    }

    #[test]
    fn test_unvalidated_candidates_are_dropped() {
        let ex = extractor();
        let mut slots = SlotSet::default();
        ex.extract("price of plutonium in atlantis on someday", &mut slots, reference());

        assert!(slots.commodity.is_none());
        assert!(slots.area.is_none());
        assert!(slots.time.is_none());
    }

    #[test]
    fn test_numeric_date_extraction() {
        let ex = extractor();
        let mut slots = SlotSet::default();
        ex.extract("wheat in agra 25/08/2025", &mut slots, reference());

        assert_eq!(slots.time.as_deref(), Some("2025-08-25"));
    }

    #[test]
    fn test_no_candidates_leaves_slots_empty() {
        let ex = extractor();
        let mut slots = SlotSet::default();
        ex.extract("hello there", &mut slots, reference());
        assert_eq!(slots, SlotSet::default());
    }
}
