//! Keyword intent gate
//!
//! The real text-intent model is an externally owned service consumed
//! behind [`IntentClassifier`]; this keyword scan is the stand-in the
//! binary wires by default so the chat loop can gate non-price turns.

use once_cell::sync::Lazy;
use regex::Regex;

use mandi_core::{Classification, IntentClassifier, PRICE_ENQUIRY_LABEL};

static PRICE_TERMS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(price|prices|rate|rates|cost|mandi|bhav|how much|quintal)\b").unwrap()
});

#[derive(Debug, Default)]
pub struct KeywordIntentClassifier;

impl IntentClassifier for KeywordIntentClassifier {
    fn classify(&self, text: &str) -> Classification {
        if PRICE_TERMS.is_match(text) {
            Classification::new(PRICE_ENQUIRY_LABEL, 0.9)
        } else {
            Classification::new("non_price_enquiry", 0.6)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_terms_detected() {
        let classifier = KeywordIntentClassifier;
        assert!(classifier.classify("price of wheat in agra").is_price_enquiry());
        assert!(classifier.classify("what are onion rates").is_price_enquiry());
        assert!(classifier.classify("aaj ka mandi bhav").is_price_enquiry());
    }

    #[test]
    fn test_other_text_is_not_price_enquiry() {
        let classifier = KeywordIntentClassifier;
        assert!(!classifier.classify("my crop has leaf spots").is_price_enquiry());
        assert!(!classifier.classify("hello").is_price_enquiry());
    }
}
