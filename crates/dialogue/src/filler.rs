//! Dialogue state machine for price enquiries
//!
//! Drives a conversation from `new` through `incomplete` turns until all
//! three slots are filled and valid, then emits the terminal
//! [`TurnOutcome::Complete`]. Per turn:
//!
//! 1. If a specific slot was solicited, the turn is interpreted as an
//!    answer to that slot first.
//! 2. Otherwise extraction runs across all still-empty slots.
//! 3. Every filled slot is re-validated; an invalid one is reset and
//!    becomes the next prompt target.
//! 4. Missing slots are prompted in fixed priority order
//!    commodity → area → time.
//!
//! The loop is synchronous and assumes at most one concurrent turn per
//! conversation; callers serialize turns for the same conversation id.

use std::sync::Arc;

use chrono::{Local, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

use mandi_config::Vocabulary;
use mandi_core::{ConversationState, SessionStatus, SlotKind, TurnOutcome};

use crate::extractor::SlotExtractor;
use crate::temporal::normalize_time;

static NEGATIVE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(no|nah|nope|n)\b").unwrap());

pub struct SlotFiller {
    vocabulary: Arc<Vocabulary>,
    extractor: SlotExtractor,
}

impl SlotFiller {
    pub fn new(vocabulary: Arc<Vocabulary>) -> Self {
        let extractor = SlotExtractor::new(vocabulary.clone());
        Self {
            vocabulary,
            extractor,
        }
    }

    /// Process one user turn against `state`, using the local calendar date
    /// to anchor relative expressions.
    pub fn handle_turn(&self, text: &str, state: &mut ConversationState) -> TurnOutcome {
        self.handle_turn_at(text, state, Local::now().date_naive())
    }

    /// Process one user turn with an explicit reference date.
    pub fn handle_turn_at(
        &self,
        text: &str,
        state: &mut ConversationState,
        reference: NaiveDate,
    ) -> TurnOutcome {
        state.record_turn(text);
        let text = text.trim();

        if let Some(slot) = state.expecting.take() {
            match self.answer_for(slot, text, reference) {
                Some(value) => {
                    tracing::debug!(slot = %slot, %value, "Expected slot answered");
                    state.slots.set(slot, value);
                }
                None if is_negative(text) => {
                    return self.reprompt(state, slot, None);
                }
                None => {
                    return self.reprompt(state, slot, Some(text));
                }
            }
        } else {
            self.extractor.extract(text, &mut state.slots, reference);
        }

        // Every filled slot is re-validated, not only the newly extracted
        // one; an invalid value is reset and becomes the new prompt target.
        for slot in SlotKind::PRIORITY {
            if let Some(value) = state.slots.get(slot).map(str::to_owned) {
                if !self.is_valid(slot, &value) {
                    tracing::warn!(slot = %slot, %value, "Stored slot failed re-validation, resetting");
                    state.slots.clear(slot);
                    return self.reprompt(state, slot, Some(&value));
                }
            }
        }

        if let Some(missing) = state.slots.next_missing() {
            state.expecting = Some(missing);
            state.status = SessionStatus::Incomplete;
            return TurnOutcome::ask(prompt_for(missing));
        }

        state.status = SessionStatus::Complete;
        state.expecting = None;
        tracing::info!(slots = ?state.slots, "Slot set complete");
        TurnOutcome::Complete {
            slots: state.slots.clone(),
        }
    }

    /// Interpret `text` as a direct answer for `slot`, returning the
    /// validated canonical value.
    fn answer_for(&self, slot: SlotKind, text: &str, reference: NaiveDate) -> Option<String> {
        match slot {
            SlotKind::Commodity => {
                if let Some(found) = self.vocabulary.match_commodity_in(text) {
                    return Some(found.to_string());
                }
                // A bare one-word reply like "wheat" with trailing noise.
                let first = text.split_whitespace().next()?.to_lowercase();
                self.vocabulary
                    .is_known_commodity(&first)
                    .then_some(first)
            }
            SlotKind::Area => {
                if let Some(found) = self.vocabulary.match_area_in(text) {
                    return Some(found.to_string());
                }
                let whole = text.trim().to_lowercase();
                self.vocabulary.is_known_area(&whole).then_some(whole)
            }
            SlotKind::Time => normalize_time(text, reference).map(|d| d.to_string()),
        }
    }

    fn is_valid(&self, slot: SlotKind, value: &str) -> bool {
        match slot {
            SlotKind::Commodity => self.vocabulary.is_known_commodity(value),
            SlotKind::Area => self.vocabulary.is_known_area(value),
            SlotKind::Time => NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok(),
        }
    }

    /// Re-solicit `slot`, optionally prefixing a validation error naming the
    /// rejected value.
    fn reprompt(
        &self,
        state: &mut ConversationState,
        slot: SlotKind,
        invalid_value: Option<&str>,
    ) -> TurnOutcome {
        state.expecting = Some(slot);
        state.status = SessionStatus::Incomplete;
        let prompt = prompt_for(slot);
        match invalid_value {
            Some(value) => TurnOutcome::ask(format!("{} {}", invalid_message(slot, value), prompt)),
            None => TurnOutcome::ask(prompt),
        }
    }
}

/// Fixed prompt template per slot; the date prompt names accepted formats.
fn prompt_for(slot: SlotKind) -> &'static str {
    match slot {
        SlotKind::Commodity => "Which commodity are you interested in?",
        SlotKind::Area => "Which UP city are you asking about?",
        SlotKind::Time => {
            "Which date are you interested in? (e.g. today, tomorrow, 25/08/2025)"
        }
    }
}

fn invalid_message(slot: SlotKind, value: &str) -> String {
    match slot {
        SlotKind::Commodity => format!(
            "Sorry, '{value}' is not a commodity I can look up. Please choose a valid commodity."
        ),
        SlotKind::Area => format!(
            "Sorry, '{value}' is not a UP city in our database. Please provide a valid UP city."
        ),
        SlotKind::Time => format!(
            "Sorry, I couldn't understand the date '{value}'. Please provide a valid date \
             (e.g. today, tomorrow, 25/08/2025)."
        ),
    }
}

fn is_negative(text: &str) -> bool {
    NEGATIVE.is_match(&text.to_lowercase())
}
