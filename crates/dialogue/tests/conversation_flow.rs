//! Multi-turn conversation flows through the slot filler

use std::sync::Arc;

use chrono::NaiveDate;

use mandi_config::Vocabulary;
use mandi_core::{ConversationState, SessionStatus, SlotKind, TurnOutcome};
use mandi_dialogue::SlotFiller;

fn reference() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
}

fn filler() -> SlotFiller {
    let vocabulary = Vocabulary::from_parts(
        vec![
            ("Wheat".to_string(), "23".to_string()),
            ("Rice".to_string(), "1".to_string()),
            ("Onion".to_string(), "47".to_string()),
        ],
        vec![
            ("Agra".to_string(), "7".to_string()),
            ("Lucknow".to_string(), "33".to_string()),
            ("Uttar Pradesh".to_string(), "0".to_string()),
        ],
    );
    SlotFiller::new(Arc::new(vocabulary))
}

fn ask(outcome: TurnOutcome) -> String {
    match outcome {
        TurnOutcome::Ask { prompt } => prompt,
        TurnOutcome::Complete { slots } => panic!("expected a prompt, got completion: {slots:?}"),
    }
}

#[test]
fn single_sentence_then_date_completes() {
    let filler = filler();
    let mut state = ConversationState::new();

    let prompt = ask(filler.handle_turn_at("price of wheat in agra", &mut state, reference()));
    assert!(prompt.contains("date"));
    assert_eq!(state.status, SessionStatus::Incomplete);

    let outcome = filler.handle_turn_at("today", &mut state, reference());
    let TurnOutcome::Complete { slots } = outcome else {
        panic!("expected completion");
    };
    assert_eq!(slots.commodity.as_deref(), Some("wheat"));
    assert_eq!(slots.area.as_deref(), Some("agra"));
    assert_eq!(slots.time.as_deref(), Some("2024-05-01"));
    assert_eq!(state.status, SessionStatus::Complete);
}

#[test]
fn slots_collected_one_prompt_at_a_time() {
    let filler = filler();
    let mut state = ConversationState::new();

    let prompt = ask(filler.handle_turn_at("what are mandi rates like", &mut state, reference()));
    assert!(prompt.contains("commodity"));

    let prompt = ask(filler.handle_turn_at("onion", &mut state, reference()));
    assert!(prompt.contains("city"));

    let prompt = ask(filler.handle_turn_at("lucknow", &mut state, reference()));
    assert!(prompt.contains("date"));

    let outcome = filler.handle_turn_at("25/08/2025", &mut state, reference());
    let TurnOutcome::Complete { slots } = outcome else {
        panic!("expected completion");
    };
    assert_eq!(slots.commodity.as_deref(), Some("onion"));
    assert_eq!(slots.area.as_deref(), Some("lucknow"));
    assert_eq!(slots.time.as_deref(), Some("2025-08-25"));
}

#[test]
fn invalid_area_answer_reprompts_and_recovers() {
    let filler = filler();
    let mut state = ConversationState::new();

    ask(filler.handle_turn_at("wheat", &mut state, reference()));
    assert_eq!(state.expecting, Some(SlotKind::Area));

    let prompt = ask(filler.handle_turn_at("Mars", &mut state, reference()));
    assert!(prompt.contains("'Mars'"));
    assert!(prompt.contains("UP city"));
    assert_eq!(state.slots.commodity.as_deref(), Some("wheat"));
    assert!(state.slots.area.is_none());
    assert_eq!(state.expecting, Some(SlotKind::Area));

    // The conversation recovers on a valid follow-up.
    let prompt = ask(filler.handle_turn_at("agra", &mut state, reference()));
    assert!(prompt.contains("date"));
    assert_eq!(state.slots.area.as_deref(), Some("agra"));
}

#[test]
fn longest_vocabulary_entry_wins_extraction() {
    let filler = filler();
    let mut state = ConversationState::new();

    // "uttar pradesh" must win over any shorter entry it contains.
    ask(filler.handle_turn_at("rice price in uttar pradesh", &mut state, reference()));
    assert_eq!(state.slots.area.as_deref(), Some("uttar pradesh"));
}

#[test]
fn expected_answer_carrying_other_turn_text_still_targets_slot() {
    let filler = filler();
    let mut state = ConversationState::new();
    ask(filler.handle_turn_at("price of rice on today", &mut state, reference()));
    assert_eq!(state.expecting, Some(SlotKind::Area));

    let outcome = filler.handle_turn_at("it would be agra", &mut state, reference());
    let TurnOutcome::Complete { slots } = outcome else {
        panic!("expected completion");
    };
    assert_eq!(slots.area.as_deref(), Some("agra"));
    assert_eq!(slots.time.as_deref(), Some("2024-05-01"));
}

#[test]
fn state_is_reusable_only_until_complete() {
    let filler = filler();
    let mut state = ConversationState::new();

    ask(filler.handle_turn_at("price of wheat in agra", &mut state, reference()));
    let first = filler.handle_turn_at("today", &mut state, reference());
    assert!(first.is_complete());

    // Feeding another turn to the dead state re-validates and completes
    // again without mutating the already-valid portion.
    let second = filler.handle_turn_at("anything else", &mut state, reference());
    let TurnOutcome::Complete { slots } = second else {
        panic!("expected completion");
    };
    assert_eq!(slots.commodity.as_deref(), Some("wheat"));
}
