//! Core types and traits for the mandi price agent
//!
//! This crate provides the foundational pieces used across all other crates:
//! - Conversation state for the slot-filling dialogue
//! - Market price data types produced by acquisition and aggregation
//! - Collaborator traits for pluggable backends (classifier, price source,
//!   conversation store)
//! - Error types

pub mod conversation;
pub mod error;
pub mod market;
pub mod store;
pub mod traits;

pub use conversation::{ConversationState, SessionStatus, SlotKind, SlotSet, TurnOutcome};
pub use error::{Error, Result};
pub use market::{MarketPriceRow, MarketSummary, PriceQuery};
pub use store::InMemoryConversationStore;
pub use traits::{
    Classification, ConversationStore, IntentClassifier, PriceSource, PRICE_ENQUIRY_LABEL,
};
