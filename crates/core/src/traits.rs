//! Collaborator traits for pluggable backends
//!
//! The classifier and price source are externally owned services handed to
//! this core by dependency injection; this crate only defines their stable
//! contracts and never manages their lifecycle.

use async_trait::async_trait;

use crate::{ConversationState, MarketPriceRow, PriceQuery, Result};

/// Label emitted by the intent model for price enquiries. Every other label
/// is treated uniformly as "not a price enquiry".
pub const PRICE_ENQUIRY_LABEL: &str = "price_enquiry";

/// Classification emitted by the intent model.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub label: String,
    pub confidence: f32,
}

impl Classification {
    pub fn new(label: impl Into<String>, confidence: f32) -> Self {
        Self {
            label: label.into(),
            confidence,
        }
    }

    pub fn is_price_enquiry(&self) -> bool {
        self.label == PRICE_ENQUIRY_LABEL
    }
}

/// Text intent classifier consumed as a black box.
pub trait IntentClassifier: Send + Sync {
    fn classify(&self, text: &str) -> Classification;
}

/// Source of market price rows for a fully resolved query.
///
/// Implementations always return rows for a syntactically valid query,
/// degrading to a synthetic dataset when live acquisition fails, and never
/// raise for "no data". Errors are reserved for unresolvable query
/// parameters and caller-initiated cancellation.
#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn acquire_prices(&self, query: &PriceQuery) -> Result<Vec<MarketPriceRow>>;
}

/// Keyed conversation-state storage, injected into the dialogue caller.
///
/// Implementations guarantee single-writer-per-key consistency; the dialogue
/// state machine itself assumes at most one concurrent turn per
/// conversation id.
pub trait ConversationStore: Send + Sync {
    fn get(&self, id: &str) -> Option<ConversationState>;
    fn put(&self, id: &str, state: ConversationState);
    fn delete(&self, id: &str);
}
