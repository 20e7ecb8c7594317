//! Conversation state for the price-enquiry dialogue

use serde::{Deserialize, Serialize};

/// One of the three structured parameters a price query requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotKind {
    Commodity,
    Area,
    Time,
}

impl SlotKind {
    /// Fixed order in which missing slots are solicited.
    pub const PRIORITY: [SlotKind; 3] = [SlotKind::Commodity, SlotKind::Area, SlotKind::Time];

    pub fn as_str(&self) -> &'static str {
        match self {
            SlotKind::Commodity => "commodity",
            SlotKind::Area => "area",
            SlotKind::Time => "time",
        }
    }
}

impl std::fmt::Display for SlotKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Validated query parameters collected over the conversation.
///
/// Invariant: a field is either `None` or a value that already passed
/// vocabulary/date validation. `commodity` and `area` hold lower-cased
/// canonical vocabulary entries; `time` holds a `YYYY-MM-DD` date string.
/// Raw candidate text is never stored here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotSet {
    pub commodity: Option<String>,
    pub area: Option<String>,
    pub time: Option<String>,
}

impl SlotSet {
    pub fn get(&self, kind: SlotKind) -> Option<&str> {
        match kind {
            SlotKind::Commodity => self.commodity.as_deref(),
            SlotKind::Area => self.area.as_deref(),
            SlotKind::Time => self.time.as_deref(),
        }
    }

    pub fn set(&mut self, kind: SlotKind, value: String) {
        match kind {
            SlotKind::Commodity => self.commodity = Some(value),
            SlotKind::Area => self.area = Some(value),
            SlotKind::Time => self.time = Some(value),
        }
    }

    pub fn clear(&mut self, kind: SlotKind) {
        match kind {
            SlotKind::Commodity => self.commodity = None,
            SlotKind::Area => self.area = None,
            SlotKind::Time => self.time = None,
        }
    }

    pub fn is_filled(&self, kind: SlotKind) -> bool {
        self.get(kind).is_some()
    }

    pub fn is_complete(&self) -> bool {
        SlotKind::PRIORITY.iter().all(|k| self.is_filled(*k))
    }

    /// First missing slot in priority order.
    pub fn next_missing(&self) -> Option<SlotKind> {
        SlotKind::PRIORITY
            .iter()
            .copied()
            .find(|k| !self.is_filled(*k))
    }
}

/// Lifecycle state of a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    New,
    Incomplete,
    Complete,
}

/// Per-conversation dialogue state.
///
/// Owned by exactly one conversation. The state machine performs no
/// locking: concurrent turns for the same conversation id must be
/// serialized by the caller. Once `status` reaches `Complete` the state is
/// logically dead; callers discard or reset it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversationState {
    pub slots: SlotSet,
    /// Slot the previous turn asked for, if any.
    pub expecting: Option<SlotKind>,
    pub status: SessionStatus,
    /// Raw user turns, kept for diagnostics only.
    pub raw_turns: Vec<String>,
}

impl ConversationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_turn(&mut self, text: &str) {
        self.raw_turns.push(text.to_string());
    }

    pub fn is_complete(&self) -> bool {
        self.status == SessionStatus::Complete
    }
}

/// Result of one dialogue turn: a follow-up question or the completed slot
/// set, never both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TurnOutcome {
    /// The conversation still needs input; `prompt` goes back to the user.
    Ask { prompt: String },
    /// All three slots are filled and valid; ownership of the slot set
    /// passes to the caller.
    Complete { slots: SlotSet },
}

impl TurnOutcome {
    pub fn ask(prompt: impl Into<String>) -> Self {
        TurnOutcome::Ask {
            prompt: prompt.into(),
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, TurnOutcome::Complete { .. })
    }
}
