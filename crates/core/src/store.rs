//! In-memory conversation-state store

use dashmap::DashMap;

use crate::{ConversationState, ConversationStore};

/// Process-local store backed by a concurrent map.
///
/// Suitable for single-process deployments and tests; durable persistence is
/// a caller concern behind the same [`ConversationStore`] seam.
#[derive(Debug, Default)]
pub struct InMemoryConversationStore {
    states: DashMap<String, ConversationState>,
}

impl InMemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

impl ConversationStore for InMemoryConversationStore {
    fn get(&self, id: &str) -> Option<ConversationState> {
        self.states.get(id).map(|entry| entry.value().clone())
    }

    fn put(&self, id: &str, state: ConversationState) {
        self.states.insert(id.to_string(), state);
    }

    fn delete(&self, id: &str) {
        self.states.remove(id);
    }
}
