//! Conversation context store.
//!
//! Holds the context object the assistant returned on the last successful
//! turn and decides what to send with the next request.

use converse_core::ConversationContext;

/// Single-owner holder of the rolling conversation context.
///
/// The context is opaque: it is sent back unmodified and replaced wholesale
/// after every successful turn, never merged.
#[derive(Debug, Clone, Default)]
pub struct ContextStore {
    current: Option<ConversationContext>,
    seed: Option<ConversationContext>,
    first_turn: bool,
}

impl ContextStore {
    /// A store for a new session, optionally seeded for the first turn.
    pub fn new(seed: Option<ConversationContext>) -> Self {
        Self {
            current: None,
            seed,
            first_turn: true,
        }
    }

    /// True until the first successful turn.
    pub fn is_first_turn(&self) -> bool {
        self.first_turn
    }

    /// The context last returned by the assistant, if any.
    pub fn current(&self) -> Option<&ConversationContext> {
        self.current.as_ref()
    }

    /// Context to send with the next request.
    ///
    /// On the first turn this is the seed, or an empty object without one.
    pub fn outgoing(&self) -> Option<ConversationContext> {
        if self.first_turn {
            Some(self.seed.clone().unwrap_or_else(ConversationContext::empty))
        } else {
            self.current.clone()
        }
    }

    /// Replace the stored context with the one from a successful reply.
    ///
    /// A reply without a context clears it.
    pub fn replace(&mut self, context: Option<ConversationContext>) {
        self.current = context;
        self.first_turn = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ctx(value: serde_json::Value) -> ConversationContext {
        ConversationContext::new(value)
    }

    #[test]
    fn test_new_store_is_first_turn() {
        let store = ContextStore::new(None);
        assert!(store.is_first_turn());
        assert!(store.current().is_none());
    }

    #[test]
    fn test_first_turn_sends_empty_without_seed() {
        let store = ContextStore::new(None);
        assert_eq!(store.outgoing(), Some(ConversationContext::empty()));
    }

    #[test]
    fn test_first_turn_sends_seed() {
        let seed = ctx(json!({"skills": {"main skill": {"user_defined": {"acc_minamt": 50}}}}));
        let store = ContextStore::new(Some(seed.clone()));
        assert_eq!(store.outgoing(), Some(seed));
    }

    #[test]
    fn test_replace_wholesale() {
        let mut store = ContextStore::new(None);
        store.replace(Some(ctx(json!({"a": 1, "b": 2}))));
        store.replace(Some(ctx(json!({"c": 3}))));
        assert_eq!(store.current(), Some(&ctx(json!({"c": 3}))));
        assert_eq!(store.outgoing(), Some(ctx(json!({"c": 3}))));
    }

    #[test]
    fn test_replace_ends_first_turn() {
        let seed = ctx(json!({"seeded": true}));
        let mut store = ContextStore::new(Some(seed));
        store.replace(Some(ctx(json!({"turn": 1}))));
        assert!(!store.is_first_turn());
        assert_eq!(store.outgoing(), Some(ctx(json!({"turn": 1}))));
    }

    #[test]
    fn test_replace_with_none_clears() {
        let mut store = ContextStore::new(None);
        store.replace(Some(ctx(json!({"turn": 1}))));
        store.replace(None);
        assert!(store.current().is_none());
        assert!(store.outgoing().is_none());
    }
}
