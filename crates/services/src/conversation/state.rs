use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use tracing::{debug, info};
use vocab_core::model::UserId;

use crate::quiz::QuizRun;

/// Where a user is in the conversation.
#[derive(Debug, Clone, Default)]
pub enum ConversationState {
    #[default]
    Idle,
    AddingWord,
    RemovingWord,
    Translating,
    /// A lookup failed; the next line may add a translation for `word`.
    AddingTranslation { word: String },
    InQuiz(Box<QuizRun>),
}

impl ConversationState {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            ConversationState::Idle => "idle",
            ConversationState::AddingWord => "adding_word",
            ConversationState::RemovingWord => "removing_word",
            ConversationState::Translating => "translating",
            ConversationState::AddingTranslation { .. } => "adding_translation",
            ConversationState::InQuiz(_) => "in_quiz",
        }
    }
}

#[derive(Debug)]
struct Slot {
    state: ConversationState,
    touched_at: DateTime<Utc>,
}

/// Per-user conversation state with idle expiry.
///
/// Turns for one user are processed one at a time: the controller takes the
/// state out, works on it, and puts it back. Idle users hold no entry.
#[derive(Debug)]
pub struct StateStore {
    slots: DashMap<UserId, Slot>,
    ttl: Duration,
}

impl StateStore {
    #[must_use]
    pub fn new(ttl: std::time::Duration) -> Self {
        Self {
            slots: DashMap::new(),
            ttl: Duration::from_std(ttl).unwrap_or_else(|_| Duration::days(36_500)),
        }
    }

    /// Remove and return the user's state; expired entries come back as `Idle`.
    pub fn take(&self, user_id: UserId, now: DateTime<Utc>) -> ConversationState {
        match self.slots.remove(&user_id) {
            Some((_, slot)) if self.is_expired(&slot, now) => {
                info!(user_id = %user_id, state = slot.state.name(), "conversation state expired");
                ConversationState::Idle
            }
            Some((_, slot)) => slot.state,
            None => ConversationState::Idle,
        }
    }

    pub fn put(&self, user_id: UserId, state: ConversationState, now: DateTime<Utc>) {
        if matches!(state, ConversationState::Idle) {
            self.slots.remove(&user_id);
            return;
        }
        self.slots.insert(
            user_id,
            Slot {
                state,
                touched_at: now,
            },
        );
    }

    /// Name of the current state without taking it.
    #[must_use]
    pub fn state_name(&self, user_id: UserId) -> &'static str {
        self.slots
            .get(&user_id)
            .map_or(ConversationState::Idle.name(), |slot| slot.state.name())
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let before = self.slots.len();
        self.slots.retain(|_, slot| !self.is_expired(slot, now));
        let purged = before.saturating_sub(self.slots.len());
        if purged > 0 {
            debug!(purged, "purged expired conversation states");
        }
        purged
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn is_expired(&self, slot: &Slot, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(slot.touched_at) > self.ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vocab_core::time::fixed_now;

    #[test]
    fn idle_is_not_stored() {
        let store = StateStore::new(std::time::Duration::from_secs(60));
        let user = UserId::new(1);
        store.put(user, ConversationState::AddingWord, fixed_now());
        assert_eq!(store.state_name(user), "adding_word");

        store.put(user, ConversationState::Idle, fixed_now());
        assert!(store.is_empty());
    }

    #[test]
    fn take_returns_idle_after_expiry() {
        let store = StateStore::new(std::time::Duration::from_secs(60));
        let user = UserId::new(2);
        let now = fixed_now();

        store.put(user, ConversationState::Translating, now);
        assert!(matches!(
            store.take(user, now + Duration::seconds(30)),
            ConversationState::Translating
        ));

        store.put(user, ConversationState::Translating, now);
        assert!(matches!(
            store.take(user, now + Duration::seconds(61)),
            ConversationState::Idle
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn purge_removes_only_stale_entries() {
        let store = StateStore::new(std::time::Duration::from_secs(60));
        let now = fixed_now();
        store.put(UserId::new(1), ConversationState::AddingWord, now);
        store.put(
            UserId::new(2),
            ConversationState::RemovingWord,
            now + Duration::seconds(50),
        );

        assert_eq!(store.purge_expired(now + Duration::seconds(90)), 1);
        assert_eq!(store.state_name(UserId::new(2)), "removing_word");
    }
}
