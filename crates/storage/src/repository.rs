use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use vocab_core::model::{
    LeaderboardEntry, QuestionResult, QuizSession, QuizStats, QuizTotals, SessionId, User, UserId,
    WordPair, WordProgress, WordScope, normalize_key,
};

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Built-in shared word list seeded on first start.
pub const DEFAULT_WORDS: &[(&str, &str)] = &[
    ("hello", "привет"),
    ("goodbye", "пока"),
    ("thank you", "спасибо"),
    ("please", "пожалуйста"),
    ("yes", "да"),
    ("no", "нет"),
    ("sorry", "извините"),
    ("help", "помощь"),
    ("water", "вода"),
    ("food", "еда"),
    ("time", "время"),
    ("day", "день"),
];

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert the user unless they already exist.
    ///
    /// Returns `true` if a new row was created.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the user cannot be stored.
    async fn register_user(&self, user: &User) -> Result<bool, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn get_user(&self, id: UserId) -> Result<Option<User>, StorageError>;
}

/// Per-user and shared word lists. Keys are normalized before every read and write.
#[async_trait]
pub trait WordRepository: Send + Sync {
    /// Store a personal word. Returns `false` if the user already has that english key.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the word cannot be stored.
    async fn add_user_word(
        &self,
        user_id: UserId,
        pair: &WordPair,
        added_at: DateTime<Utc>,
    ) -> Result<bool, StorageError>;

    /// Remove a personal word by english key. Returns `false` if nothing matched.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn remove_user_word(&self, user_id: UserId, english: &str) -> Result<bool, StorageError>;

    /// Personal words, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_user_words(&self, user_id: UserId) -> Result<Vec<WordPair>, StorageError>;

    /// Shared words in insertion order, capped at `limit`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_default_words(&self, limit: u32) -> Result<Vec<WordPair>, StorageError>;

    /// Add a shared word. Returns `false` if the english key already exists.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the word cannot be stored.
    async fn add_default_word(&self, pair: &WordPair) -> Result<bool, StorageError>;

    /// Translation stored for an exact english key within one scope.
    ///
    /// `user_id` is ignored for `WordScope::Default`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn translation(
        &self,
        scope: WordScope,
        user_id: UserId,
        english: &str,
    ) -> Result<Option<String>, StorageError>;

    /// Every distinct translation stored for a word across the shared list and the user's list.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn translations_for(
        &self,
        user_id: UserId,
        english: &str,
    ) -> Result<Vec<String>, StorageError>;
}

/// Quiz sessions and their per-question results.
#[async_trait]
pub trait QuizRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the session row cannot be created.
    async fn create_session(
        &self,
        user_id: UserId,
        started_at: DateTime<Utc>,
    ) -> Result<SessionId, StorageError>;

    /// Append one answered question to a session.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the session does not exist.
    async fn append_result(&self, result: &QuestionResult) -> Result<i64, StorageError>;

    /// Set end time and final counters.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` for an unknown session and
    /// `StorageError::Conflict` if the session was already finalized.
    async fn finalize_session(
        &self,
        id: SessionId,
        totals: QuizTotals,
        ended_at: DateTime<Utc>,
    ) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn get_session(&self, id: SessionId) -> Result<Option<QuizSession>, StorageError>;

    /// Results of one session in answer order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn results_for_session(&self, id: SessionId)
    -> Result<Vec<QuestionResult>, StorageError>;

    /// Most recent sessions of a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn recent_sessions(
        &self,
        user_id: UserId,
        limit: u32,
    ) -> Result<Vec<QuizSession>, StorageError>;

    /// Count, average and best correct answers over the user's finalized sessions.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn quiz_stats(&self, user_id: UserId) -> Result<QuizStats, StorageError>;
}

/// Lifetime counters: the leaderboard and per-word progress.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Additively fold a completed session into the user's leaderboard row.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the row cannot be written.
    async fn add_to_leaderboard(
        &self,
        user_id: UserId,
        correct: u32,
        incorrect: u32,
        at: DateTime<Utc>,
    ) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn leaderboard_entry(
        &self,
        user_id: UserId,
    ) -> Result<Option<LeaderboardEntry>, StorageError>;

    /// Count one showing of a stored word.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the row cannot be written.
    async fn record_word_progress(
        &self,
        user_id: UserId,
        english: &str,
        scope: WordScope,
        correct: bool,
        at: DateTime<Utc>,
    ) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn word_progress(
        &self,
        user_id: UserId,
        english: &str,
        scope: WordScope,
    ) -> Result<Option<WordProgress>, StorageError>;
}

//
// ─── IN-MEMORY ─────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone)]
struct StoredUserWord {
    pair: WordPair,
    added_at: DateTime<Utc>,
    seq: u64,
}

#[derive(Debug, Clone)]
struct StoredSession {
    user_id: UserId,
    started_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
    totals: Option<QuizTotals>,
}

#[derive(Default)]
struct WordTables {
    defaults: Vec<WordPair>,
    user_words: HashMap<UserId, Vec<StoredUserWord>>,
    next_seq: u64,
}

#[derive(Default)]
struct QuizTables {
    sessions: HashMap<SessionId, StoredSession>,
    results: Vec<QuestionResult>,
    next_session: u64,
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    users: Arc<Mutex<HashMap<UserId, User>>>,
    words: Arc<Mutex<WordTables>>,
    quizzes: Arc<Mutex<QuizTables>>,
    leaderboard: Arc<Mutex<HashMap<UserId, LeaderboardEntry>>>,
    progress: Arc<Mutex<HashMap<(UserId, String, WordScope), WordProgress>>>,
}

fn poisoned<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

fn stored_to_session(id: SessionId, s: &StoredSession) -> Result<QuizSession, StorageError> {
    QuizSession::from_persisted(id, s.user_id, s.started_at, s.ended_at, s.totals)
        .map_err(|e| StorageError::Serialization(e.to_string()))
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the shared list with [`DEFAULT_WORDS`].
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the lock is poisoned.
    pub fn seed_default_words(&self) -> Result<(), StorageError> {
        let mut guard = self.words.lock().map_err(poisoned)?;
        for (en, ru) in DEFAULT_WORDS {
            let pair = WordPair::new(en, ru).map_err(|e| StorageError::Serialization(e.to_string()))?;
            if !guard.defaults.iter().any(|p| p.english() == pair.english()) {
                guard.defaults.push(pair);
            }
        }
        Ok(())
    }
}

#[async_trait]
impl UserRepository for InMemoryRepository {
    async fn register_user(&self, user: &User) -> Result<bool, StorageError> {
        let mut guard = self.users.lock().map_err(poisoned)?;
        if guard.contains_key(&user.id) {
            return Ok(false);
        }
        guard.insert(user.id, user.clone());
        Ok(true)
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, StorageError> {
        let guard = self.users.lock().map_err(poisoned)?;
        Ok(guard.get(&id).cloned())
    }
}

#[async_trait]
impl WordRepository for InMemoryRepository {
    async fn add_user_word(
        &self,
        user_id: UserId,
        pair: &WordPair,
        added_at: DateTime<Utc>,
    ) -> Result<bool, StorageError> {
        let mut guard = self.words.lock().map_err(poisoned)?;
        let seq = guard.next_seq;
        let list = guard.user_words.entry(user_id).or_default();
        if list.iter().any(|w| w.pair.english() == pair.english()) {
            return Ok(false);
        }
        list.push(StoredUserWord {
            pair: pair.clone(),
            added_at,
            seq,
        });
        guard.next_seq += 1;
        Ok(true)
    }

    async fn remove_user_word(&self, user_id: UserId, english: &str) -> Result<bool, StorageError> {
        let key = normalize_key(english);
        let mut guard = self.words.lock().map_err(poisoned)?;
        let Some(list) = guard.user_words.get_mut(&user_id) else {
            return Ok(false);
        };
        let before = list.len();
        list.retain(|w| w.pair.english() != key);
        Ok(list.len() != before)
    }

    async fn list_user_words(&self, user_id: UserId) -> Result<Vec<WordPair>, StorageError> {
        let guard = self.words.lock().map_err(poisoned)?;
        let mut words = guard.user_words.get(&user_id).cloned().unwrap_or_default();
        words.sort_by(|a, b| b.added_at.cmp(&a.added_at).then(b.seq.cmp(&a.seq)));
        Ok(words.into_iter().map(|w| w.pair).collect())
    }

    async fn list_default_words(&self, limit: u32) -> Result<Vec<WordPair>, StorageError> {
        let guard = self.words.lock().map_err(poisoned)?;
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        Ok(guard.defaults.iter().take(limit).cloned().collect())
    }

    async fn add_default_word(&self, pair: &WordPair) -> Result<bool, StorageError> {
        let mut guard = self.words.lock().map_err(poisoned)?;
        if guard.defaults.iter().any(|p| p.english() == pair.english()) {
            return Ok(false);
        }
        guard.defaults.push(pair.clone());
        Ok(true)
    }

    async fn translation(
        &self,
        scope: WordScope,
        user_id: UserId,
        english: &str,
    ) -> Result<Option<String>, StorageError> {
        let key = normalize_key(english);
        let guard = self.words.lock().map_err(poisoned)?;
        let found = match scope {
            WordScope::Default => guard
                .defaults
                .iter()
                .find(|p| p.english() == key)
                .map(|p| p.russian().to_owned()),
            WordScope::User => guard.user_words.get(&user_id).and_then(|list| {
                list.iter()
                    .find(|w| w.pair.english() == key)
                    .map(|w| w.pair.russian().to_owned())
            }),
        };
        Ok(found)
    }

    async fn translations_for(
        &self,
        user_id: UserId,
        english: &str,
    ) -> Result<Vec<String>, StorageError> {
        let mut out = Vec::new();
        for scope in [WordScope::Default, WordScope::User] {
            if let Some(t) = self.translation(scope, user_id, english).await? {
                if !out.contains(&t) {
                    out.push(t);
                }
            }
        }
        Ok(out)
    }
}

#[async_trait]
impl QuizRepository for InMemoryRepository {
    async fn create_session(
        &self,
        user_id: UserId,
        started_at: DateTime<Utc>,
    ) -> Result<SessionId, StorageError> {
        let mut guard = self.quizzes.lock().map_err(poisoned)?;
        guard.next_session += 1;
        let id = SessionId::new(guard.next_session);
        guard.sessions.insert(
            id,
            StoredSession {
                user_id,
                started_at,
                ended_at: None,
                totals: None,
            },
        );
        Ok(id)
    }

    async fn append_result(&self, result: &QuestionResult) -> Result<i64, StorageError> {
        let mut guard = self.quizzes.lock().map_err(poisoned)?;
        if !guard.sessions.contains_key(&result.session_id) {
            return Err(StorageError::NotFound);
        }
        guard.results.push(result.clone());
        i64::try_from(guard.results.len())
            .map_err(|_| StorageError::Serialization("result id overflow".into()))
    }

    async fn finalize_session(
        &self,
        id: SessionId,
        totals: QuizTotals,
        ended_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let mut guard = self.quizzes.lock().map_err(poisoned)?;
        let session = guard.sessions.get_mut(&id).ok_or(StorageError::NotFound)?;
        if session.ended_at.is_some() {
            return Err(StorageError::Conflict);
        }
        session.ended_at = Some(ended_at);
        session.totals = Some(totals);
        Ok(())
    }

    async fn get_session(&self, id: SessionId) -> Result<Option<QuizSession>, StorageError> {
        let guard = self.quizzes.lock().map_err(poisoned)?;
        guard
            .sessions
            .get(&id)
            .map(|s| stored_to_session(id, s))
            .transpose()
    }

    async fn results_for_session(
        &self,
        id: SessionId,
    ) -> Result<Vec<QuestionResult>, StorageError> {
        let guard = self.quizzes.lock().map_err(poisoned)?;
        Ok(guard
            .results
            .iter()
            .filter(|r| r.session_id == id)
            .cloned()
            .collect())
    }

    async fn recent_sessions(
        &self,
        user_id: UserId,
        limit: u32,
    ) -> Result<Vec<QuizSession>, StorageError> {
        let guard = self.quizzes.lock().map_err(poisoned)?;
        let mut sessions = guard
            .sessions
            .iter()
            .filter(|(_, s)| s.user_id == user_id)
            .map(|(id, s)| stored_to_session(*id, s))
            .collect::<Result<Vec<_>, _>>()?;
        sessions.sort_by(|a, b| {
            b.started_at()
                .cmp(&a.started_at())
                .then(b.id().cmp(&a.id()))
        });
        sessions.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(sessions)
    }

    async fn quiz_stats(&self, user_id: UserId) -> Result<QuizStats, StorageError> {
        let guard = self.quizzes.lock().map_err(poisoned)?;
        let correct: Vec<u32> = guard
            .sessions
            .values()
            .filter(|s| s.user_id == user_id)
            .filter_map(|s| s.totals.map(|t| t.correct()))
            .collect();
        if correct.is_empty() {
            return Ok(QuizStats::default());
        }
        let sessions = u32::try_from(correct.len())
            .map_err(|_| StorageError::Serialization("session count overflow".into()))?;
        let sum: u64 = correct.iter().map(|c| u64::from(*c)).sum();
        #[allow(clippy::cast_precision_loss)]
        let average_correct = sum as f64 / f64::from(sessions);
        Ok(QuizStats {
            sessions,
            average_correct,
            best_correct: correct.iter().copied().max().unwrap_or(0),
        })
    }
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn add_to_leaderboard(
        &self,
        user_id: UserId,
        correct: u32,
        incorrect: u32,
        at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let mut guard = self.leaderboard.lock().map_err(poisoned)?;
        guard
            .entry(user_id)
            .or_insert_with(|| LeaderboardEntry::empty(user_id))
            .add_session(correct, incorrect, at);
        Ok(())
    }

    async fn leaderboard_entry(
        &self,
        user_id: UserId,
    ) -> Result<Option<LeaderboardEntry>, StorageError> {
        let guard = self.leaderboard.lock().map_err(poisoned)?;
        Ok(guard.get(&user_id).cloned())
    }

    async fn record_word_progress(
        &self,
        user_id: UserId,
        english: &str,
        scope: WordScope,
        correct: bool,
        at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let key = normalize_key(english);
        let mut guard = self.progress.lock().map_err(poisoned)?;
        guard
            .entry((user_id, key.clone(), scope))
            .and_modify(|p| p.record(correct, at))
            .or_insert_with(|| WordProgress::first(user_id, &key, scope, correct, at));
        Ok(())
    }

    async fn word_progress(
        &self,
        user_id: UserId,
        english: &str,
        scope: WordScope,
    ) -> Result<Option<WordProgress>, StorageError> {
        let guard = self.progress.lock().map_err(poisoned)?;
        Ok(guard.get(&(user_id, normalize_key(english), scope)).cloned())
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub users: Arc<dyn UserRepository>,
    pub words: Arc<dyn WordRepository>,
    pub quizzes: Arc<dyn QuizRepository>,
    pub progress: Arc<dyn ProgressRepository>,
}

impl Storage {
    /// In-memory storage with the default words already seeded.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if seeding fails.
    pub fn in_memory() -> Result<Self, StorageError> {
        let repo = InMemoryRepository::new();
        repo.seed_default_words()?;
        Ok(Self::from_repo(repo))
    }

    /// Wire every trait object to one repository value.
    pub fn from_repo<R>(repo: R) -> Self
    where
        R: UserRepository + WordRepository + QuizRepository + ProgressRepository + Clone + 'static,
    {
        Self {
            users: Arc::new(repo.clone()),
            words: Arc::new(repo.clone()),
            quizzes: Arc::new(repo.clone()),
            progress: Arc::new(repo),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use vocab_core::time::fixed_now;

    fn pair(en: &str, ru: &str) -> WordPair {
        WordPair::new(en, ru).unwrap()
    }

    #[tokio::test]
    async fn duplicate_user_word_is_a_no_op() {
        let repo = InMemoryRepository::new();
        let user = UserId::new(1);
        assert!(repo.add_user_word(user, &pair("Apple", "яблоко"), fixed_now()).await.unwrap());
        assert!(!repo.add_user_word(user, &pair("APPLE", "другое"), fixed_now()).await.unwrap());
        assert_eq!(repo.list_user_words(user).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn user_words_are_listed_newest_first() {
        let repo = InMemoryRepository::new();
        let user = UserId::new(1);
        let now = fixed_now();
        repo.add_user_word(user, &pair("cat", "кошка"), now).await.unwrap();
        repo.add_user_word(user, &pair("dog", "собака"), now + Duration::seconds(1))
            .await
            .unwrap();
        let words = repo.list_user_words(user).await.unwrap();
        assert_eq!(words[0].english(), "dog");
        assert_eq!(words[1].english(), "cat");
    }

    #[tokio::test]
    async fn finalize_twice_conflicts() {
        let repo = InMemoryRepository::new();
        let id = repo.create_session(UserId::new(1), fixed_now()).await.unwrap();
        repo.finalize_session(id, QuizTotals::default(), fixed_now())
            .await
            .unwrap();
        let err = repo
            .finalize_session(id, QuizTotals::default(), fixed_now())
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Conflict));
    }

    #[tokio::test]
    async fn translations_merge_scopes() {
        let repo = InMemoryRepository::new();
        let user = UserId::new(3);
        repo.add_default_word(&pair("good", "хорошо")).await.unwrap();
        repo.add_user_word(user, &pair("good", "добрый"), fixed_now())
            .await
            .unwrap();
        let mut all = repo.translations_for(user, "GOOD").await.unwrap();
        all.sort();
        assert_eq!(all, vec!["добрый".to_owned(), "хорошо".to_owned()]);
        assert!(repo.translations_for(UserId::new(4), "good").await.unwrap().len() == 1);
    }
}
