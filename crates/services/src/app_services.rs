use std::sync::Arc;

use storage::repository::Storage;
use storage::sqlite::SqliteRepository;
use tracing::info;
use vocab_core::Dictionary;

use crate::Clock;
use crate::config::AppConfig;
use crate::dictionary::load_dictionary;
use crate::error::AppServicesError;
use crate::quiz::{HistoryService, QuizService};
use crate::user_service::UserService;
use crate::word_service::WordService;

/// Assembles app-facing services over one storage backend and dictionary.
#[derive(Clone)]
pub struct AppServices {
    clock: Clock,
    users: UserService,
    words: WordService,
    quiz: QuizService,
    history: HistoryService,
    sqlite: Option<SqliteRepository>,
}

impl AppServices {
    /// Open the `SQLite` store, run migrations and load the dictionary file.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the store cannot be opened or migrated.
    /// A missing or broken dictionary file is not an error.
    pub async fn new_sqlite(config: &AppConfig, clock: Clock) -> Result<Self, AppServicesError> {
        let (storage, repo) = Storage::sqlite(&config.db_url, config.pool).await?;
        info!(
            db_url = %config.db_url,
            max_connections = config.pool.max_connections,
            "storage ready"
        );
        let dictionary = load_dictionary(&config.dictionary_path).await;

        let mut services = Self::from_storage(&storage, dictionary, config, clock);
        services.sqlite = Some(repo);
        Ok(services)
    }

    /// Seeded in-memory storage, for tests and trial runs.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError::Storage` if seeding fails.
    pub fn in_memory(
        dictionary: Dictionary,
        config: &AppConfig,
        clock: Clock,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::in_memory()?;
        Ok(Self::from_storage(&storage, dictionary, config, clock))
    }

    /// Wire services over an already built storage.
    #[must_use]
    pub fn from_storage(
        storage: &Storage,
        dictionary: Dictionary,
        config: &AppConfig,
        clock: Clock,
    ) -> Self {
        let dictionary = Arc::new(dictionary);
        Self {
            clock,
            users: UserService::new(clock, Arc::clone(&storage.users)),
            words: WordService::new(
                clock,
                Arc::clone(&storage.words),
                Arc::clone(&dictionary),
                config.default_words_limit,
            ),
            quiz: QuizService::new(clock, storage, dictionary, config.default_words_limit),
            history: HistoryService::new(Arc::clone(&storage.quizzes), config.history_limit),
            sqlite: None,
        }
    }

    /// Replace the quiz service, e.g. with a seeded one.
    #[must_use]
    pub fn with_quiz(mut self, quiz: QuizService) -> Self {
        self.quiz = quiz;
        self
    }

    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock
    }

    #[must_use]
    pub fn users(&self) -> &UserService {
        &self.users
    }

    #[must_use]
    pub fn words(&self) -> &WordService {
        &self.words
    }

    #[must_use]
    pub fn quiz(&self) -> &QuizService {
        &self.quiz
    }

    #[must_use]
    pub fn history(&self) -> &HistoryService {
        &self.history
    }

    /// Close the connection pool, if there is one.
    pub async fn close(&self) {
        if let Some(repo) = &self.sqlite {
            repo.close().await;
            info!("storage closed");
        }
    }
}
