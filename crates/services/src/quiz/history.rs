use std::sync::Arc;

use storage::repository::QuizRepository;
use vocab_core::model::{QuestionResult, QuizSession, QuizStats, UserId};

use crate::error::HistoryError;

/// The most recent session together with its answers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastResults {
    pub session: QuizSession,
    pub results: Vec<QuestionResult>,
}

/// Read-only access to past quizzes.
#[derive(Clone)]
pub struct HistoryService {
    quizzes: Arc<dyn QuizRepository>,
    limit: u32,
}

impl HistoryService {
    #[must_use]
    pub fn new(quizzes: Arc<dyn QuizRepository>, limit: u32) -> Self {
        Self { quizzes, limit }
    }

    /// Latest sessions, newest first, including unfinished ones.
    ///
    /// # Errors
    ///
    /// Returns `HistoryError::Storage` if repository access fails.
    pub async fn recent(&self, user_id: UserId) -> Result<Vec<QuizSession>, HistoryError> {
        Ok(self.quizzes.recent_sessions(user_id, self.limit).await?)
    }

    /// Answers of the user's most recent session, if any.
    ///
    /// # Errors
    ///
    /// Returns `HistoryError::Storage` if repository access fails.
    pub async fn last_results(&self, user_id: UserId) -> Result<Option<LastResults>, HistoryError> {
        let Some(session) = self.quizzes.recent_sessions(user_id, 1).await?.into_iter().next()
        else {
            return Ok(None);
        };
        let results = self.quizzes.results_for_session(session.id()).await?;
        Ok(Some(LastResults { session, results }))
    }

    /// # Errors
    ///
    /// Returns `HistoryError::Storage` if repository access fails.
    pub async fn stats(&self, user_id: UserId) -> Result<QuizStats, HistoryError> {
        Ok(self.quizzes.quiz_stats(user_id).await?)
    }
}
