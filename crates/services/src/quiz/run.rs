use chrono::{DateTime, Utc};
use vocab_core::model::{QuestionResult, QuizStats, QuizTotals, SessionId, UserId};
use vocab_core::quiz::{Direction, Question, WordPool};

/// In-progress quiz held in conversation state.
///
/// Created by `QuizService::start`; consumed by `finish` or `cancel`, so a
/// run can only ever be finalized once.
#[derive(Debug, Clone)]
pub struct QuizRun {
    pub(crate) session_id: SessionId,
    pub(crate) user_id: UserId,
    pub(crate) started_at: DateTime<Utc>,
    pub(crate) pool: WordPool,
    pub(crate) totals: QuizTotals,
    pub(crate) current: Option<Question>,
    pub(crate) results: Vec<QuestionResult>,
}

impl QuizRun {
    #[must_use]
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn totals(&self) -> QuizTotals {
        self.totals
    }

    /// The question waiting for an answer.
    #[must_use]
    pub fn current(&self) -> Option<&Question> {
        self.current.as_ref()
    }

    /// Answered questions in order, as recorded in memory.
    #[must_use]
    pub fn results(&self) -> &[QuestionResult] {
        &self.results
    }

    #[must_use]
    pub fn pool_size(&self) -> usize {
        self.pool.len()
    }
}

/// What the user learns after answering one question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerFeedback {
    pub is_correct: bool,
    /// The answer after normalization.
    pub answer: String,
    pub expected: String,
    pub direction: Direction,
    /// Text that was shown as the prompt.
    pub prompt: String,
    /// Other accepted translations, only for english-to-russian questions.
    pub alternatives: Vec<String>,
    pub next: Option<Question>,
}

/// Summary produced when a quiz ends.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizReport {
    pub session_id: SessionId,
    pub totals: QuizTotals,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    /// Lifetime stats; `None` when they could not be loaded.
    pub stats: Option<QuizStats>,
    /// The last few answered questions, oldest first.
    pub recent: Vec<QuestionResult>,
    /// Whether the final counters reached the store.
    pub saved: bool,
}
