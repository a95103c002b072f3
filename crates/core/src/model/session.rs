use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use crate::model::{SessionId, UserId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizSessionError {
    #[error("ended_at is before started_at")]
    InvalidTimeRange,

    #[error("answered ({answered}) does not match correct + incorrect ({sum})")]
    CountMismatch { answered: u32, sum: u32 },
}

//
// ─── TOTALS ────────────────────────────────────────────────────────────────────
//

/// Running counters of a quiz session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QuizTotals {
    answered: u32,
    correct: u32,
    incorrect: u32,
}

impl QuizTotals {
    /// Rehydrate counters from storage.
    ///
    /// # Errors
    ///
    /// Returns `QuizSessionError::CountMismatch` if the parts do not add up.
    pub fn from_persisted(answered: u32, correct: u32, incorrect: u32) -> Result<Self, QuizSessionError> {
        let sum = correct.saturating_add(incorrect);
        if sum != answered {
            return Err(QuizSessionError::CountMismatch { answered, sum });
        }
        Ok(Self {
            answered,
            correct,
            incorrect,
        })
    }

    /// Count one answered question.
    pub fn record(&mut self, is_correct: bool) {
        self.answered = self.answered.saturating_add(1);
        if is_correct {
            self.correct = self.correct.saturating_add(1);
        } else {
            self.incorrect = self.incorrect.saturating_add(1);
        }
    }

    #[must_use]
    pub fn answered(&self) -> u32 {
        self.answered
    }

    #[must_use]
    pub fn correct(&self) -> u32 {
        self.correct
    }

    #[must_use]
    pub fn incorrect(&self) -> u32 {
        self.incorrect
    }

    /// Share of correct answers, rounded to a whole percent. Zero when nothing was answered.
    #[must_use]
    pub fn percentage(&self) -> u32 {
        if self.answered == 0 {
            return 0;
        }
        let pct = f64::from(self.correct) * 100.0 / f64::from(self.answered);
        // Bounded to 0..=100 by construction.
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let rounded = pct.round() as u32;
        rounded
    }
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One quiz attempt as stored.
///
/// `ended_at` and `totals` are set together when the session is finalized;
/// an open session has neither.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizSession {
    id: SessionId,
    user_id: UserId,
    started_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
    totals: Option<QuizTotals>,
}

impl QuizSession {
    /// Rehydrate a session from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `QuizSessionError::InvalidTimeRange` if `ended_at < started_at`.
    pub fn from_persisted(
        id: SessionId,
        user_id: UserId,
        started_at: DateTime<Utc>,
        ended_at: Option<DateTime<Utc>>,
        totals: Option<QuizTotals>,
    ) -> Result<Self, QuizSessionError> {
        if ended_at.is_some_and(|end| end < started_at) {
            return Err(QuizSessionError::InvalidTimeRange);
        }
        Ok(Self {
            id,
            user_id,
            started_at,
            ended_at,
            totals,
        })
    }

    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
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
    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }

    #[must_use]
    pub fn totals(&self) -> Option<QuizTotals> {
        self.totals
    }

    #[must_use]
    pub fn is_finalized(&self) -> bool {
        self.ended_at.is_some()
    }

    /// Wall time between start and end, if the session has ended.
    #[must_use]
    pub fn duration(&self) -> Option<Duration> {
        self.ended_at.map(|end| end - self.started_at)
    }
}

//
// ─── RESULTS & STATS ───────────────────────────────────────────────────────────
//

/// Outcome of one answered question. Append-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionResult {
    pub session_id: SessionId,
    /// The english key of the word that was asked.
    pub word: String,
    pub correct_answer: String,
    /// What the user typed, after normalization.
    pub user_answer: String,
    pub is_correct: bool,
    pub answered_at: DateTime<Utc>,
}

/// Aggregate over every session of a user.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct QuizStats {
    pub sessions: u32,
    pub average_correct: f64,
    pub best_correct: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn totals_count_answers() {
        let mut totals = QuizTotals::default();
        totals.record(true);
        totals.record(false);
        totals.record(true);
        assert_eq!(totals.answered(), 3);
        assert_eq!(totals.correct(), 2);
        assert_eq!(totals.incorrect(), 1);
        assert_eq!(totals.percentage(), 67);
    }

    #[test]
    fn totals_reject_mismatched_counts() {
        assert_eq!(
            QuizTotals::from_persisted(3, 1, 1),
            Err(QuizSessionError::CountMismatch { answered: 3, sum: 2 })
        );
    }

    #[test]
    fn empty_totals_have_zero_percentage() {
        assert_eq!(QuizTotals::default().percentage(), 0);
    }

    #[test]
    fn session_rejects_end_before_start() {
        let now = fixed_now();
        let result = QuizSession::from_persisted(
            SessionId::new(1),
            UserId::new(7),
            now,
            Some(now - Duration::seconds(1)),
            None,
        );
        assert_eq!(result, Err(QuizSessionError::InvalidTimeRange));
    }

    #[test]
    fn session_duration_only_when_ended() {
        let now = fixed_now();
        let open =
            QuizSession::from_persisted(SessionId::new(1), UserId::new(7), now, None, None).unwrap();
        assert!(open.duration().is_none());
        assert!(!open.is_finalized());

        let closed = QuizSession::from_persisted(
            SessionId::new(1),
            UserId::new(7),
            now,
            Some(now + Duration::seconds(95)),
            Some(QuizTotals::default()),
        )
        .unwrap();
        assert_eq!(closed.duration(), Some(Duration::seconds(95)));
    }
}
