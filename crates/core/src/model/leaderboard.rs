use chrono::{DateTime, Utc};

use crate::model::{UserId, WordScope};

/// Lifetime quiz statistics of one user. Only ever grows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardEntry {
    pub user_id: UserId,
    pub total_tests: u32,
    pub total_correct: u32,
    pub total_incorrect: u32,
    pub last_test: Option<DateTime<Utc>>,
}

impl LeaderboardEntry {
    #[must_use]
    pub fn empty(user_id: UserId) -> Self {
        Self {
            user_id,
            total_tests: 0,
            total_correct: 0,
            total_incorrect: 0,
            last_test: None,
        }
    }

    /// Fold one completed session into the running totals.
    pub fn add_session(&mut self, correct: u32, incorrect: u32, at: DateTime<Utc>) {
        self.total_tests = self.total_tests.saturating_add(1);
        self.total_correct = self.total_correct.saturating_add(correct);
        self.total_incorrect = self.total_incorrect.saturating_add(incorrect);
        self.last_test = Some(at);
    }
}

/// How often a user has seen, and got right, one stored word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordProgress {
    pub user_id: UserId,
    pub english: String,
    pub scope: WordScope,
    pub times_shown: u32,
    pub times_correct: u32,
    pub last_shown: DateTime<Utc>,
}

impl WordProgress {
    #[must_use]
    pub fn first(user_id: UserId, english: &str, scope: WordScope, correct: bool, at: DateTime<Utc>) -> Self {
        Self {
            user_id,
            english: english.to_owned(),
            scope,
            times_shown: 1,
            times_correct: u32::from(correct),
            last_shown: at,
        }
    }

    pub fn record(&mut self, correct: bool, at: DateTime<Utc>) {
        self.times_shown = self.times_shown.saturating_add(1);
        self.times_correct = self.times_correct.saturating_add(u32::from(correct));
        self.last_shown = at;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn leaderboard_accumulates_sessions() {
        let mut entry = LeaderboardEntry::empty(UserId::new(1));
        entry.add_session(3, 1, fixed_now());
        entry.add_session(2, 2, fixed_now());
        assert_eq!(entry.total_tests, 2);
        assert_eq!(entry.total_correct, 5);
        assert_eq!(entry.total_incorrect, 3);
        assert_eq!(entry.last_test, Some(fixed_now()));
    }

    #[test]
    fn progress_counts_views() {
        let mut progress = WordProgress::first(UserId::new(1), "cat", WordScope::User, false, fixed_now());
        progress.record(true, fixed_now());
        assert_eq!(progress.times_shown, 2);
        assert_eq!(progress.times_correct, 1);
    }
}
