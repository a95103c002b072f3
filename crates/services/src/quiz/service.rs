use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use rand::SeedableRng;
use rand::rngs::StdRng;
use storage::repository::{ProgressRepository, QuizRepository, Storage, WordRepository};
use tracing::{debug, error, info, warn};
use vocab_core::Dictionary;
use vocab_core::model::{QuestionResult, UserId, WordPair};
use vocab_core::quiz::{Direction, Question, WordPool};

use super::REPORT_RECENT_RESULTS;
use super::run::{AnswerFeedback, QuizReport, QuizRun};
use crate::Clock;
use crate::error::QuizError;

/// Runs quizzes: builds the word pool, judges answers and records outcomes.
///
/// Store writes after the session row exists are best effort: failures are
/// logged and the in-memory counters keep going. Failed reads abort the call.
#[derive(Clone)]
pub struct QuizService {
    clock: Clock,
    words: Arc<dyn WordRepository>,
    quizzes: Arc<dyn QuizRepository>,
    progress: Arc<dyn ProgressRepository>,
    dictionary: Arc<Dictionary>,
    default_limit: u32,
    rng: Arc<Mutex<StdRng>>,
}

impl QuizService {
    #[must_use]
    pub fn new(
        clock: Clock,
        storage: &Storage,
        dictionary: Arc<Dictionary>,
        default_limit: u32,
    ) -> Self {
        Self::with_rng(clock, storage, dictionary, default_limit, StdRng::from_os_rng())
    }

    /// Same as [`QuizService::new`] but with a reproducible question order.
    #[must_use]
    pub fn with_seed(
        clock: Clock,
        storage: &Storage,
        dictionary: Arc<Dictionary>,
        default_limit: u32,
        seed: u64,
    ) -> Self {
        Self::with_rng(
            clock,
            storage,
            dictionary,
            default_limit,
            StdRng::seed_from_u64(seed),
        )
    }

    fn with_rng(
        clock: Clock,
        storage: &Storage,
        dictionary: Arc<Dictionary>,
        default_limit: u32,
        rng: StdRng,
    ) -> Self {
        Self {
            clock,
            words: Arc::clone(&storage.words),
            quizzes: Arc::clone(&storage.quizzes),
            progress: Arc::clone(&storage.progress),
            dictionary,
            default_limit,
            rng: Arc::new(Mutex::new(rng)),
        }
    }

    /// Every word the user can be asked about, shared list first.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Storage` if the word lists cannot be read.
    pub async fn word_pool(&self, user_id: UserId) -> Result<WordPool, QuizError> {
        let default = self.words.list_default_words(self.default_limit).await?;
        let user = self.words.list_user_words(user_id).await?;
        let dictionary: &[WordPair] = self.dictionary.entries();
        Ok(WordPool::merge(&default, &user, dictionary))
    }

    /// Open a session and draw the first question.
    ///
    /// No session row is created when the pool is empty.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NoWordsAvailable` if there is nothing to ask.
    /// Returns `QuizError::Storage` if the word lists or the session row fail.
    pub async fn start(&self, user_id: UserId) -> Result<QuizRun, QuizError> {
        let pool = self.word_pool(user_id).await?;
        if pool.is_empty() {
            warn!(user_id = %user_id, "no words available for a quiz");
            return Err(QuizError::NoWordsAvailable);
        }

        let started_at = self.clock.now();
        let session_id = self.quizzes.create_session(user_id, started_at).await?;
        let current = self.pick(&pool);
        info!(user_id = %user_id, session_id = %session_id, pool = pool.len(), "quiz started");

        Ok(QuizRun {
            session_id,
            user_id,
            started_at,
            pool,
            totals: Default::default(),
            current,
            results: Vec::new(),
        })
    }

    /// Judge the answer to the pending question and draw the next one.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::MissingQuestion` if the run has no pending question.
    /// Returns `QuizError::Storage` if stored translations cannot be read; the
    /// question stays pending and nothing is counted.
    pub async fn answer(&self, run: &mut QuizRun, raw: &str) -> Result<AnswerFeedback, QuizError> {
        let pending = run.current.as_ref().ok_or(QuizError::MissingQuestion)?;
        let translations = match pending.direction {
            Direction::EnglishToRussian => {
                self.translations(run.user_id, pending.english()).await?
            }
            Direction::RussianToEnglish => BTreeSet::new(),
        };
        let question = run.current.take().ok_or(QuizError::MissingQuestion)?;
        let check = question.check(raw, &translations);
        let now = self.clock.now();

        run.totals.record(check.is_correct);
        let result = QuestionResult {
            session_id: run.session_id,
            word: question.english().to_owned(),
            correct_answer: question.expected().to_owned(),
            user_answer: check.answer.clone(),
            is_correct: check.is_correct,
            answered_at: now,
        };
        if let Err(err) = self.quizzes.append_result(&result).await {
            warn!(session_id = %run.session_id, error = %err, "failed to store question result");
        }
        if let Some(scope) = question.word.source.scope() {
            if let Err(err) = self
                .progress
                .record_word_progress(run.user_id, question.english(), scope, check.is_correct, now)
                .await
            {
                warn!(user_id = %run.user_id, error = %err, "failed to update word progress");
            }
        }
        run.results.push(result);

        let alternatives = match question.direction {
            Direction::EnglishToRussian => check
                .accepted
                .iter()
                .filter(|t| t.as_str() != question.expected())
                .cloned()
                .collect(),
            Direction::RussianToEnglish => Vec::new(),
        };
        run.current = self.pick(&run.pool);
        debug!(
            session_id = %run.session_id,
            correct = check.is_correct,
            answered = run.totals.answered(),
            "answer recorded"
        );

        Ok(AnswerFeedback {
            is_correct: check.is_correct,
            answer: check.answer,
            expected: question.expected().to_owned(),
            direction: question.direction,
            prompt: question.prompt().to_owned(),
            alternatives,
            next: run.current.clone(),
        })
    }

    /// Finalize the session, update the leaderboard and build the report.
    pub async fn finish(&self, run: QuizRun) -> QuizReport {
        let ended_at = self.clock.now();
        let saved = self.finalize(&run, ended_at).await;

        // Lifetime totals only count sessions stored as ended.
        if saved {
            if let Err(err) = self
                .progress
                .add_to_leaderboard(
                    run.user_id,
                    run.totals.correct(),
                    run.totals.incorrect(),
                    ended_at,
                )
                .await
            {
                error!(user_id = %run.user_id, error = %err, "failed to update leaderboard");
            }
        }

        let stats = match self.quizzes.quiz_stats(run.user_id).await {
            Ok(stats) => Some(stats),
            Err(err) => {
                warn!(user_id = %run.user_id, error = %err, "failed to load quiz stats");
                None
            }
        };
        info!(
            user_id = %run.user_id,
            session_id = %run.session_id,
            answered = run.totals.answered(),
            correct = run.totals.correct(),
            "quiz finished"
        );

        let skip = run.results.len().saturating_sub(REPORT_RECENT_RESULTS);
        QuizReport {
            session_id: run.session_id,
            totals: run.totals,
            started_at: run.started_at,
            ended_at,
            stats,
            recent: run.results.into_iter().skip(skip).collect(),
            saved,
        }
    }

    /// Stop a quiz early.
    ///
    /// The session is finalized only when something was answered; the
    /// leaderboard is left alone. Returns whether progress was saved.
    pub async fn cancel(&self, run: QuizRun) -> bool {
        if run.totals.answered() == 0 {
            debug!(session_id = %run.session_id, "quiz cancelled before any answer");
            return false;
        }
        let saved = self.finalize(&run, self.clock.now()).await;
        info!(session_id = %run.session_id, saved, "quiz cancelled");
        saved
    }

    async fn finalize(&self, run: &QuizRun, ended_at: DateTime<Utc>) -> bool {
        match self
            .quizzes
            .finalize_session(run.session_id, run.totals, ended_at)
            .await
        {
            Ok(()) => true,
            Err(err) => {
                error!(session_id = %run.session_id, error = %err, "failed to finalize quiz session");
                false
            }
        }
    }

    async fn translations(
        &self,
        user_id: UserId,
        english: &str,
    ) -> Result<BTreeSet<String>, QuizError> {
        let mut set: BTreeSet<String> = self.dictionary.alternatives(english).into_iter().collect();
        set.extend(self.words.translations_for(user_id, english).await?);
        Ok(set)
    }

    fn pick(&self, pool: &WordPool) -> Option<Question> {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        pool.pick(&mut *rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storage::repository::InMemoryRepository;
    use vocab_core::quiz::{PoolWord, WordSource};
    use vocab_core::time::fixed_clock;

    fn storage() -> (Storage, InMemoryRepository) {
        let repo = InMemoryRepository::new();
        (Storage::from_repo(repo.clone()), repo)
    }

    fn pair(en: &str, ru: &str) -> WordPair {
        WordPair::new(en, ru).unwrap()
    }

    #[tokio::test]
    async fn empty_pool_creates_no_session() {
        let (storage, repo) = storage();
        let service = QuizService::with_seed(fixed_clock(), &storage, Arc::new(Dictionary::empty()), 12, 1);
        let user = UserId::new(1);

        let err = service.start(user).await.unwrap_err();
        assert!(matches!(err, QuizError::NoWordsAvailable));
        assert!(repo.recent_sessions(user, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_question_is_reported() {
        let (storage, _) = storage();
        storage.words.add_default_word(&pair("cat", "кошка")).await.unwrap();
        let service = QuizService::with_seed(fixed_clock(), &storage, Arc::new(Dictionary::empty()), 12, 1);

        let mut run = service.start(UserId::new(1)).await.unwrap();
        run.current = None;
        let err = service.answer(&mut run, "кошка").await.unwrap_err();
        assert!(matches!(err, QuizError::MissingQuestion));
    }

    #[tokio::test]
    async fn english_to_russian_feedback_lists_other_translations() {
        let (storage, _) = storage();
        let user = UserId::new(2);
        storage.words.add_default_word(&pair("good", "хорошо")).await.unwrap();
        storage
            .words
            .add_user_word(user, &pair("good", "добрый"), vocab_core::time::fixed_now())
            .await
            .unwrap();
        let service = QuizService::with_seed(fixed_clock(), &storage, Arc::new(Dictionary::empty()), 12, 3);

        let mut run = service.start(user).await.unwrap();
        run.current = Some(Question::new(
            PoolWord {
                pair: pair("good", "хорошо"),
                source: WordSource::Default,
            },
            Direction::EnglishToRussian,
        ));

        let feedback = service.answer(&mut run, "Добрый").await.unwrap();
        assert!(feedback.is_correct);
        assert_eq!(feedback.alternatives, vec!["добрый".to_owned()]);
        assert!(feedback.next.is_some());
        assert_eq!(run.totals().correct(), 1);
    }

    #[tokio::test]
    async fn cancel_without_answers_leaves_session_open() {
        let (storage, repo) = storage();
        storage.words.add_default_word(&pair("cat", "кошка")).await.unwrap();
        let service = QuizService::with_seed(fixed_clock(), &storage, Arc::new(Dictionary::empty()), 12, 1);
        let user = UserId::new(3);

        let run = service.start(user).await.unwrap();
        let id = run.session_id();
        assert!(!service.cancel(run).await);
        let session = repo.get_session(id).await.unwrap().unwrap();
        assert!(!session.is_finalized());
        assert!(repo.leaderboard_entry(user).await.unwrap().is_none());
    }
}
