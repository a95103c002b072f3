use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use services::conversation::render::GENERIC_ERROR;
use services::{
    Action, AppConfig, AppServices, ChatController, Clock, Incoming, QuizError, QuizRun,
    QuizService,
};
use storage::repository::{
    InMemoryRepository, ProgressRepository, QuizRepository, Storage, StorageError, WordRepository,
};
use vocab_core::Dictionary;
use vocab_core::model::{
    QuestionResult, QuizSession, QuizStats, QuizTotals, SessionId, UserId, WordPair, WordScope,
};
use vocab_core::quiz::Direction;
use vocab_core::time::fixed_now;

fn outage() -> StorageError {
    StorageError::Connection("timeout".into())
}

/// Word store whose lookups can be switched off.
struct FlakyWords {
    inner: InMemoryRepository,
    fail_reads: AtomicBool,
    fail_lists: AtomicBool,
}

#[async_trait]
impl WordRepository for FlakyWords {
    async fn add_user_word(
        &self,
        user_id: UserId,
        pair: &WordPair,
        added_at: DateTime<Utc>,
    ) -> Result<bool, StorageError> {
        self.inner.add_user_word(user_id, pair, added_at).await
    }

    async fn remove_user_word(&self, user_id: UserId, english: &str) -> Result<bool, StorageError> {
        self.inner.remove_user_word(user_id, english).await
    }

    async fn list_user_words(&self, user_id: UserId) -> Result<Vec<WordPair>, StorageError> {
        self.inner.list_user_words(user_id).await
    }

    async fn list_default_words(&self, limit: u32) -> Result<Vec<WordPair>, StorageError> {
        if self.fail_lists.load(Ordering::SeqCst) {
            return Err(outage());
        }
        self.inner.list_default_words(limit).await
    }

    async fn add_default_word(&self, pair: &WordPair) -> Result<bool, StorageError> {
        self.inner.add_default_word(pair).await
    }

    async fn translation(
        &self,
        scope: WordScope,
        user_id: UserId,
        english: &str,
    ) -> Result<Option<String>, StorageError> {
        self.inner.translation(scope, user_id, english).await
    }

    async fn translations_for(
        &self,
        user_id: UserId,
        english: &str,
    ) -> Result<Vec<String>, StorageError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(outage());
        }
        self.inner.translations_for(user_id, english).await
    }
}

/// Quiz store whose result and finalize writes can be switched off.
struct FlakyQuizzes {
    inner: InMemoryRepository,
    fail_appends: AtomicBool,
    fail_finalize: AtomicBool,
}

#[async_trait]
impl QuizRepository for FlakyQuizzes {
    async fn create_session(
        &self,
        user_id: UserId,
        started_at: DateTime<Utc>,
    ) -> Result<SessionId, StorageError> {
        self.inner.create_session(user_id, started_at).await
    }

    async fn append_result(&self, result: &QuestionResult) -> Result<i64, StorageError> {
        if self.fail_appends.load(Ordering::SeqCst) {
            return Err(outage());
        }
        self.inner.append_result(result).await
    }

    async fn finalize_session(
        &self,
        id: SessionId,
        totals: QuizTotals,
        ended_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        if self.fail_finalize.load(Ordering::SeqCst) {
            return Err(outage());
        }
        self.inner.finalize_session(id, totals, ended_at).await
    }

    async fn get_session(&self, id: SessionId) -> Result<Option<QuizSession>, StorageError> {
        self.inner.get_session(id).await
    }

    async fn results_for_session(
        &self,
        id: SessionId,
    ) -> Result<Vec<QuestionResult>, StorageError> {
        self.inner.results_for_session(id).await
    }

    async fn recent_sessions(
        &self,
        user_id: UserId,
        limit: u32,
    ) -> Result<Vec<QuizSession>, StorageError> {
        self.inner.recent_sessions(user_id, limit).await
    }

    async fn quiz_stats(&self, user_id: UserId) -> Result<QuizStats, StorageError> {
        self.inner.quiz_stats(user_id).await
    }
}

struct Fixture {
    repo: InMemoryRepository,
    words: Arc<FlakyWords>,
    quizzes: Arc<FlakyQuizzes>,
    storage: Storage,
}

fn fixture() -> Fixture {
    let repo = InMemoryRepository::new();
    let words = Arc::new(FlakyWords {
        inner: repo.clone(),
        fail_reads: AtomicBool::new(false),
        fail_lists: AtomicBool::new(false),
    });
    let quizzes = Arc::new(FlakyQuizzes {
        inner: repo.clone(),
        fail_appends: AtomicBool::new(false),
        fail_finalize: AtomicBool::new(false),
    });
    let storage = Storage {
        users: Arc::new(repo.clone()),
        words: Arc::clone(&words) as Arc<dyn WordRepository>,
        quizzes: Arc::clone(&quizzes) as Arc<dyn QuizRepository>,
        progress: Arc::new(repo.clone()),
    };
    Fixture {
        repo,
        words,
        quizzes,
        storage,
    }
}

impl Fixture {
    fn quiz(&self, seed: u64) -> QuizService {
        QuizService::with_seed(
            Clock::fixed(fixed_now()),
            &self.storage,
            Arc::new(Dictionary::empty()),
            12,
            seed,
        )
    }

    async fn good_with_synonym(&self, user: UserId) {
        let good = WordPair::new("good", "хорошо").unwrap();
        let kind = WordPair::new("good", "добрый").unwrap();
        self.repo.add_default_word(&good).await.unwrap();
        self.repo.add_user_word(user, &kind, fixed_now()).await.unwrap();
    }
}

async fn advance_to(service: &QuizService, run: &mut QuizRun, direction: Direction) {
    for _ in 0..64 {
        let current = run.current().expect("pending question");
        if current.direction == direction {
            return;
        }
        let expected = current.expected().to_owned();
        service.answer(run, &expected).await.unwrap();
    }
    panic!("no {direction:?} question drawn");
}

#[tokio::test]
async fn failed_translation_read_aborts_the_answer() {
    let f = fixture();
    let user = UserId::new(1);
    f.good_with_synonym(user).await;
    let service = f.quiz(5);

    let mut run = service.start(user).await.unwrap();
    advance_to(&service, &mut run, Direction::EnglishToRussian).await;
    let before = run.totals();
    let results_before = run.results().len();

    f.words.fail_reads.store(true, Ordering::SeqCst);
    let err = service.answer(&mut run, "добрый").await.unwrap_err();
    assert!(matches!(err, QuizError::Storage(_)));
    assert_eq!(run.totals(), before);
    assert_eq!(run.results().len(), results_before);
    assert_eq!(
        run.current().map(|q| q.direction),
        Some(Direction::EnglishToRussian)
    );

    f.words.fail_reads.store(false, Ordering::SeqCst);
    let feedback = service.answer(&mut run, "добрый").await.unwrap();
    assert!(feedback.is_correct);
    assert_eq!(run.totals().incorrect(), before.incorrect());
}

#[tokio::test]
async fn failed_result_writes_do_not_stop_the_counters() {
    let f = fixture();
    f.repo.seed_default_words().unwrap();
    let service = f.quiz(21);
    let user = UserId::new(2);

    let mut run = service.start(user).await.unwrap();
    f.quizzes.fail_appends.store(true, Ordering::SeqCst);
    for _ in 0..3 {
        service.answer(&mut run, "не знаю").await.unwrap();
    }

    assert_eq!(run.totals().answered(), 3);
    assert_eq!(run.totals().incorrect(), 3);
    assert!(
        f.repo
            .results_for_session(run.session_id())
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn unsaved_session_is_kept_off_the_leaderboard() {
    let f = fixture();
    f.repo.seed_default_words().unwrap();
    let service = f.quiz(8);
    let user = UserId::new(3);

    let mut run = service.start(user).await.unwrap();
    service.answer(&mut run, "не знаю").await.unwrap();
    f.quizzes.fail_finalize.store(true, Ordering::SeqCst);
    let report = service.finish(run).await;

    assert!(!report.saved);
    assert_eq!(report.totals.answered(), 1);
    assert!(f.repo.leaderboard_entry(user).await.unwrap().is_none());
}

impl Fixture {
    fn controller(&self, seed: u64) -> ChatController {
        let config = AppConfig::default();
        let clock = Clock::fixed(fixed_now());
        let services = AppServices::from_storage(&self.storage, Dictionary::empty(), &config, clock)
            .with_quiz(self.quiz(seed));
        ChatController::new(&services, &config)
    }
}

#[tokio::test]
async fn storage_outage_mid_quiz_apologizes_and_keeps_the_quiz() {
    let f = fixture();
    let user = UserId::new(4);
    f.good_with_synonym(user).await;
    let controller = f.controller(5);

    controller.handle(Incoming::button(user, &Action::StartQuiz)).await;
    f.words.fail_reads.store(true, Ordering::SeqCst);
    let mut reply = None;
    for _ in 0..64 {
        let r = controller.handle(Incoming::text(user, "good")).await;
        if r.messages[0].text == GENERIC_ERROR {
            reply = Some(r);
            break;
        }
    }

    let reply = reply.expect("an english prompt was drawn");
    assert_eq!(reply.messages.len(), 1);
    assert_eq!(controller.states().state_name(user), "in_quiz");
}

#[tokio::test]
async fn quiz_report_survives_a_failing_menu() {
    let f = fixture();
    f.repo.seed_default_words().unwrap();
    let user = UserId::new(5);
    let controller = f.controller(13);

    controller.handle(Incoming::button(user, &Action::StartQuiz)).await;
    controller.handle(Incoming::text(user, "не знаю")).await;
    f.words.fail_lists.store(true, Ordering::SeqCst);
    let reply = controller.handle(Incoming::button(user, &Action::EndQuiz)).await;

    assert_eq!(reply.messages.len(), 1);
    assert!(reply.messages[0].text.contains("Всего вопросов: 1"));
    assert_eq!(controller.states().state_name(user), "idle");
    let sessions = f.repo.recent_sessions(user, 5).await.unwrap();
    assert!(sessions[0].is_finalized());
}
