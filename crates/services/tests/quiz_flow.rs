use std::sync::Arc;

use services::{Clock, QuizError, QuizRun, QuizService};
use storage::repository::{
    InMemoryRepository, ProgressRepository, QuizRepository, Storage, StorageError, WordRepository,
};
use vocab_core::Dictionary;
use vocab_core::model::{UserId, WordPair, WordScope};
use vocab_core::quiz::Direction;
use vocab_core::time::fixed_now;

fn pair(en: &str, ru: &str) -> WordPair {
    WordPair::new(en, ru).unwrap()
}

fn quiz_service(repo: &InMemoryRepository, dictionary: Dictionary, seed: u64) -> QuizService {
    let storage = Storage::from_repo(repo.clone());
    QuizService::with_seed(Clock::fixed(fixed_now()), &storage, Arc::new(dictionary), 12, seed)
}

/// Answer with the expected side until a question in `direction` is pending.
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
async fn quiz_with_no_words_creates_no_session() {
    let repo = InMemoryRepository::new();
    let service = quiz_service(&repo, Dictionary::empty(), 1);
    let user = UserId::new(1);

    let err = service.start(user).await.unwrap_err();
    assert!(matches!(err, QuizError::NoWordsAvailable));
    assert!(repo.recent_sessions(user, 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn stored_counts_match_result_rows() {
    let repo = InMemoryRepository::new();
    repo.seed_default_words().unwrap();
    let service = quiz_service(&repo, Dictionary::empty(), 42);
    let user = UserId::new(2);

    let mut run = service.start(user).await.unwrap();
    for i in 0..7 {
        let answer = if i % 3 == 0 {
            "definitely wrong".to_owned()
        } else {
            run.current().unwrap().expected().to_owned()
        };
        service.answer(&mut run, &answer).await.unwrap();
    }
    let id = run.session_id();
    let report = service.finish(run).await;
    assert!(report.saved);
    assert_eq!(report.totals.answered(), 7);
    assert_eq!(report.totals.incorrect(), 3);
    assert_eq!(report.recent.len(), 3);

    let session = repo.get_session(id).await.unwrap().expect("session");
    let totals = session.totals().expect("finalized");
    let rows = repo.results_for_session(id).await.unwrap();
    assert_eq!((totals.correct() + totals.incorrect()) as usize, rows.len());
    assert_eq!(rows.iter().filter(|r| r.is_correct).count(), 4);

    let stats = report.stats.expect("stats");
    assert_eq!(stats.sessions, 1);
    assert_eq!(stats.best_correct, 4);

    let entry = repo.leaderboard_entry(user).await.unwrap().expect("leaderboard");
    assert_eq!((entry.total_tests, entry.total_correct, entry.total_incorrect), (1, 4, 3));

    let again = repo
        .finalize_session(id, totals, fixed_now())
        .await
        .unwrap_err();
    assert!(matches!(again, StorageError::Conflict));
}

#[tokio::test]
async fn any_stored_translation_is_accepted_for_english_prompts() {
    let repo = InMemoryRepository::new();
    let user = UserId::new(3);
    repo.add_default_word(&pair("good", "хорошо")).await.unwrap();
    repo.add_user_word(user, &pair("good", "добрый"), fixed_now())
        .await
        .unwrap();
    let service = quiz_service(&repo, Dictionary::empty(), 5);

    let mut run = service.start(user).await.unwrap();
    advance_to(&service, &mut run, Direction::EnglishToRussian).await;
    let feedback = service.answer(&mut run, "добрый").await.unwrap();

    assert!(feedback.is_correct);
    assert_eq!(feedback.expected, "хорошо");
}

#[tokio::test]
async fn typo_is_corrected_for_russian_prompts() {
    let repo = InMemoryRepository::new();
    repo.add_default_word(&pair("water", "вода")).await.unwrap();
    let service = quiz_service(&repo, Dictionary::empty(), 9);

    let mut run = service.start(UserId::new(4)).await.unwrap();
    advance_to(&service, &mut run, Direction::RussianToEnglish).await;
    let feedback = service.answer(&mut run, "Ватер").await.unwrap();

    assert!(feedback.is_correct);
    assert_eq!(feedback.answer, "water");
}

#[tokio::test]
async fn wrong_answer_to_russian_prompt_echoes_the_prompt() {
    let repo = InMemoryRepository::new();
    repo.add_default_word(&pair("water", "вода")).await.unwrap();
    let service = quiz_service(&repo, Dictionary::empty(), 11);

    let mut run = service.start(UserId::new(5)).await.unwrap();
    advance_to(&service, &mut run, Direction::RussianToEnglish).await;
    let feedback = service.answer(&mut run, "fire").await.unwrap();

    assert!(!feedback.is_correct);
    assert_eq!(feedback.prompt, "вода");
    assert!(feedback.alternatives.is_empty());
}

#[tokio::test]
async fn dictionary_words_are_quizzed_but_not_tracked() {
    let repo = InMemoryRepository::new();
    let dictionary = Dictionary::from_entries([pair("apple", "яблоко")]);
    let service = quiz_service(&repo, dictionary, 3);
    let user = UserId::new(6);

    let mut run = service.start(user).await.unwrap();
    assert_eq!(run.pool_size(), 1);
    let expected = run.current().unwrap().expected().to_owned();
    assert!(service.answer(&mut run, &expected).await.unwrap().is_correct);

    for scope in [WordScope::Default, WordScope::User] {
        assert!(
            repo.word_progress(user, "apple", scope)
                .await
                .unwrap()
                .is_none()
        );
    }
}

#[tokio::test]
async fn list_words_are_tracked_per_scope() {
    let repo = InMemoryRepository::new();
    let user = UserId::new(7);
    repo.add_user_word(user, &pair("cat", "кошка"), fixed_now())
        .await
        .unwrap();
    let service = quiz_service(&repo, Dictionary::empty(), 8);

    let mut run = service.start(user).await.unwrap();
    for _ in 0..3 {
        service.answer(&mut run, "кошка").await.unwrap();
    }

    let progress = repo
        .word_progress(user, "cat", WordScope::User)
        .await
        .unwrap()
        .expect("progress");
    assert_eq!(progress.times_shown, 3);
    assert_eq!(progress.times_correct, run.totals().correct());
}
