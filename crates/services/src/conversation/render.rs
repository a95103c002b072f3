//! User-facing texts and keyboards.

use std::fmt::Write as _;

use chrono::Duration;
use vocab_core::model::{QuestionResult, QuizSession, QuizStats, QuizTotals};
use vocab_core::quiz::{Direction, Question};
use vocab_core::time::DisplayZone;

use super::action::{Action, BACK_LABEL};
use super::reply::{Button, OutgoingMessage};
use crate::quiz::{AnswerFeedback, LastResults, QuizReport};
use crate::word_service::WordPage;

pub const MENU_TITLE: &str = "Главное меню:";
pub const CHOOSE_ACTION: &str = "Выберите действие:";
pub const CHOOSE_WORD: &str = "Выберите слово:";
pub const GENERIC_ERROR: &str = "Произошла ошибка. Пожалуйста, попробуйте позже.";
pub const FORMAT_HINT: &str = "Формат: слово - перевод";

const WORDS_PER_ROW: usize = 2;

pub fn back_row() -> Vec<Button> {
    vec![Button::new("⬅️ Назад", Action::Back)]
}

pub fn menu_keyboard(page: &WordPage) -> Vec<Vec<Button>> {
    let mut rows: Vec<Vec<Button>> = page
        .words
        .chunks(WORDS_PER_ROW)
        .map(|chunk| {
            chunk
                .iter()
                .map(|w| Button::new(w.clone(), Action::ShowWord(w.clone())))
                .collect()
        })
        .collect();

    let mut nav = Vec::new();
    if page.has_prev {
        nav.push(Button::new("⬅️ Назад", Action::Page(page.page - 1)));
    }
    if page.has_next {
        nav.push(Button::new("Вперёд ➡️", Action::Page(page.page + 1)));
    }
    if !nav.is_empty() {
        rows.push(nav);
    }

    rows.push(vec![
        Button::new("➕ Добавить слово", Action::AddWord),
        Button::new("🔙 Удалить слово", Action::RemoveWord),
    ]);
    rows.push(vec![
        Button::new("📘 Перевести слово", Action::Translate),
        Button::new("🧠 Тест", Action::StartQuiz),
    ]);
    rows.push(vec![Button::new("📋 История тестов", Action::History)]);
    rows
}

pub fn menu(title: &str, page: &WordPage) -> OutgoingMessage {
    OutgoingMessage::text(title).with_keyboard(menu_keyboard(page))
}

pub fn welcome(name: &str) -> String {
    format!(
        "Привет, {name} 👋\n\
         Ты можешь изучать английские слова, добавлять свои и удалять ненужные.\n\
         Также доступен быстрый перевод слов!\n\n\
         Выбирай действие ниже:"
    )
}

/// A prompt that waits for typed input and can be cancelled.
pub fn input_prompt(text: &str) -> OutgoingMessage {
    OutgoingMessage::text(text).with_row(vec![Button::new(BACK_LABEL, Action::Back)])
}

pub fn question_text(question: &Question) -> String {
    match question.direction {
        Direction::EnglishToRussian => format!("Переведите слово: {}", question.prompt()),
        Direction::RussianToEnglish => format!("Как будет '{}' по-английски?", question.prompt()),
    }
}

pub fn question(question: &Question, first: bool) -> OutgoingMessage {
    let header = if first { "🧠 Тест:" } else { "🧠 Следующий вопрос:" };
    OutgoingMessage::text(format!(
        "{header}\n{}\nВведите пропущенное слово:",
        question_text(question)
    ))
    .with_row(vec![Button::new("🏁 Завершить тест", Action::EndQuiz)])
}

pub fn feedback(feedback: &AnswerFeedback) -> String {
    if feedback.is_correct {
        return "✅ Верно! Отличная работа!".to_owned();
    }
    let mut text = format!(
        "❌ Неверно. Ваш ответ: '{}'\nПравильный ответ: '{}'",
        feedback.answer, feedback.expected
    );
    match feedback.direction {
        Direction::EnglishToRussian if !feedback.alternatives.is_empty() => {
            let _ = write!(text, "\nДругие варианты: {}", feedback.alternatives.join(", "));
        }
        Direction::RussianToEnglish => {
            let _ = write!(text, "\nПеревод: '{}'", feedback.prompt);
        }
        Direction::EnglishToRussian => {}
    }
    text
}

fn totals_block(totals: QuizTotals) -> String {
    format!(
        "🔹 Всего вопросов: {}\n✅ Правильных ответов: {}\n❌ Неправильных ответов: {}\n📈 Процент правильных: {}%",
        totals.answered(),
        totals.correct(),
        totals.incorrect(),
        totals.percentage()
    )
}

fn stats_block(stats: &QuizStats) -> String {
    format!(
        "Общая статистика:\n🔥 Средний балл: {:.1}\n🏆 Лучший результат: {}\n📋 Всего тестов: {}",
        stats.average_correct, stats.best_correct, stats.sessions
    )
}

fn result_lines(results: &[QuestionResult]) -> String {
    let mut out = String::new();
    for (i, r) in results.iter().enumerate() {
        let status = if r.is_correct { "✅" } else { "❌" };
        let _ = write!(
            out,
            "{}. {status} Слово: {}\n   Ваш ответ: {}\n   Правильно: {}\n\n",
            i + 1,
            r.word,
            r.user_answer,
            r.correct_answer
        );
    }
    out.trim_end().to_owned()
}

pub fn report(report: &QuizReport) -> String {
    let mut text = format!("📊 Результаты теста\n\n{}", totals_block(report.totals));
    if let Some(stats) = &report.stats {
        let _ = write!(text, "\n\n{}", stats_block(stats));
    }
    if report.recent.is_empty() {
        text.push_str("\n\nℹ️ Детальная информация о вопросах недоступна");
    } else {
        let _ = write!(
            text,
            "\n\nДетализация последних вопросов:\n\n{}",
            result_lines(&report.recent)
        );
    }
    if !report.saved {
        text.push_str("\n\n⚠️ Результаты не удалось сохранить.");
    }
    text
}

pub fn format_duration(duration: Duration) -> String {
    let secs = duration.num_seconds().max(0);
    format!("{} мин {} сек", secs / 60, secs % 60)
}

pub fn history(sessions: &[QuizSession], stats: &QuizStats, zone: &DisplayZone) -> String {
    let mut text = String::from("📋 Ваша история тестов:\n\n");
    for (i, session) in sessions.iter().enumerate() {
        let _ = writeln!(
            text,
            "🔹 Тест #{} от {}",
            i + 1,
            zone.format_short(session.started_at())
        );
        if let Some(totals) = session.totals() {
            let _ = writeln!(
                text,
                "   ✅ {}/{} ({}%)\n   ❌ Ошибки: {}",
                totals.correct(),
                totals.answered(),
                totals.percentage(),
                totals.incorrect()
            );
        }
        let duration = session
            .duration()
            .map_or_else(|| "не завершен".to_owned(), format_duration);
        let _ = writeln!(text, "   ⏱ Длительность: {duration}\n");
    }
    if stats.sessions > 0 {
        text.push_str(&stats_block(stats));
    }
    text.trim_end().to_owned()
}

pub fn last_results(last: &LastResults) -> String {
    if last.results.is_empty() {
        return "📝 В последнем тесте нет ответов.".to_owned();
    }
    format!(
        "📝 Результаты последнего теста:\n\n{}",
        result_lines(&last.results)
    )
}
