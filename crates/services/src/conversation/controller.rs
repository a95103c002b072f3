use std::mem;

use thiserror::Error;
use tracing::{debug, error, info, warn};
use vocab_core::model::UserId;
use vocab_core::time::DisplayZone;

use super::action::{Action, ActionError, BACK_LABEL, Incoming, Input};
use super::render;
use super::reply::{Button, OutgoingMessage, Reply};
use super::state::{ConversationState, StateStore};
use crate::Clock;
use crate::app_services::AppServices;
use crate::config::AppConfig;
use crate::error::{HistoryError, QuizError, WordServiceError};
use crate::quiz::{HistoryService, QuizRun, QuizService};
use crate::user_service::UserService;
use crate::word_service::{AddWordOutcome, WordService};
use storage::repository::StorageError;

/// Failure of one conversational turn, already phrased for the user.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ChatError {
    /// Malformed input; the state is kept so the user can retry.
    #[error("{0}")]
    UserInput(String),
    /// Nothing to show; not a failure of the system.
    #[error("{0}")]
    NotFound(String),
    #[error(transparent)]
    Persistence(#[from] StorageError),
    /// Conversation data was missing; the state is reset.
    #[error("{0}")]
    State(String),
}

impl ChatError {
    fn user_message(&self) -> &str {
        match self {
            ChatError::UserInput(msg) | ChatError::NotFound(msg) | ChatError::State(msg) => msg,
            ChatError::Persistence(_) => render::GENERIC_ERROR,
        }
    }
}

impl From<WordServiceError> for ChatError {
    fn from(err: WordServiceError) -> Self {
        match err {
            WordServiceError::Input(_) => ChatError::UserInput(render::FORMAT_HINT.to_owned()),
            WordServiceError::PageOutOfRange { .. } => {
                ChatError::UserInput("Неверный номер страницы".to_owned())
            }
            WordServiceError::Storage(e) => ChatError::Persistence(e),
        }
    }
}

impl From<QuizError> for ChatError {
    fn from(err: QuizError) -> Self {
        match err {
            QuizError::NoWordsAvailable => {
                ChatError::NotFound("Нет доступных слов для теста.".to_owned())
            }
            QuizError::MissingQuestion => {
                ChatError::State("Тест не начат или уже завершен".to_owned())
            }
            QuizError::Storage(e) => ChatError::Persistence(e),
        }
    }
}

impl From<HistoryError> for ChatError {
    fn from(err: HistoryError) -> Self {
        match err {
            HistoryError::Storage(e) => ChatError::Persistence(e),
        }
    }
}

impl From<ActionError> for ChatError {
    fn from(err: ActionError) -> Self {
        match err {
            ActionError::BadPage(_) => ChatError::UserInput("Неверный номер страницы".to_owned()),
            ActionError::Unknown(_) => ChatError::UserInput("Неизвестное действие.".to_owned()),
        }
    }
}

/// Routes user input through the conversation states to the services.
pub struct ChatController {
    clock: Clock,
    users: UserService,
    words: WordService,
    quiz: QuizService,
    history: HistoryService,
    states: StateStore,
    zone: DisplayZone,
    per_page: usize,
}

impl ChatController {
    #[must_use]
    pub fn new(services: &AppServices, config: &AppConfig) -> Self {
        Self {
            clock: services.clock(),
            users: services.users().clone(),
            words: services.words().clone(),
            quiz: services.quiz().clone(),
            history: services.history().clone(),
            states: StateStore::new(config.state_ttl),
            zone: config.zone,
            per_page: config.words_per_page,
        }
    }

    #[must_use]
    pub fn states(&self) -> &StateStore {
        &self.states
    }

    /// Process one inbound event and produce the reply.
    ///
    /// Never fails: every error becomes a message and, for state errors,
    /// a reset to the main menu.
    pub async fn handle(&self, incoming: Incoming) -> Reply {
        let user_id = incoming.user_id;
        let mut state = self.states.take(user_id, self.clock.now());
        let before = state.name();

        let reply = match self.dispatch(&incoming, &mut state).await {
            Ok(reply) => reply,
            Err(err) => {
                self.log_error(user_id, before, &err);
                if matches!(err, ChatError::State(_)) {
                    state = ConversationState::Idle;
                }
                Reply::one(OutgoingMessage::text(err.user_message()))
            }
        };

        if before != state.name() {
            debug!(user_id = %user_id, from = before, to = state.name(), "conversation state changed");
        }
        self.states.put(user_id, state, self.clock.now());
        reply
    }

    fn log_error(&self, user_id: UserId, state: &str, err: &ChatError) {
        match err {
            ChatError::UserInput(_) => debug!(user_id = %user_id, state, error = %err, "rejected input"),
            ChatError::NotFound(_) => info!(user_id = %user_id, state, error = %err, "nothing found"),
            ChatError::Persistence(_) => {
                error!(user_id = %user_id, state, error = %err, "storage failure");
            }
            ChatError::State(_) => warn!(user_id = %user_id, state, error = %err, "state error; resetting"),
        }
    }

    async fn dispatch(
        &self,
        incoming: &Incoming,
        state: &mut ConversationState,
    ) -> Result<Reply, ChatError> {
        let user_id = incoming.user_id;
        // Word lists and sessions reference the user row.
        self.users.ensure_registered(user_id, &incoming.profile).await?;
        match &incoming.input {
            Input::Button(data) => {
                let action = Action::decode(data)?;
                self.on_action(user_id, action, state).await
            }
            Input::Text(text) if text.trim() == BACK_LABEL => {
                self.on_action(user_id, Action::Back, state).await
            }
            Input::Text(text) => match Action::from_command(text) {
                Some(action) => self.on_action(user_id, action, state).await,
                None => self.on_text(user_id, text.trim(), state).await,
            },
        }
    }

    async fn on_action(
        &self,
        user_id: UserId,
        action: Action,
        state: &mut ConversationState,
    ) -> Result<Reply, ChatError> {
        match action {
            Action::Start => {
                let reply = self.leave(user_id, state, false).await;
                let name = self
                    .users
                    .get(user_id)
                    .await?
                    .map_or_else(|| user_id.to_string(), |u| u.display_name());
                let page = self.words.menu_page(user_id, 0, self.per_page).await?;
                Ok(reply.then(render::menu(&render::welcome(&name), &page)))
            }
            Action::Menu => {
                let reply = self.leave(user_id, state, false).await;
                Ok(reply.then(self.main_menu(user_id, render::MENU_TITLE).await?))
            }
            Action::Back => {
                let reply = self.leave(user_id, state, true).await;
                Ok(reply.then(self.main_menu(user_id, render::MENU_TITLE).await?))
            }
            Action::Page(page) => {
                let page = self.words.menu_page(user_id, page, self.per_page).await?;
                Ok(Reply::one(render::menu(render::CHOOSE_WORD, &page)))
            }
            Action::ShowWord(word) => match self.words.show_word(user_id, &word).await? {
                Some(translation) => Ok(Reply::one(
                    OutgoingMessage::text(format!("{word} - {translation}"))
                        .with_row(render::back_row()),
                )),
                None => Err(ChatError::NotFound("Перевод не найден.".to_owned())),
            },
            Action::AddWord => {
                self.ensure_not_in_quiz(state)?;
                *state = ConversationState::AddingWord;
                Ok(Reply::one(render::input_prompt(
                    "Введите слово и перевод через тире. Пример: apple - яблоко",
                )))
            }
            Action::RemoveWord => {
                self.ensure_not_in_quiz(state)?;
                let words = self.words.user_words(user_id).await?;
                if words.is_empty() {
                    return Ok(Reply::one(
                        OutgoingMessage::text("У вас нет добавленных слов.")
                            .with_row(render::back_row()),
                    ));
                }
                let mut keyboard: Vec<Vec<Button>> = words
                    .iter()
                    .map(|p| {
                        vec![Button::new(
                            format!("{} - {}", p.english(), p.russian()),
                            Action::RemoveSelected(p.english().to_owned()),
                        )]
                    })
                    .collect();
                keyboard.push(render::back_row());
                *state = ConversationState::RemovingWord;
                Ok(Reply::one(
                    OutgoingMessage::text("Выберите слово для удаления:").with_keyboard(keyboard),
                ))
            }
            Action::RemoveSelected(word) => {
                if !matches!(state, ConversationState::RemovingWord) {
                    return Err(ChatError::UserInput(
                        "Сначала выберите «Удалить слово» в меню.".to_owned(),
                    ));
                }
                self.remove(user_id, &word, state).await
            }
            Action::Translate => {
                self.ensure_not_in_quiz(state)?;
                *state = ConversationState::Translating;
                Ok(Reply::one(render::input_prompt("Введите слово для перевода:")))
            }
            Action::StartQuiz => {
                if let ConversationState::InQuiz(run) = state {
                    let question = run
                        .current()
                        .ok_or_else(|| ChatError::State("Тест не начат или уже завершен".into()))?;
                    return Ok(Reply::one(render::question(question, false)));
                }
                let run = self.quiz.start(user_id).await?;
                let message = run
                    .current()
                    .map(|q| render::question(q, true))
                    .ok_or_else(|| ChatError::State("Тест не начат или уже завершен".into()))?;
                *state = ConversationState::InQuiz(Box::new(run));
                Ok(Reply::one(message))
            }
            Action::EndQuiz => {
                let run = self.take_quiz(state)?;
                let report = self.quiz.finish(*run).await;
                let reply = Reply::one(OutgoingMessage::text(render::report(&report)));
                match self.main_menu(user_id, render::MENU_TITLE).await {
                    Ok(menu) => Ok(reply.then(menu)),
                    Err(err) => {
                        warn!(user_id = %user_id, error = %err, "menu unavailable after quiz report");
                        Ok(reply)
                    }
                }
            }
            Action::History => {
                let sessions = self.history.recent(user_id).await?;
                if sessions.is_empty() {
                    return Err(ChatError::NotFound(
                        "📭 У вас пока нет истории тестов.".to_owned(),
                    ));
                }
                let stats = self.history.stats(user_id).await?;
                Ok(Reply::one(
                    OutgoingMessage::text(render::history(&sessions, &stats, &self.zone))
                        .with_row(vec![Button::new("◀️ Назад", Action::Menu)])
                        .with_row(vec![Button::new("📝 Посмотреть детали", Action::LastResults)]),
                ))
            }
            Action::LastResults => match self.history.last_results(user_id).await? {
                Some(last) => Ok(Reply::one(
                    OutgoingMessage::text(render::last_results(&last))
                        .with_row(vec![Button::new("◀️ Назад", Action::History)]),
                )),
                None => Err(ChatError::NotFound(
                    "📭 У вас нет завершенных тестов.".to_owned(),
                )),
            },
        }
    }

    async fn on_text(
        &self,
        user_id: UserId,
        text: &str,
        state: &mut ConversationState,
    ) -> Result<Reply, ChatError> {
        match state {
            ConversationState::Idle => Ok(Reply::one(
                self.main_menu(user_id, render::CHOOSE_ACTION).await?,
            )),
            ConversationState::AddingWord => self.add(user_id, text, "Слово добавлено", state).await,
            ConversationState::AddingTranslation { word } => {
                // A bare translation, hyphenated or not, is attached to the
                // word that was looked up.
                let line = if text.contains(" - ") {
                    text.to_owned()
                } else {
                    format!("{word} - {text}")
                };
                self.add(user_id, &line, "Перевод добавлен", state).await
            }
            ConversationState::RemovingWord => self.remove(user_id, text, state).await,
            ConversationState::Translating => match self.words.translate(user_id, text).await? {
                Some(translation) => {
                    *state = ConversationState::Idle;
                    Ok(Reply::one(OutgoingMessage::text(format!("📘 {text} — {translation}")))
                        .then(self.main_menu(user_id, render::CHOOSE_ACTION).await?))
                }
                None => {
                    *state = ConversationState::AddingTranslation {
                        word: text.to_owned(),
                    };
                    Ok(Reply::one(render::input_prompt(
                        "Перевод не найден. Хотите добавить перевод вручную?\n\
                         Введите в формате: слово - перевод",
                    )))
                }
            },
            ConversationState::InQuiz(run) => {
                let feedback = self.quiz.answer(run, text).await?;
                let next = feedback
                    .next
                    .as_ref()
                    .ok_or_else(|| ChatError::State("Тест не начат или уже завершен".into()))?;
                Ok(Reply::one(OutgoingMessage::text(render::feedback(&feedback)))
                    .then(render::question(next, false)))
            }
        }
    }

    async fn add(
        &self,
        user_id: UserId,
        text: &str,
        done: &str,
        state: &mut ConversationState,
    ) -> Result<Reply, ChatError> {
        let message = match self.words.add_word(user_id, text).await? {
            AddWordOutcome::Added(pair) => {
                format!("✅ {done}: {} - {}", pair.english(), pair.russian())
            }
            AddWordOutcome::Duplicate(pair) => format!("Слово '{}' уже есть.", pair.english()),
        };
        *state = ConversationState::Idle;
        Ok(Reply::one(OutgoingMessage::text(message))
            .then(self.main_menu(user_id, render::CHOOSE_ACTION).await?))
    }

    async fn remove(
        &self,
        user_id: UserId,
        word: &str,
        state: &mut ConversationState,
    ) -> Result<Reply, ChatError> {
        if !self.words.remove_word(user_id, word).await? {
            return Err(ChatError::NotFound(format!("Слово '{word}' не найдено.")));
        }
        *state = ConversationState::Idle;
        Ok(Reply::one(
            self.main_menu(user_id, &format!("Слово '{word}' удалено."))
                .await?,
        ))
    }

    async fn main_menu(&self, user_id: UserId, title: &str) -> Result<OutgoingMessage, ChatError> {
        let page = self.words.menu_page(user_id, 0, self.per_page).await?;
        Ok(render::menu(title, &page))
    }

    /// Reset to idle. A running quiz is cancelled; an abandoned input prompt
    /// is acknowledged only when `announce` is set.
    async fn leave(&self, user_id: UserId, state: &mut ConversationState, announce: bool) -> Reply {
        match mem::take(state) {
            ConversationState::InQuiz(run) => {
                let saved = self.quiz.cancel(*run).await;
                info!(user_id = %user_id, saved, "quiz cancelled by user");
                let text = if saved {
                    "Тест отменен. Прогресс сохранен."
                } else {
                    "Тест отменен."
                };
                Reply::one(OutgoingMessage::text(text))
            }
            ConversationState::Idle => Reply::default(),
            _ if announce => Reply::one(OutgoingMessage::text("Отмена.")),
            _ => Reply::default(),
        }
    }

    fn take_quiz(&self, state: &mut ConversationState) -> Result<Box<QuizRun>, ChatError> {
        match mem::take(state) {
            ConversationState::InQuiz(run) => Ok(run),
            other => {
                *state = other;
                Err(ChatError::State("Тест не начат или уже завершен".to_owned()))
            }
        }
    }

    fn ensure_not_in_quiz(&self, state: &ConversationState) -> Result<(), ChatError> {
        if matches!(state, ConversationState::InQuiz(_)) {
            return Err(ChatError::UserInput(
                "Сначала завершите тест.".to_owned(),
            ));
        }
        Ok(())
    }
}
