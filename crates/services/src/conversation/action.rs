use thiserror::Error;
use vocab_core::model::UserId;

use crate::user_service::Profile;

/// Label of the reply-keyboard button that cancels any input state.
pub const BACK_LABEL: &str = "⬅ Назад";

/// Discrete menu selections, carried as button data by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Start,
    Menu,
    Back,
    Page(usize),
    ShowWord(String),
    AddWord,
    RemoveWord,
    RemoveSelected(String),
    Translate,
    StartQuiz,
    EndQuiz,
    History,
    LastResults,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ActionError {
    #[error("invalid page number: {0:?}")]
    BadPage(String),
    #[error("unknown action: {0:?}")]
    Unknown(String),
}

impl Action {
    /// Button data for this action.
    #[must_use]
    pub fn encode(&self) -> String {
        match self {
            Action::Start => "start".into(),
            Action::Menu => "menu".into(),
            Action::Back => "cancel".into(),
            Action::Page(n) => format!("page_{n}"),
            Action::ShowWord(w) => format!("word_{w}"),
            Action::AddWord => "add_word".into(),
            Action::RemoveWord => "remove_word".into(),
            Action::RemoveSelected(w) => format!("del_{w}"),
            Action::Translate => "translate".into(),
            Action::StartQuiz => "start_test".into(),
            Action::EndQuiz => "end_test".into(),
            Action::History => "test_history".into(),
            Action::LastResults => "last_test_details".into(),
        }
    }

    /// Parse button data produced by [`Action::encode`].
    ///
    /// # Errors
    ///
    /// Returns `ActionError::BadPage` for a page that is not a number and
    /// `ActionError::Unknown` for anything else unrecognized.
    pub fn decode(data: &str) -> Result<Self, ActionError> {
        let action = match data {
            "start" => Action::Start,
            "menu" => Action::Menu,
            "cancel" => Action::Back,
            "add_word" => Action::AddWord,
            "remove_word" => Action::RemoveWord,
            "translate" => Action::Translate,
            "start_test" | "new_test" => Action::StartQuiz,
            "end_test" => Action::EndQuiz,
            "test_history" => Action::History,
            "last_test_details" => Action::LastResults,
            other => {
                if let Some(page) = other.strip_prefix("page_") {
                    let n = page
                        .parse()
                        .map_err(|_| ActionError::BadPage(page.to_owned()))?;
                    Action::Page(n)
                } else if let Some(word) = other.strip_prefix("word_").filter(|w| !w.is_empty()) {
                    Action::ShowWord(word.to_owned())
                } else if let Some(word) = other.strip_prefix("del_").filter(|w| !w.is_empty()) {
                    Action::RemoveSelected(word.to_owned())
                } else {
                    return Err(ActionError::Unknown(other.to_owned()));
                }
            }
        };
        Ok(action)
    }

    /// Slash commands typed as text.
    #[must_use]
    pub fn from_command(text: &str) -> Option<Self> {
        let command = text.split_whitespace().next()?;
        // Group chats append the bot name: /start@vocab_bot
        let command = command.split('@').next().unwrap_or(command);
        match command {
            "/start" => Some(Action::Start),
            "/menu" => Some(Action::Menu),
            "/history" => Some(Action::History),
            "/last_test" => Some(Action::LastResults),
            "/cancel" => Some(Action::Back),
            _ => None,
        }
    }
}

/// What the user sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Text(String),
    /// Raw button data; decoded by the controller.
    Button(String),
}

/// One inbound event from the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Incoming {
    pub user_id: UserId,
    pub profile: Profile,
    pub input: Input,
}

impl Incoming {
    #[must_use]
    pub fn text(user_id: UserId, text: impl Into<String>) -> Self {
        Self {
            user_id,
            profile: Profile::default(),
            input: Input::Text(text.into()),
        }
    }

    #[must_use]
    pub fn button(user_id: UserId, action: &Action) -> Self {
        Self {
            user_id,
            profile: Profile::default(),
            input: Input::Button(action.encode()),
        }
    }

    #[must_use]
    pub fn with_profile(mut self, profile: Profile) -> Self {
        self.profile = profile;
        self
    }
}
