#![forbid(unsafe_code)]

pub mod app_services;
pub mod config;
pub mod conversation;
pub mod dictionary;
pub mod error;
pub mod quiz;
pub mod user_service;
pub mod word_service;

pub use vocab_core::Clock;

pub use app_services::AppServices;
pub use config::AppConfig;
pub use conversation::{
    Action, Button, ChatController, ChatError, Incoming, Input, OutgoingMessage, Reply, StateStore,
};
pub use dictionary::load_dictionary;
pub use error::{AppServicesError, ConfigError, HistoryError, QuizError, WordServiceError};
pub use quiz::{AnswerFeedback, HistoryService, LastResults, QuizReport, QuizRun, QuizService};
pub use user_service::{Profile, UserService};
pub use word_service::{AddWordOutcome, WordPage, WordService};
