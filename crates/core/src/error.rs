use thiserror::Error;

use crate::dictionary::DictionaryError;
use crate::model::{QuizSessionError, WordError};

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Word(#[from] WordError),
    #[error(transparent)]
    QuizSession(#[from] QuizSessionError),
    #[error(transparent)]
    Dictionary(#[from] DictionaryError),
}
