#![forbid(unsafe_code)]

pub mod dictionary;
pub mod error;
pub mod model;
pub mod quiz;
pub mod time;

pub use dictionary::{Dictionary, DictionaryError};
pub use error::Error;
pub use time::Clock;
