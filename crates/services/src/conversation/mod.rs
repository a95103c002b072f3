//! Chat front: turns user input into service calls and replies.
//!
//! Transport agnostic. A transport feeds [`Incoming`] events to
//! [`ChatController::handle`] and delivers the returned [`Reply`].

mod action;
mod controller;
pub mod render;
mod reply;
mod state;

pub use action::{Action, ActionError, BACK_LABEL, Incoming, Input};
pub use controller::{ChatController, ChatError};
pub use reply::{Button, OutgoingMessage, Reply};
pub use state::{ConversationState, StateStore};
