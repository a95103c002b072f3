use chrono::{DateTime, Utc};

use crate::model::UserId;

/// A chat user, created on first contact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub registered_at: DateTime<Utc>,
}

impl User {
    #[must_use]
    pub fn new(id: UserId, registered_at: DateTime<Utc>) -> Self {
        Self {
            id,
            username: String::new(),
            first_name: String::new(),
            last_name: String::new(),
            registered_at,
        }
    }

    #[must_use]
    pub fn with_names(
        mut self,
        username: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Self {
        self.username = username.into();
        self.first_name = first_name.into();
        self.last_name = last_name.into();
        self
    }

    /// Name used in greetings: first name, then username, then the id.
    #[must_use]
    pub fn display_name(&self) -> String {
        if !self.first_name.is_empty() {
            self.first_name.clone()
        } else if !self.username.is_empty() {
            self.username.clone()
        } else {
            self.id.to_string()
        }
    }
}
