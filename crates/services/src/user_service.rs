use std::sync::Arc;

use storage::repository::{StorageError, UserRepository};
use tracing::info;
use vocab_core::model::{User, UserId};

use crate::Clock;

/// Registers users on first contact.
#[derive(Clone)]
pub struct UserService {
    clock: Clock,
    users: Arc<dyn UserRepository>,
}

/// Profile fields a transport knows about the sender.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Profile {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

impl UserService {
    #[must_use]
    pub fn new(clock: Clock, users: Arc<dyn UserRepository>) -> Self {
        Self { clock, users }
    }

    /// Insert the user unless they are already known.
    ///
    /// Returns `true` when a new registration happened.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the user cannot be stored.
    pub async fn ensure_registered(
        &self,
        id: UserId,
        profile: &Profile,
    ) -> Result<bool, StorageError> {
        let user = User::new(id, self.clock.now()).with_names(
            &profile.username,
            &profile.first_name,
            &profile.last_name,
        );
        let created = self.users.register_user(&user).await?;
        if created {
            info!(user_id = %id, "registered new user");
        }
        Ok(created)
    }

    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    pub async fn get(&self, id: UserId) -> Result<Option<User>, StorageError> {
        self.users.get_user(id).await
    }
}
