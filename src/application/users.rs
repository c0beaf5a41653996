use crate::domain::ports::SharedUserStore;
use crate::domain::user::{Principal, User};
use crate::error::{BankError, Result};

/// Maps authenticated principals onto card holders.
#[derive(Clone)]
pub struct UserDirectory {
    users: SharedUserStore,
}

impl UserDirectory {
    pub fn new(users: SharedUserStore) -> Self {
        Self { users }
    }

    /// Registers a new user under the trimmed `username`.
    pub async fn register(&self, username: &str) -> Result<User> {
        let username = username.trim();
        if username.is_empty() {
            return Err(BankError::bad_request("Username must not be blank"));
        }
        let user = self.users.create(username).await?;
        tracing::info!(user_id = %user.id, username = %user.username, "User registered");
        Ok(user)
    }

    pub async fn resolve(&self, principal: &Principal) -> Result<User> {
        self.find(principal.name()).await
    }

    /// Looks a user up by exact username.
    pub async fn find(&self, username: &str) -> Result<User> {
        self.users.find_by_username(username).await?.ok_or_else(|| {
            tracing::error!(username, "User not found");
            BankError::not_found(format!("User {} not found", username))
        })
    }
}
