use crate::error::{BankError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A card holder. Identity is the id; the username is the stable principal name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
}

impl PartialEq for User {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for User {}

/// The authenticated requester, as resolved by the outer authentication layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal(String);

impl Principal {
    pub fn new(username: impl Into<String>) -> Result<Self> {
        let username = username.into();
        let trimmed = username.trim();
        if trimmed.is_empty() {
            return Err(BankError::Unauthorized(
                "Request carries no authenticated principal".to_string(),
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Supplies the authenticated requester for private operations.
pub trait PrincipalProvider {
    fn principal(&self) -> Result<Principal>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_principal_is_unauthorized() {
        assert!(matches!(Principal::new("  "), Err(BankError::Unauthorized(_))));
        assert_eq!(Principal::new(" alice ").unwrap().name(), "alice");
    }

    #[test]
    fn test_user_equality_is_by_id() {
        let a = User { id: UserId(1), username: "alice".into() };
        let b = User { id: UserId(1), username: "renamed".into() };
        let c = User { id: UserId(2), username: "alice".into() };
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
