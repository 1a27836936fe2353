//! User registry types.

use serde::{Deserialize, Serialize};

use pebble_core::{Email, UserId};

use super::CurrentUser;

/// A registered user, as stored in the `users` registry.
///
/// The password is kept in plaintext: this is a mock sign-in for a
/// single-browser demo store, not an authentication system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    /// Creation time in epoch milliseconds.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Unique key of the registry (compared case-sensitively).
    pub email: Email,
    /// Plaintext password.
    pub password: String,
}

impl UserRecord {
    /// The session identity for this user.
    #[must_use]
    pub fn session(&self) -> CurrentUser {
        CurrentUser {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
        }
    }
}
