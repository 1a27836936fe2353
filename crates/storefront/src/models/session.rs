//! Session-related types.

use serde::{Deserialize, Serialize};

use pebble_core::{Email, UserId};

/// The logged-in user, stored under `currentUser`.
///
/// At most one exists per browser; it is overwritten on every login or
/// signup and never expires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    /// Registry ID of the user.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// User's email address.
    pub email: Email,
}
