//! User domain types.

use chrono::{DateTime, Utc};

use planbook_core::{Email, UserId};

/// A Planbook user (domain type).
#[derive(Debug, Clone)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// User's email address (login name).
    pub email: Email,
    /// Argon2 PHC string.
    pub password_hash: String,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
}
