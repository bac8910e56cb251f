//! In-memory user directory.
//!
//! The directory is the session provider's source of truth: a user id stored
//! in a session only counts once the directory confirms it. Until the
//! startup seed has been loaded the directory reports itself as not ready,
//! and sessions naming a user are treated as still loading.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use argon2::password_hash::PasswordHash;
use chrono::Utc;
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::RwLock;

use planbook_core::{Email, UserId};

use crate::models::User;

/// Errors from the user directory.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// Reading the seed file failed.
    #[error("failed to read users file: {0}")]
    Io(#[from] std::io::Error),

    /// The seed file is not valid JSON of the expected shape.
    #[error("failed to parse users file: {0}")]
    Parse(#[from] serde_json::Error),

    /// A seeded user has an unusable password hash.
    #[error("invalid password hash for {0}")]
    InvalidHash(Email),

    /// A user with this email already exists.
    #[error("user already exists: {0}")]
    Conflict(Email),
}

/// One entry of the users seed file.
#[derive(Debug, Deserialize)]
struct SeedUser {
    email: Email,
    password_hash: String,
}

#[derive(Debug, Default)]
struct Users {
    by_id: HashMap<UserId, User>,
    by_email: HashMap<Email, UserId>,
}

/// Thread-safe in-memory user store with a readiness flag.
#[derive(Debug, Default)]
pub struct UserDirectory {
    users: RwLock<Users>,
    ready: AtomicBool,
}

impl UserDirectory {
    /// Create a directory that is still loading.
    #[must_use]
    pub fn loading() -> Self {
        Self::default()
    }

    /// Create an empty directory that is ready immediately.
    #[must_use]
    pub fn ready() -> Self {
        let directory = Self::default();
        directory.mark_ready();
        directory
    }

    /// Whether the initial load has finished.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Mark the initial load as finished.
    pub fn mark_ready(&self) {
        self.ready.store(true, Ordering::Release);
    }

    /// Add a user.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryError::Conflict` if the email is already registered.
    pub async fn insert(&self, email: Email, password_hash: String) -> Result<User, DirectoryError> {
        let mut users = self.users.write().await;
        if users.by_email.contains_key(&email) {
            return Err(DirectoryError::Conflict(email));
        }

        let user = User {
            id: UserId::generate(),
            email,
            password_hash,
            created_at: Utc::now(),
        };
        users.by_email.insert(user.email.clone(), user.id.clone());
        users.by_id.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    /// Look up a user by id.
    pub async fn get(&self, id: &UserId) -> Option<User> {
        self.users.read().await.by_id.get(id).cloned()
    }

    /// Look up a user by email.
    pub async fn find_by_email(&self, email: &Email) -> Option<User> {
        let users = self.users.read().await;
        users
            .by_email
            .get(email)
            .and_then(|id| users.by_id.get(id))
            .cloned()
    }

    /// Number of known users.
    pub async fn len(&self) -> usize {
        self.users.read().await.by_id.len()
    }

    /// Whether the directory has no users.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Load users from a JSON seed file.
    ///
    /// The file holds an array of `{ "email": ..., "password_hash": ... }`
    /// objects with Argon2 PHC hashes. Emails that already exist are
    /// skipped. Returns the number of users added.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if a hash is
    /// not a valid PHC string. Nothing is added when an error is returned.
    pub async fn load_seed(&self, path: &Path) -> Result<usize, DirectoryError> {
        let contents = tokio::fs::read_to_string(path).await?;
        self.load_seed_str(&contents).await
    }

    async fn load_seed_str(&self, contents: &str) -> Result<usize, DirectoryError> {
        let seed: Vec<SeedUser> = serde_json::from_str(contents)?;
        if let Some(bad) = seed.iter().find(|u| PasswordHash::new(&u.password_hash).is_err()) {
            return Err(DirectoryError::InvalidHash(bad.email.clone()));
        }

        let mut added = 0;
        for entry in seed {
            match self.insert(entry.email, entry.password_hash).await {
                Ok(_) => added += 1,
                Err(DirectoryError::Conflict(email)) => {
                    tracing::warn!(%email, "Skipping duplicate seeded user");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(added)
    }
}
