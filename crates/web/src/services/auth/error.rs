//! Authentication error types.

use thiserror::Error;

use crate::services::directory::DirectoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] planbook_core::EmailError),

    /// Invalid credentials (wrong password or user not found).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// User already exists.
    #[error("user already exists")]
    UserAlreadyExists,

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Directory error.
    #[error("directory error: {0}")]
    Directory(#[from] DirectoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}

impl AuthError {
    /// Short code passed back to the auth page as `?error=`.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidEmail(_) => "email",
            Self::InvalidCredentials => "credentials",
            Self::UserAlreadyExists => "exists",
            Self::WeakPassword(_) => "password",
            Self::Directory(_) | Self::PasswordHash => "internal",
        }
    }
}
