//! Authentication service.
//!
//! Password registration and login against the in-memory user directory.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use secrecy::{ExposeSecret, SecretString};

use planbook_core::Email;

use crate::models::User;
use crate::services::directory::{DirectoryError, UserDirectory};

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Authentication service.
pub struct AuthService<'a> {
    users: &'a UserDirectory,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(users: &'a UserDirectory) -> Self {
        Self { users }
    }

    /// Register a new user with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    pub async fn register_with_password(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<User, AuthError> {
        let email = Email::parse(email)?;
        validate_password(password.expose_secret())?;
        let password_hash = hash_password(password.expose_secret())?;

        self.users
            .insert(email, password_hash)
            .await
            .map_err(|e| match e {
                DirectoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Directory(other),
            })
    }

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    pub async fn login_with_password(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<User, AuthError> {
        let email = Email::parse(email)?;
        let user = self
            .users
            .find_by_email(&email)
            .await
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password.expose_secret(), &user.password_hash)?;

        Ok(user)
    }
}

fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn secret(s: &str) -> SecretString {
        SecretString::from(s.to_owned())
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let directory = UserDirectory::ready();
        let auth = AuthService::new(&directory);

        let registered = auth
            .register_with_password("saver@example.com", &secret("long enough"))
            .await
            .unwrap();
        assert!(registered.password_hash.starts_with("$argon2id$"));

        let logged_in = auth
            .login_with_password("Saver@Example.com", &secret("long enough"))
            .await
            .unwrap();
        assert_eq!(logged_in.id, registered.id);
    }

    #[tokio::test]
    async fn test_login_rejects_wrong_password_and_unknown_user() {
        let directory = UserDirectory::ready();
        let auth = AuthService::new(&directory);
        auth.register_with_password("saver@example.com", &secret("long enough"))
            .await
            .unwrap();

        assert!(matches!(
            auth.login_with_password("saver@example.com", &secret("not the one"))
                .await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            auth.login_with_password("nobody@example.com", &secret("long enough"))
                .await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_register_validation() {
        let directory = UserDirectory::ready();
        let auth = AuthService::new(&directory);

        let weak = auth
            .register_with_password("saver@example.com", &secret("short"))
            .await;
        assert!(matches!(weak, Err(AuthError::WeakPassword(_))));

        let bad_email = auth
            .register_with_password("not-an-email", &secret("long enough"))
            .await;
        assert!(matches!(bad_email, Err(AuthError::InvalidEmail(_))));

        auth.register_with_password("saver@example.com", &secret("long enough"))
            .await
            .unwrap();
        let duplicate = auth
            .register_with_password("saver@example.com", &secret("long enough"))
            .await;
        assert!(matches!(duplicate, Err(AuthError::UserAlreadyExists)));
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(AuthError::InvalidCredentials.code(), "credentials");
        assert_eq!(AuthError::UserAlreadyExists.code(), "exists");
        assert_eq!(AuthError::WeakPassword(String::new()).code(), "password");
    }
}
