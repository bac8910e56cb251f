//! Authentication route handlers.
//!
//! Password login and registration against the in-memory user directory.
//! A successful sign-in selects the user's default scenario and returns them
//! to the page the access gate stopped them at.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use secrecy::SecretString;
use serde::Deserialize;
use tower_sessions::Session;

use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{
    clear_current_scenario, clear_current_user, set_current_scenario, set_current_user,
    take_redirect_state,
};
use crate::models::{CurrentUser, User};
use crate::routes::error_message;
use crate::services::{AuthError, AuthService};
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Login and registration form data.
#[derive(Debug, Deserialize)]
pub struct CredentialsForm {
    pub email: String,
    pub password: String,
}

/// Query parameters for error display.
#[derive(Debug, Deserialize)]
pub struct MessageQuery {
    pub error: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Login and registration page.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    /// Path the login form posts to.
    pub auth_path: String,
    /// Prefix of the register and logout actions.
    pub auth_base: String,
    pub error: Option<&'static str>,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the login and registration forms.
pub async fn page(State(state): State<AppState>, Query(query): Query<MessageQuery>) -> Response {
    LoginTemplate {
        auth_path: auth_path(&state).to_string(),
        auth_base: auth_base(&state).to_string(),
        error: query.error.as_deref().and_then(error_message),
    }
    .into_response()
}

/// Handle login form submission.
///
/// # Errors
///
/// Returns an error if the session cannot be written.
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<CredentialsForm>,
) -> Result<Response> {
    if !state.users().is_ready() {
        return Ok(redirect_with_error(&state, "unavailable"));
    }

    let password = SecretString::from(form.password);
    match AuthService::new(state.users())
        .login_with_password(&form.email, &password)
        .await
    {
        Ok(user) => sign_in(&state, &session, &user).await,
        Err(e) => Ok(auth_failed(&state, &e)),
    }
}

/// Handle registration form submission.
///
/// # Errors
///
/// Returns an error if the session cannot be written.
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<CredentialsForm>,
) -> Result<Response> {
    let password = SecretString::from(form.password);
    match AuthService::new(state.users())
        .register_with_password(&form.email, &password)
        .await
    {
        Ok(user) => {
            tracing::info!(user_id = %user.id, "User registered");
            sign_in(&state, &session, &user).await
        }
        Err(e) => Ok(auth_failed(&state, &e)),
    }
}

/// Handle logout.
///
/// # Errors
///
/// Returns an error if the session cannot be written.
pub async fn logout(State(state): State<AppState>, session: Session) -> Result<Response> {
    clear_current_user(&session).await?;
    clear_current_scenario(&session).await?;
    clear_sentry_user();

    Ok(Redirect::to(&state.gate().auth_entry().to_string()).into_response())
}

// =============================================================================
// Helpers
// =============================================================================

/// Put `user` into the session and send them on.
///
/// The user's first scenario becomes current. The destination is the page
/// recorded by the access gate, or the dashboard.
async fn sign_in(state: &AppState, session: &Session, user: &User) -> Result<Response> {
    set_current_user(session, &CurrentUser::from(user)).await?;

    match state.scenarios().default_for(&user.id).await {
        Some(scenario) => set_current_scenario(session, &scenario).await?,
        None => clear_current_scenario(session).await?,
    }

    let destination = take_redirect_state(session)
        .await?
        .map_or_else(|| "/".to_string(), |redirect| redirect.from.to_string());

    set_sentry_user(&user.id, Some(user.email.as_str()));
    tracing::info!(user_id = %user.id, %destination, "User signed in");

    Ok(Redirect::to(&destination).into_response())
}

fn auth_failed(state: &AppState, error: &AuthError) -> Response {
    match error {
        AuthError::Directory(_) | AuthError::PasswordHash => {
            tracing::error!(error = %error, "Authentication failed");
        }
        _ => tracing::warn!(error = %error, "Authentication rejected"),
    }
    redirect_with_error(state, error.code())
}

fn redirect_with_error(state: &AppState, code: &str) -> Response {
    Redirect::to(&format!("{}?error={code}", auth_path(state))).into_response()
}

fn auth_path(state: &AppState) -> &str {
    state.gate().auth_entry().path()
}

/// Auth path without a trailing slash, matching how the routes are mounted.
pub fn auth_base(state: &AppState) -> &str {
    auth_path(state).trim_end_matches('/')
}
