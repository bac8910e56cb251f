//! Access gate middleware and the session provider behind it.
//!
//! The gate sits in front of the protected route tree. For every request it
//! builds a [`SessionSnapshot`] from the session and the user directory, asks
//! [`AccessGate::evaluate`] what to do, and maps the decision onto HTTP:
//!
//! - `Suspend` => `204 No Content` with `Retry-After: 1`; the browser keeps
//!   showing whatever it had.
//! - `Redirect` => the viewer gets a `303` to the authentication entry point.
//!   For page navigations (`GET`, `HEAD`) the redirect state is stored in the
//!   session first. Form posts are not recorded: their routes have no page
//!   to return to.
//! - `Render` => the [`CurrentUser`] is put into request extensions and the
//!   request continues.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderValue, Method, StatusCode, header::RETRY_AFTER, request::Parts},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use planbook_core::{GateDecision, Location, RedirectState, SessionSnapshot};

use crate::error::AppError;
use crate::models::{CurrentUser, session_keys};
use crate::state::AppState;

/// Seconds a suspended client should wait before retrying.
const RETRY_AFTER_SECONDS: &str = "1";

/// Build the session snapshot for this request.
///
/// A session without a stored user is resolved as signed out. A stored user
/// only counts once the directory has finished loading and still knows it.
///
/// # Errors
///
/// Returns an error if the session cannot be read.
pub async fn session_snapshot(
    state: &AppState,
    session: &Session,
) -> Result<SessionSnapshot<CurrentUser>, tower_sessions::session::Error> {
    let Some(stored) = session
        .get::<CurrentUser>(session_keys::CURRENT_USER)
        .await?
    else {
        return Ok(SessionSnapshot::resolved(None));
    };

    let users = state.users();
    if !users.is_ready() {
        return Ok(SessionSnapshot::loading());
    }

    let user = users.get(&stored.id).await.map(|u| CurrentUser::from(&u));
    if user.is_none() {
        tracing::debug!(user_id = %stored.id, "Session names an unknown user");
    }
    Ok(SessionSnapshot::resolved(user))
}

/// Middleware guarding the protected route tree.
///
/// # Errors
///
/// Responds with an error if the session cannot be read or written, or if
/// the request target is not a representable location.
pub async fn access_gate(
    State(state): State<AppState>,
    session: Session,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let uri = request.uri();
    let location = Location::from_parts(uri.path(), uri.query())
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    let navigation = matches!(*request.method(), Method::GET | Method::HEAD);

    let snapshot = session_snapshot(&state, &session).await?;
    let decision = state.gate().evaluate(snapshot, &location);
    tracing::debug!(gate = %decision.state(), %location, "Access gate evaluated");

    match decision {
        GateDecision::Suspend => {
            let mut response = StatusCode::NO_CONTENT.into_response();
            response
                .headers_mut()
                .insert(RETRY_AFTER, HeaderValue::from_static(RETRY_AFTER_SECONDS));
            Ok(response)
        }
        GateDecision::Redirect(redirect) => {
            if navigation {
                session
                    .insert(session_keys::REDIRECT_STATE, &redirect.state)
                    .await?;
            } else {
                tracing::debug!(%location, "Not recording redirect state for non-navigation");
            }
            Ok(Redirect::to(&redirect.target.to_string()).into_response())
        }
        GateDecision::Render(user) => {
            request.extensions_mut().insert(user);
            Ok(next.run(request).await)
        }
    }
}

/// Extractor for the user the access gate let through.
///
/// Only usable on routes behind [`access_gate`].
///
/// ```rust,ignore
/// async fn handler(RequireUser(user): RequireUser) -> impl IntoResponse {
///     format!("Hello, {}!", user.email)
/// }
/// ```
pub struct RequireUser(pub CurrentUser);

impl<S> FromRequestParts<S> for RequireUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .map(Self)
            .ok_or_else(|| AppError::Internal("route is not behind the access gate".to_string()))
    }
}

/// Store the signed-in user in the session.
///
/// The session id is cycled first so a pre-login id cannot be reused.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_USER, user).await
}

/// Remove the signed-in user from the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentUser>(session_keys::CURRENT_USER)
        .await?;
    Ok(())
}

/// Take the redirect state left by the gate, if any.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn take_redirect_state(
    session: &Session,
) -> Result<Option<RedirectState>, tower_sessions::session::Error> {
    session.remove(session_keys::REDIRECT_STATE).await
}
