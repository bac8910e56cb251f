//! Current scenario, read from and written to the session.
//!
//! The session is the shared cache behind [`ScenarioResolver`]: writers store
//! a [`ScenarioRef`] under the current-scenario key, and readers take a
//! snapshot of that entry and resolve it.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use planbook_core::{MemoryCache, ResolvedScenario, ScenarioRef, ScenarioResolver};

use crate::models::{Scenario, session_keys};

/// Extractor for the viewer's current scenario.
///
/// Never rejects: a missing session or unreadable entry resolves to an
/// absent scenario.
pub struct CurrentScenario(pub ResolvedScenario);

impl<S> FromRequestParts<S> for CurrentScenario
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let mut cache = MemoryCache::new();
        if let Some(session) = parts.extensions.get::<Session>() {
            match session
                .get::<ScenarioRef>(session_keys::CURRENT_SCENARIO)
                .await
            {
                Ok(Some(entry)) => {
                    cache.insert(session_keys::CURRENT_SCENARIO, entry);
                }
                Ok(None) => {}
                Err(e) => tracing::warn!(error = %e, "Failed to read current scenario"),
            }
        }

        Ok(Self(ScenarioResolver::new(&cache).resolve()))
    }
}

/// Make `scenario` the viewer's current scenario.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_scenario(
    session: &Session,
    scenario: &Scenario,
) -> Result<(), tower_sessions::session::Error> {
    session
        .insert(session_keys::CURRENT_SCENARIO, scenario.to_ref())
        .await
}

/// Forget the viewer's current scenario.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_scenario(
    session: &Session,
) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<ScenarioRef>(session_keys::CURRENT_SCENARIO)
        .await?;
    Ok(())
}
