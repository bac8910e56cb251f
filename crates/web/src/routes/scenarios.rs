//! Scenario management route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;

use planbook_core::{CurrencyCode, ScenarioSlug};

use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{CurrentScenario, RequireUser, set_current_scenario};
use crate::models::Scenario;
use crate::routes::{Nav, error_message, selected_scenario};
use crate::state::AppState;

/// Scenario creation form data.
#[derive(Debug, Deserialize)]
pub struct NewScenarioForm {
    pub name: String,
    pub base_currency: String,
}

/// Query parameters for error display.
#[derive(Debug, Deserialize)]
pub struct MessageQuery {
    pub error: Option<String>,
}

/// One row of the scenario list.
#[derive(Debug, Clone)]
pub struct ScenarioRow {
    pub scenario: Scenario,
    pub is_current: bool,
}

/// Scenario list template.
#[derive(Template, WebTemplate)]
#[template(path = "scenarios/index.html")]
pub struct ScenariosTemplate {
    pub nav: Nav,
    pub rows: Vec<ScenarioRow>,
    pub default_currency: CurrencyCode,
    pub error: Option<&'static str>,
}

/// List the user's scenarios, marking the current one.
pub async fn index(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    CurrentScenario(resolved): CurrentScenario,
    Query(query): Query<MessageQuery>,
) -> Response {
    let current = selected_scenario(&state, &user, &resolved)
        .await
        .map(|scenario| scenario.id);
    let rows = state
        .scenarios()
        .list(&user.id)
        .await
        .into_iter()
        .map(|scenario| ScenarioRow {
            is_current: current.as_ref() == Some(&scenario.id),
            scenario,
        })
        .collect();

    ScenariosTemplate {
        nav: Nav::new(&state, &user),
        rows,
        default_currency: CurrencyCode::default(),
        error: query.error.as_deref().and_then(error_message),
    }
    .into_response()
}

/// Create a scenario and make it current.
///
/// # Errors
///
/// Returns an error if the session cannot be written.
pub async fn create(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    session: Session,
    Form(form): Form<NewScenarioForm>,
) -> Result<Response> {
    let Ok(base_currency) = CurrencyCode::parse(&form.base_currency) else {
        return Ok(Redirect::to("/scenarios?error=currency").into_response());
    };

    let scenario = match state
        .scenarios()
        .create(&user.id, &form.name, base_currency)
        .await
    {
        Ok(scenario) => scenario,
        Err(e) => {
            tracing::warn!(error = %e, "Scenario rejected");
            return Ok(Redirect::to("/scenarios?error=name").into_response());
        }
    };

    set_current_scenario(&session, &scenario).await?;
    tracing::info!(
        user_id = %user.id,
        scenario_id = %scenario.id,
        slug = %scenario.slug,
        "Scenario created"
    );

    Ok(Redirect::to("/scenarios").into_response())
}

/// Make one of the user's scenarios current.
///
/// # Errors
///
/// Returns `AppError::NotFound` if the user has no scenario with this slug.
pub async fn select(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    session: Session,
    Path(slug): Path<String>,
) -> Result<Response> {
    let not_found = || AppError::NotFound(format!("scenario {slug}"));
    let parsed = ScenarioSlug::parse(&slug).map_err(|_| not_found())?;
    let scenario = state
        .scenarios()
        .find_by_slug(&user.id, &parsed)
        .await
        .ok_or_else(not_found)?;

    set_current_scenario(&session, &scenario).await?;
    tracing::info!(user_id = %user.id, scenario_id = %scenario.id, "Scenario selected");

    Ok(Redirect::to("/").into_response())
}
