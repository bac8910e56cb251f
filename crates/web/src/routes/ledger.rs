//! Expense and income route handlers.
//!
//! Both lists share one set of handlers parameterized by [`EntryKind`]; the
//! public functions are thin wrappers so each route names its kind. Every
//! handler is scoped to the scenario the resolver reports.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use serde::Deserialize;

use planbook_core::{EntryId, ResolvedScenario};

use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{CurrentScenario, RequireUser};
use crate::models::{CurrentUser, EntryKind, LedgerEntry, Scenario};
use crate::routes::{Nav, error_message, selected_scenario};
use crate::services::EntryInput;
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// New entry form data.
#[derive(Debug, Deserialize)]
pub struct EntryForm {
    pub description: String,
    pub amount: String,
    pub currency: Option<String>,
    pub occurred_on: String,
    pub category: Option<String>,
}

/// Query parameters for error display.
#[derive(Debug, Deserialize)]
pub struct MessageQuery {
    pub error: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Entry list for the current scenario.
#[derive(Template, WebTemplate)]
#[template(path = "ledger/index.html")]
pub struct LedgerTemplate {
    pub nav: Nav,
    pub kind: EntryKind,
    pub scenario: Scenario,
    pub entries: Vec<LedgerEntry>,
    pub today: String,
    pub error: Option<&'static str>,
}

/// Shown instead of a list when no scenario is selected.
#[derive(Template, WebTemplate)]
#[template(path = "ledger/no_scenario.html")]
pub struct NoScenarioTemplate {
    pub nav: Nav,
    pub kind: EntryKind,
}

// =============================================================================
// Handlers
// =============================================================================

/// List expenses.
pub async fn expenses(
    state: State<AppState>,
    user: RequireUser,
    scenario: CurrentScenario,
    query: Query<MessageQuery>,
) -> Response {
    list(EntryKind::Expense, state, user, scenario, query).await
}

/// List income.
pub async fn income(
    state: State<AppState>,
    user: RequireUser,
    scenario: CurrentScenario,
    query: Query<MessageQuery>,
) -> Response {
    list(EntryKind::Income, state, user, scenario, query).await
}

/// Add an expense.
pub async fn add_expense(
    state: State<AppState>,
    user: RequireUser,
    scenario: CurrentScenario,
    form: Form<EntryForm>,
) -> Response {
    add(EntryKind::Expense, state, user, scenario, form).await
}

/// Add income.
pub async fn add_income(
    state: State<AppState>,
    user: RequireUser,
    scenario: CurrentScenario,
    form: Form<EntryForm>,
) -> Response {
    add(EntryKind::Income, state, user, scenario, form).await
}

/// Remove an expense.
///
/// # Errors
///
/// Returns `AppError::NotFound` if the current scenario has no such expense.
pub async fn delete_expense(
    state: State<AppState>,
    user: RequireUser,
    scenario: CurrentScenario,
    id: Path<String>,
) -> Result<Response> {
    delete(EntryKind::Expense, state, user, scenario, id).await
}

/// Remove income.
///
/// # Errors
///
/// Returns `AppError::NotFound` if the current scenario has no such entry.
pub async fn delete_income(
    state: State<AppState>,
    user: RequireUser,
    scenario: CurrentScenario,
    id: Path<String>,
) -> Result<Response> {
    delete(EntryKind::Income, state, user, scenario, id).await
}

// =============================================================================
// Shared implementation
// =============================================================================

async fn list(
    kind: EntryKind,
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    CurrentScenario(resolved): CurrentScenario,
    Query(query): Query<MessageQuery>,
) -> Response {
    let nav = Nav::new(&state, &user);
    let Some(scenario) = scenario_for(&state, &user, &resolved).await else {
        return NoScenarioTemplate { nav, kind }.into_response();
    };

    LedgerTemplate {
        nav,
        kind,
        entries: state.ledger().list(&scenario.id, kind).await,
        scenario,
        today: Utc::now().date_naive().format("%Y-%m-%d").to_string(),
        error: query.error.as_deref().and_then(error_message),
    }
    .into_response()
}

async fn add(
    kind: EntryKind,
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    CurrentScenario(resolved): CurrentScenario,
    Form(form): Form<EntryForm>,
) -> Response {
    let Some(scenario) = scenario_for(&state, &user, &resolved).await else {
        return Redirect::to("/scenarios").into_response();
    };

    let input = EntryInput {
        description: &form.description,
        amount: &form.amount,
        currency: form.currency.as_deref(),
        occurred_on: &form.occurred_on,
        category: form.category.as_deref(),
    };
    match input.validate(&scenario.base_currency) {
        Ok(entry) => {
            let entry = state.ledger().add(&scenario.id, kind, entry).await;
            tracing::info!(
                scenario_id = %scenario.id,
                entry_id = %entry.id,
                %kind,
                "Entry added"
            );
            Redirect::to(kind.path()).into_response()
        }
        Err(e) => {
            tracing::debug!(error = %e, %kind, "Entry rejected");
            Redirect::to(&format!("{}?error={}", kind.path(), e.code())).into_response()
        }
    }
}

async fn delete(
    kind: EntryKind,
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    CurrentScenario(resolved): CurrentScenario,
    Path(id): Path<String>,
) -> Result<Response> {
    let not_found = || AppError::NotFound(format!("{kind} {id}"));
    let scenario = scenario_for(&state, &user, &resolved)
        .await
        .ok_or_else(not_found)?;

    if !state
        .ledger()
        .remove(&scenario.id, kind, &EntryId::new(id.as_str()))
        .await
    {
        return Err(not_found());
    }
    tracing::info!(scenario_id = %scenario.id, entry_id = %id, %kind, "Entry removed");

    Ok(Redirect::to(kind.path()).into_response())
}

async fn scenario_for(
    state: &AppState,
    user: &CurrentUser,
    resolved: &ResolvedScenario,
) -> Option<Scenario> {
    if resolved.is_absent() {
        return None;
    }
    let scenario = selected_scenario(state, user, resolved).await;
    if scenario.is_none() {
        tracing::debug!(user_id = %user.id, "Cached scenario no longer exists");
    }
    scenario
}
