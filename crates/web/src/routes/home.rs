//! Dashboard route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::State,
    response::{IntoResponse, Response},
};

use crate::filters;
use crate::middleware::{CurrentScenario, RequireUser};
use crate::models::{EntryKind, Scenario};
use crate::routes::{Nav, selected_scenario};
use crate::state::AppState;

/// Dashboard template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct DashboardTemplate {
    pub nav: Nav,
    pub scenario: Option<Scenario>,
    pub expense_count: usize,
    pub income_count: usize,
}

/// Display the dashboard: who is signed in, the current scenario and how
/// many entries it holds.
pub async fn dashboard(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    CurrentScenario(resolved): CurrentScenario,
) -> Response {
    let scenario = selected_scenario(&state, &user, &resolved).await;

    let (expense_count, income_count) = match &scenario {
        Some(s) => (
            state.ledger().count(&s.id, EntryKind::Expense).await,
            state.ledger().count(&s.id, EntryKind::Income).await,
        ),
        None => (0, 0),
    };

    DashboardTemplate {
        nav: Nav::new(&state, &user),
        scenario,
        expense_count,
        income_count,
    }
    .into_response()
}
