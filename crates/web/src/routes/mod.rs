//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                  - Liveness check
//! GET  /health/ready            - Readiness check (user directory loaded)
//!
//! # Auth (path configurable, default /auth)
//! GET  /auth                    - Login and registration forms
//! POST /auth                    - Login action
//! POST /auth/register           - Register action
//! POST /auth/logout             - Logout action
//!
//! # Protected (behind the access gate)
//! GET  /                        - Dashboard
//! GET  /scenarios               - Scenario list
//! POST /scenarios               - Create scenario
//! POST /scenarios/{slug}/select - Make scenario current
//! GET  /expenses                - Expenses of the current scenario
//! POST /expenses                - Add expense
//! POST /expenses/{id}/delete    - Remove expense
//! GET  /income                  - Income of the current scenario
//! POST /income                  - Add income
//! POST /income/{id}/delete      - Remove income
//! ```

pub mod auth;
pub mod health;
pub mod home;
pub mod ledger;
pub mod scenarios;

use axum::{
    Router,
    http::Request,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
};
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use planbook_core::ResolvedScenario;

use crate::middleware::{
    access_gate, create_session_layer, request_id_middleware, security_headers_middleware,
};
use crate::models::{CurrentUser, Scenario};
use crate::state::AppState;

/// Create the authentication routes, mounted at `auth_path`.
pub fn auth_routes(auth_path: &str) -> Router<AppState> {
    let base = auth_path.trim_end_matches('/');
    Router::new()
        .route(auth_path, get(auth::page).post(auth::login))
        .route(&format!("{base}/register"), post(auth::register))
        .route(&format!("{base}/logout"), post(auth::logout))
}

/// Create the scenario routes router.
pub fn scenario_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(scenarios::index).post(scenarios::create))
        .route("/{slug}/select", post(scenarios::select))
}

/// Create the expense routes router.
pub fn expense_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(ledger::expenses).post(ledger::add_expense))
        .route("/{id}/delete", post(ledger::delete_expense))
}

/// Create the income routes router.
pub fn income_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(ledger::income).post(ledger::add_income))
        .route("/{id}/delete", post(ledger::delete_income))
}

/// Create the routes that require a signed-in user.
///
/// The access gate is applied as a route layer, so unknown paths still 404
/// instead of bouncing through the login page.
pub fn protected_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(home::dashboard))
        .nest("/scenarios", scenario_routes())
        .nest("/expenses", expense_routes())
        .nest("/income", income_routes())
        .route_layer(from_fn_with_state(state.clone(), access_gate))
}

/// Build the complete application router.
pub fn app(state: AppState) -> Router {
    let session_layer = create_session_layer(state.config());

    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .merge(auth_routes(state.config().auth_path.path()))
        .merge(protected_routes(&state))
        .layer(session_layer)
        .layer(from_fn(security_headers_middleware))
        .layer(from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
}

/// Navigation data shared by every protected page.
#[derive(Debug, Clone)]
pub struct Nav {
    /// Signed-in user's email.
    pub email: String,
    /// Logout form action.
    pub logout_action: String,
}

impl Nav {
    /// Build the navigation for `user`.
    #[must_use]
    pub fn new(state: &AppState, user: &CurrentUser) -> Self {
        Self {
            email: user.email.to_string(),
            logout_action: format!("{}/logout", auth::auth_base(state)),
        }
    }
}

/// The user's scenario that the resolver points at, if it still exists.
///
/// The id is preferred; the slug is used when the cache only holds a slug.
pub async fn selected_scenario(
    state: &AppState,
    user: &CurrentUser,
    resolved: &ResolvedScenario,
) -> Option<Scenario> {
    if let Some(id) = &resolved.scenario_id {
        return state.scenarios().get(&user.id, id).await;
    }
    if let Some(slug) = &resolved.scenario_slug {
        return state.scenarios().find_by_slug(&user.id, slug).await;
    }
    None
}

/// Human-readable text for an `?error=` code.
#[must_use]
pub fn error_message(code: &str) -> Option<&'static str> {
    let message = match code {
        "email" => "Please enter a valid email address.",
        "credentials" => "Email or password is incorrect.",
        "exists" => "An account with this email already exists.",
        "password" => "Passwords must be at least 8 characters.",
        "unavailable" => "Sign-in is starting up. Please try again in a moment.",
        "name" => "Please enter a scenario name using letters or digits.",
        "currency" => "Currency must be a three-letter code such as USD.",
        "description" => "Please enter a description of up to 200 characters.",
        "category" => "Categories can be at most 60 characters.",
        "amount" => "Amount must be a positive number.",
        "date" => "Date must be in YYYY-MM-DD format.",
        "internal" => "Something went wrong. Please try again.",
        _ => return None,
    };
    Some(message)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;

    use planbook_core::{
        CURRENT_SCENARIO_KEY, Email, Location, MemoryCache, ScenarioRef, ScenarioResolver,
    };
    use url::Url;

    use crate::config::{SentryConfig, WebConfig};
    use crate::services::UserDirectory;

    /// App state with a ready, empty user directory.
    pub(crate) fn test_state() -> AppState {
        let config = WebConfig {
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: Url::parse("http://localhost:3000").unwrap(),
            auth_path: Location::parse("/auth").unwrap(),
            users_file: None,
            session_hours: 168,
            sentry: SentryConfig::default(),
        };
        AppState::new(config, UserDirectory::ready())
    }

    /// Add a user to the directory and return their session identity.
    pub(crate) async fn signed_in(state: &AppState) -> CurrentUser {
        let user = state
            .users()
            .insert(
                Email::parse("ada@example.com").unwrap(),
                "$argon2id$v=19$m=19456,t=2,p=1$c29tZXNhbHQ$aGFzaA".to_string(),
            )
            .await
            .unwrap();
        CurrentUser::from(&user)
    }

    /// Resolve a cache entry that only carries the scenario's slug.
    pub(crate) fn slug_only(scenario: &Scenario) -> ResolvedScenario {
        let mut cache = MemoryCache::new();
        cache.insert(
            CURRENT_SCENARIO_KEY,
            ScenarioRef {
                slug: Some(scenario.slug.clone()),
                ..ScenarioRef::default()
            },
        );
        ScenarioResolver::new(&cache).resolve()
    }

    #[tokio::test]
    async fn test_selected_scenario_falls_back_to_slug() {
        let state = test_state();
        let user = signed_in(&state).await;
        let currency = planbook_core::CurrencyCode::default();
        state
            .scenarios()
            .create(&user.id, "Household", currency.clone())
            .await
            .unwrap();
        let vacation = state
            .scenarios()
            .create(&user.id, "Vacation", currency)
            .await
            .unwrap();

        let resolved = slug_only(&vacation);
        assert_eq!(resolved.scenario_id, None);
        assert_eq!(
            selected_scenario(&state, &user, &resolved).await,
            Some(vacation.clone())
        );

        let mut stale = slug_only(&vacation);
        stale.scenario_id = Some(planbook_core::ScenarioId::new("gone"));
        assert_eq!(selected_scenario(&state, &user, &stale).await, None);

        assert_eq!(
            selected_scenario(&state, &user, &ResolvedScenario::absent()).await,
            None
        );
    }

    #[test]
    fn test_error_message_known_and_unknown_codes() {
        assert_eq!(
            error_message("credentials"),
            Some("Email or password is incorrect.")
        );
        assert!(error_message("<script>").is_none());
        assert!(error_message("").is_none());
    }
}
