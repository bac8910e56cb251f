//! Router-level tests.
//!
//! These drive the full axum `Router` (session layer, access gate, handlers)
//! in-process, carrying the session cookie between requests the way a browser
//! would.

#![allow(clippy::unwrap_used)]

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{
        Request, StatusCode,
        header::{CONTENT_TYPE, COOKIE, LOCATION, RETRY_AFTER, SET_COOKIE},
    },
    response::Response,
};
use tower::ServiceExt;
use url::Url;

use planbook_core::Location;
use planbook_web::config::{SentryConfig, WebConfig};
use planbook_web::routes;
use planbook_web::services::UserDirectory;
use planbook_web::state::AppState;

const EMAIL: &str = "ada%40example.com";
const PASSWORD: &str = "correct-horse";

fn test_config(auth_path: &str) -> WebConfig {
    WebConfig {
        host: "127.0.0.1".parse().unwrap(),
        port: 3000,
        base_url: Url::parse("http://localhost:3000").unwrap(),
        auth_path: Location::parse(auth_path).unwrap(),
        users_file: None,
        session_hours: 168,
        sentry: SentryConfig::default(),
    }
}

/// A cookie-carrying client for one browser session.
struct Client {
    app: Router,
    cookie: Option<String>,
}

impl Client {
    fn new(state: &AppState) -> Self {
        Self {
            app: routes::app(state.clone()),
            cookie: None,
        }
    }

    async fn send(&mut self, mut request: Request<Body>) -> Response {
        if let Some(cookie) = &self.cookie {
            request
                .headers_mut()
                .insert(COOKIE, cookie.parse().unwrap());
        }
        let response = self.app.clone().oneshot(request).await.unwrap();
        if let Some(set_cookie) = response.headers().get(SET_COOKIE) {
            let pair = set_cookie.to_str().unwrap().split(';').next().unwrap();
            self.cookie = Some(pair.to_string());
        }
        response
    }

    async fn get(&mut self, uri: &str) -> Response {
        self.send(Request::get(uri).body(Body::empty()).unwrap())
            .await
    }

    async fn post(&mut self, uri: &str, form: &str) -> Response {
        let request = Request::post(uri)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(form.to_string()))
            .unwrap();
        self.send(request).await
    }

    async fn register(&mut self) -> Response {
        self.post(
            "/auth/register",
            &format!("email={EMAIL}&password={PASSWORD}"),
        )
        .await
    }
}

fn location(response: &Response) -> &str {
    response.headers().get(LOCATION).unwrap().to_str().unwrap()
}

async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn ready_state() -> AppState {
    AppState::new(test_config("/auth"), UserDirectory::ready())
}

#[tokio::test]
async fn health_endpoints_follow_directory_readiness() {
    let state = AppState::new(test_config("/auth"), UserDirectory::loading());
    let mut client = Client::new(&state);

    let response = client.get("/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "ok");

    assert_eq!(
        client.get("/health/ready").await.status(),
        StatusCode::SERVICE_UNAVAILABLE
    );
    state.users().mark_ready();
    assert_eq!(client.get("/health/ready").await.status(), StatusCode::OK);
}

#[tokio::test]
async fn signed_out_viewer_is_redirected_to_auth_without_return_parameter() {
    let mut client = Client::new(&ready_state());

    let response = client.get("/expenses?month=2024-05").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/auth");

    let response = client.get("/auth").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("Sign in"));
}

#[tokio::test]
async fn sign_in_returns_to_the_page_the_gate_stopped() {
    let mut client = Client::new(&ready_state());

    client.get("/expenses?month=2024-05").await;
    let response = client.register().await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/expenses?month=2024-05");

    let response = client.get("/expenses?month=2024-05").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("No scenario selected"));
}

#[tokio::test]
async fn signed_out_form_post_is_not_recorded_as_return_target() {
    let mut client = Client::new(&ready_state());

    let response = client.post("/expenses/abc/delete", "").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/auth");

    let response = client.register().await;
    assert_eq!(location(&response), "/");
    assert_eq!(client.get("/").await.status(), StatusCode::OK);
}

#[tokio::test]
async fn form_post_keeps_an_earlier_return_target() {
    let mut client = Client::new(&ready_state());

    client.get("/income").await;
    client.post("/scenarios/household/select", "").await;

    let response = client.register().await;
    assert_eq!(location(&response), "/income");
}

#[tokio::test]
async fn sign_in_without_redirect_state_goes_to_dashboard() {
    let mut client = Client::new(&ready_state());

    let response = client.register().await;
    assert_eq!(location(&response), "/");

    let response = client.get("/").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("Dashboard"));
}

#[tokio::test]
async fn loading_directory_suspends_signed_in_sessions() {
    let state = AppState::new(test_config("/auth"), UserDirectory::loading());
    let mut client = Client::new(&state);
    client.register().await;

    let response = client.get("/expenses").await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(response.headers().get(RETRY_AFTER).unwrap(), "1");
    assert!(response.headers().get(LOCATION).is_none());
    assert!(body_text(response).await.is_empty());

    state.users().mark_ready();
    assert_eq!(client.get("/expenses").await.status(), StatusCode::OK);
}

#[tokio::test]
async fn loading_directory_still_redirects_signed_out_viewers() {
    let state = AppState::new(test_config("/auth"), UserDirectory::loading());
    let mut client = Client::new(&state);

    let response = client.get("/scenarios").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/auth");
}

#[tokio::test]
async fn login_is_refused_while_directory_loads() {
    let state = AppState::new(test_config("/auth"), UserDirectory::loading());
    let mut client = Client::new(&state);

    let response = client
        .post("/auth", &format!("email={EMAIL}&password={PASSWORD}"))
        .await;
    assert_eq!(location(&response), "/auth?error=unavailable");
}

#[tokio::test]
async fn wrong_password_is_rejected() {
    let state = ready_state();
    let mut first = Client::new(&state);
    first.register().await;

    let mut second = Client::new(&state);
    let response = second
        .post("/auth", &format!("email={EMAIL}&password=wrong-password"))
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/auth?error=credentials");
    assert_eq!(second.get("/").await.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn registration_validates_input() {
    let mut client = Client::new(&ready_state());

    let response = client
        .post("/auth/register", "email=not-an-email&password=long-enough")
        .await;
    assert_eq!(location(&response), "/auth?error=email");

    let response = client
        .post("/auth/register", &format!("email={EMAIL}&password=short"))
        .await;
    assert_eq!(location(&response), "/auth?error=password");

    client.register().await;
    let response = client.register().await;
    assert_eq!(location(&response), "/auth?error=exists");
}

#[tokio::test]
async fn scenario_selection_scopes_ledger_entries() {
    let mut client = Client::new(&ready_state());
    client.register().await;

    let response = client
        .post("/scenarios", "name=Retirement+Plan&base_currency=usd")
        .await;
    assert_eq!(location(&response), "/scenarios");
    let page = body_text(client.get("/scenarios").await).await;
    assert!(page.contains("Retirement Plan"));
    assert!(page.contains("Current"));

    let response = client
        .post(
            "/expenses",
            "description=Rent&amount=1200.50&currency=&occurred_on=2024-05-01&category=",
        )
        .await;
    assert_eq!(location(&response), "/expenses");

    client
        .post("/scenarios", "name=Vacation&base_currency=EUR")
        .await;
    let page = body_text(client.get("/expenses").await).await;
    assert!(page.contains("Vacation"));
    assert!(!page.contains("Rent"));

    let response = client.post("/scenarios/retirement-plan/select", "").await;
    assert_eq!(location(&response), "/");
    let page = body_text(client.get("/expenses").await).await;
    assert!(page.contains("Rent"));
    assert!(page.contains("1200.50 USD"));
}

#[tokio::test]
async fn invalid_entries_are_reported_back() {
    let mut client = Client::new(&ready_state());
    client.register().await;
    client
        .post("/scenarios", "name=Household&base_currency=USD")
        .await;

    let response = client
        .post(
            "/income",
            "description=Salary&amount=-5&occurred_on=2024-05-01",
        )
        .await;
    assert_eq!(location(&response), "/income?error=amount");

    let page = body_text(client.get("/income?error=amount").await).await;
    assert!(page.contains("Amount must be a positive number."));
}

#[tokio::test]
async fn adding_an_entry_without_a_scenario_redirects_to_scenarios() {
    let mut client = Client::new(&ready_state());
    client.register().await;

    let response = client
        .post(
            "/income",
            "description=Salary&amount=4000&occurred_on=2024-05-01",
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/scenarios");
}

#[tokio::test]
async fn deleting_unknown_entries_and_scenarios_is_not_found() {
    let mut client = Client::new(&ready_state());
    client.register().await;
    client
        .post("/scenarios", "name=Household&base_currency=USD")
        .await;

    assert_eq!(
        client.post("/expenses/missing/delete", "").await.status(),
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        client.post("/scenarios/nowhere/select", "").await.status(),
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn login_selects_the_first_scenario() {
    let state = ready_state();
    let mut client = Client::new(&state);
    client.register().await;
    client
        .post("/scenarios", "name=Household&base_currency=USD")
        .await;
    client
        .post("/scenarios", "name=Sabbatical&base_currency=USD")
        .await;

    let response = client.post("/auth/logout", "").await;
    assert_eq!(location(&response), "/auth");
    assert_eq!(client.get("/").await.status(), StatusCode::SEE_OTHER);

    let response = client
        .post("/auth", &format!("email={EMAIL}&password={PASSWORD}"))
        .await;
    assert_eq!(location(&response), "/");
    let page = body_text(client.get("/").await).await;
    assert!(page.contains("Household"));
}

#[tokio::test]
async fn unknown_paths_are_not_gated() {
    let mut client = Client::new(&ready_state());
    assert_eq!(
        client.get("/does-not-exist").await.status(),
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn custom_auth_path_is_used_for_redirects_and_routes() {
    let state = AppState::new(test_config("/login"), UserDirectory::ready());
    let mut client = Client::new(&state);

    let response = client.get("/income").await;
    assert_eq!(location(&response), "/login");
    assert_eq!(client.get("/login").await.status(), StatusCode::OK);

    let response = client
        .post(
            "/login/register",
            &format!("email={EMAIL}&password={PASSWORD}"),
        )
        .await;
    assert_eq!(location(&response), "/income");
}

#[tokio::test]
async fn responses_carry_security_headers_and_request_id() {
    let mut client = Client::new(&ready_state());
    let response = client
        .send(
            Request::get("/health")
                .header("x-request-id", "req-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    let headers = response.headers();
    assert_eq!(headers.get("x-request-id").unwrap(), "req-123");
    assert_eq!(headers.get("x-frame-options").unwrap(), "DENY");
    assert_eq!(headers.get("x-content-type-options").unwrap(), "nosniff");
    assert!(headers.get("content-security-policy").is_some());
}
