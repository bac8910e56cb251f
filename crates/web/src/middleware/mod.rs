//! HTTP middleware stack for the web app.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Security headers (CSP, frame options, etc.)
//! 5. Session layer (tower-sessions with in-memory store)
//! 6. Access gate (protected routes only)

pub mod gate;
pub mod request_id;
pub mod scenario;
pub mod security_headers;
pub mod session;

pub use gate::{
    RequireUser, access_gate, clear_current_user, session_snapshot, set_current_user,
    take_redirect_state,
};
pub use request_id::request_id_middleware;
pub use scenario::{CurrentScenario, clear_current_scenario, set_current_scenario};
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;
