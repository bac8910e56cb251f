//! Planbook web server.
//!
//! # Architecture
//!
//! - Axum web framework with Askama templates for server-side rendering
//! - tower-sessions (in-memory store) for sign-in state and the current
//!   scenario
//! - In-memory user directory, optionally seeded from a JSON file at startup
//!
//! The user directory loads in the background. Until it is ready, protected
//! pages answer `204 No Content` for signed-in sessions and
//! `/health/ready` reports 503.

#![cfg_attr(not(test), forbid(unsafe_code))]

use planbook_web::config::WebConfig;
use planbook_web::routes;
use planbook_web::services::UserDirectory;
use planbook_web::state::AppState;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &WebConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry.dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry
                .environment
                .clone()
                .map(std::borrow::Cow::Owned),
            sample_rate: config.sentry.sample_rate,
            traces_sample_rate: config.sentry.traces_sample_rate,
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    // Load configuration from environment (needed for Sentry init)
    let config = WebConfig::from_env().expect("Failed to load configuration");

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "planbook_web=info,tower_http=debug".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let state = AppState::new(config.clone(), UserDirectory::loading());
    spawn_directory_load(&state, &config);

    let app = routes::app(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction());

    let addr = config.socket_addr();
    tracing::info!(%addr, base_url = %config.base_url, "planbook listening");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");
}

/// Load the users seed file in the background, then mark the directory ready.
///
/// The directory is marked ready even when loading fails, so sessions do not
/// stay suspended forever; the failure is logged.
fn spawn_directory_load(state: &AppState, config: &WebConfig) {
    let state = state.clone();
    let users_file = config.users_file.clone();

    tokio::spawn(async move {
        let users = state.users();
        match users_file {
            Some(path) => match users.load_seed(&path).await {
                Ok(added) => tracing::info!(added, path = %path.display(), "User seed loaded"),
                Err(e) => {
                    tracing::error!(error = %e, path = %path.display(), "Failed to load user seed");
                }
            },
            None => tracing::info!("No user seed configured"),
        }
        users.mark_ready();
        tracing::info!("User directory ready");
    });
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
