//! Application state shared across handlers.

use std::sync::Arc;

use planbook_core::AccessGate;

use crate::config::WebConfig;
use crate::services::{LedgerStore, ScenarioStore, UserDirectory};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// configuration, the access gate and the in-memory stores.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: WebConfig,
    gate: AccessGate,
    users: UserDirectory,
    scenarios: ScenarioStore,
    ledger: LedgerStore,
}

impl AppState {
    /// Create a new application state.
    ///
    /// The access gate redirects to `config.auth_path`. Pass
    /// [`UserDirectory::loading`] when a seed still has to be loaded, and
    /// mark it ready once done.
    #[must_use]
    pub fn new(config: WebConfig, users: UserDirectory) -> Self {
        let gate = AccessGate::new(config.auth_path.clone());
        Self {
            inner: Arc::new(AppStateInner {
                config,
                gate,
                users,
                scenarios: ScenarioStore::new(),
                ledger: LedgerStore::new(),
            }),
        }
    }

    /// Get a reference to the web configuration.
    #[must_use]
    pub fn config(&self) -> &WebConfig {
        &self.inner.config
    }

    /// Get a reference to the access gate.
    #[must_use]
    pub fn gate(&self) -> &AccessGate {
        &self.inner.gate
    }

    /// Get a reference to the user directory.
    #[must_use]
    pub fn users(&self) -> &UserDirectory {
        &self.inner.users
    }

    /// Get a reference to the scenario store.
    #[must_use]
    pub fn scenarios(&self) -> &ScenarioStore {
        &self.inner.scenarios
    }

    /// Get a reference to the ledger store.
    #[must_use]
    pub fn ledger(&self) -> &LedgerStore {
        &self.inner.ledger
    }
}
