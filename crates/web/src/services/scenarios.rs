//! In-memory scenario store.

use std::collections::HashMap;

use chrono::Utc;
use thiserror::Error;
use tokio::sync::RwLock;

use planbook_core::{CurrencyCode, ScenarioId, ScenarioSlug, SlugError, UserId};

use crate::models::Scenario;

/// Maximum length of a scenario display name.
const MAX_NAME_LENGTH: usize = 80;

/// Errors from scenario operations.
#[derive(Debug, Error)]
pub enum ScenarioError {
    /// The name is empty or has nothing a slug can be built from.
    #[error("invalid scenario name: {0}")]
    InvalidName(#[from] SlugError),

    /// The name is longer than allowed.
    #[error("scenario name must be at most {max} characters", max = MAX_NAME_LENGTH)]
    NameTooLong,
}

/// Scenarios grouped by owner, in creation order.
#[derive(Debug, Default)]
pub struct ScenarioStore {
    by_owner: RwLock<HashMap<UserId, Vec<Scenario>>>,
}

impl ScenarioStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a scenario for `owner`.
    ///
    /// The slug is derived from the name; if the owner already has a
    /// scenario with that slug, a numeric suffix (`-2`, `-3`, ...) is added.
    ///
    /// # Errors
    ///
    /// Returns `ScenarioError::InvalidName` if no slug can be derived from the
    /// name, or `ScenarioError::NameTooLong` if it exceeds the limit.
    pub async fn create(
        &self,
        owner: &UserId,
        name: &str,
        base_currency: CurrencyCode,
    ) -> Result<Scenario, ScenarioError> {
        let name = name.trim();
        if name.chars().count() > MAX_NAME_LENGTH {
            return Err(ScenarioError::NameTooLong);
        }
        let base_slug = ScenarioSlug::from_name(name)?;

        let mut by_owner = self.by_owner.write().await;
        let scenarios = by_owner.entry(owner.clone()).or_default();

        let mut slug = base_slug.clone();
        let mut n = 2;
        while scenarios.iter().any(|s| s.slug == slug) {
            slug = base_slug.with_suffix(n);
            n += 1;
        }

        let scenario = Scenario {
            id: ScenarioId::generate(),
            owner: owner.clone(),
            name: name.to_owned(),
            slug,
            base_currency,
            created_at: Utc::now(),
        };
        scenarios.push(scenario.clone());
        Ok(scenario)
    }

    /// All scenarios of `owner`, oldest first.
    pub async fn list(&self, owner: &UserId) -> Vec<Scenario> {
        self.by_owner
            .read()
            .await
            .get(owner)
            .cloned()
            .unwrap_or_default()
    }

    /// The owner's first scenario, selected automatically at login.
    pub async fn default_for(&self, owner: &UserId) -> Option<Scenario> {
        self.by_owner
            .read()
            .await
            .get(owner)
            .and_then(|scenarios| scenarios.first())
            .cloned()
    }

    /// Find one of the owner's scenarios by slug.
    pub async fn find_by_slug(&self, owner: &UserId, slug: &ScenarioSlug) -> Option<Scenario> {
        self.by_owner
            .read()
            .await
            .get(owner)
            .and_then(|scenarios| scenarios.iter().find(|s| &s.slug == slug))
            .cloned()
    }

    /// Find one of the owner's scenarios by id.
    pub async fn get(&self, owner: &UserId, id: &ScenarioId) -> Option<Scenario> {
        self.by_owner
            .read()
            .await
            .get(owner)
            .and_then(|scenarios| scenarios.iter().find(|s| &s.id == id))
            .cloned()
    }
}
