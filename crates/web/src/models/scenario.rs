//! Scenario domain types.

use chrono::{DateTime, Utc};

use planbook_core::{CurrencyCode, ScenarioId, ScenarioRef, ScenarioSlug, UserId};

/// A named financial plan owned by one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scenario {
    /// Unique scenario ID.
    pub id: ScenarioId,
    /// Owner of the scenario.
    pub owner: UserId,
    /// Display name.
    pub name: String,
    /// URL-safe name, unique per owner.
    pub slug: ScenarioSlug,
    /// Default currency for new entries.
    pub base_currency: CurrencyCode,
    /// When the scenario was created.
    pub created_at: DateTime<Utc>,
}

impl Scenario {
    /// The record written to the viewer's cache when this scenario is selected.
    #[must_use]
    pub fn to_ref(&self) -> ScenarioRef {
        ScenarioRef {
            id: Some(self.id.clone()),
            slug: Some(self.slug.clone()),
            base_currency: Some(self.base_currency.clone()),
        }
    }
}
