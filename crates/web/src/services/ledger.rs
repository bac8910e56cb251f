//! In-memory expense and income store.
//!
//! Entries are kept per scenario. The store records and lists entries; it
//! performs no totals or other calculations.

use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use thiserror::Error;
use tokio::sync::RwLock;

use planbook_core::{CurrencyCode, CurrencyError, EntryId, Money, ScenarioId};

use crate::models::{EntryKind, LedgerEntry, NewEntry};

/// Maximum length of an entry description.
const MAX_DESCRIPTION_LENGTH: usize = 200;

/// Maximum length of an entry category.
const MAX_CATEGORY_LENGTH: usize = 60;

/// Errors from ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("description is required")]
    MissingDescription,

    #[error("description must be at most {max} characters", max = MAX_DESCRIPTION_LENGTH)]
    DescriptionTooLong,

    #[error("category must be at most {max} characters", max = MAX_CATEGORY_LENGTH)]
    CategoryTooLong,

    #[error("amount must be a positive number")]
    InvalidAmount,

    #[error("invalid currency: {0}")]
    InvalidCurrency(#[from] CurrencyError),

    #[error("date must be YYYY-MM-DD")]
    InvalidDate,
}

impl LedgerError {
    /// Short code passed back to the list page as `?error=`.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::MissingDescription | Self::DescriptionTooLong => "description",
            Self::CategoryTooLong => "category",
            Self::InvalidAmount => "amount",
            Self::InvalidCurrency(_) => "currency",
            Self::InvalidDate => "date",
        }
    }
}

/// Raw form input for a new entry.
#[derive(Debug, Clone, Default)]
pub struct EntryInput<'a> {
    pub description: &'a str,
    pub amount: &'a str,
    pub currency: Option<&'a str>,
    pub occurred_on: &'a str,
    pub category: Option<&'a str>,
}

impl EntryInput<'_> {
    /// Validate the input, filling in `default_currency` when no currency
    /// was given.
    ///
    /// # Errors
    ///
    /// Returns the first `LedgerError` found.
    pub fn validate(&self, default_currency: &CurrencyCode) -> Result<NewEntry, LedgerError> {
        let description = self.description.trim();
        if description.is_empty() {
            return Err(LedgerError::MissingDescription);
        }
        if description.chars().count() > MAX_DESCRIPTION_LENGTH {
            return Err(LedgerError::DescriptionTooLong);
        }

        let amount: Decimal = self
            .amount
            .trim()
            .parse()
            .map_err(|_| LedgerError::InvalidAmount)?;
        if amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount);
        }

        let currency = match self.currency.map(str::trim).filter(|c| !c.is_empty()) {
            Some(code) => CurrencyCode::parse(code)?,
            None => default_currency.clone(),
        };

        let occurred_on = NaiveDate::parse_from_str(self.occurred_on.trim(), "%Y-%m-%d")
            .map_err(|_| LedgerError::InvalidDate)?;

        let category = self
            .category
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_owned);
        if category
            .as_ref()
            .is_some_and(|c| c.chars().count() > MAX_CATEGORY_LENGTH)
        {
            return Err(LedgerError::CategoryTooLong);
        }

        Ok(NewEntry {
            description: description.to_owned(),
            amount: Money::new(amount, currency),
            occurred_on,
            category,
        })
    }
}

/// Entries grouped by scenario.
#[derive(Debug, Default)]
pub struct LedgerStore {
    by_scenario: RwLock<HashMap<ScenarioId, Vec<LedgerEntry>>>,
}

impl LedgerStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new entry in a scenario.
    pub async fn add(
        &self,
        scenario_id: &ScenarioId,
        kind: EntryKind,
        entry: NewEntry,
    ) -> LedgerEntry {
        let entry = LedgerEntry {
            id: EntryId::generate(),
            scenario_id: scenario_id.clone(),
            kind,
            description: entry.description,
            amount: entry.amount,
            occurred_on: entry.occurred_on,
            category: entry.category,
            created_at: Utc::now(),
        };
        self.by_scenario
            .write()
            .await
            .entry(scenario_id.clone())
            .or_default()
            .push(entry.clone());
        entry
    }

    /// Entries of one kind in a scenario, newest first (by date, then by
    /// creation time).
    pub async fn list(&self, scenario_id: &ScenarioId, kind: EntryKind) -> Vec<LedgerEntry> {
        let mut entries: Vec<LedgerEntry> = self
            .by_scenario
            .read()
            .await
            .get(scenario_id)
            .map(|entries| entries.iter().filter(|e| e.kind == kind).cloned().collect())
            .unwrap_or_default();
        entries.sort_by(|a, b| {
            b.occurred_on
                .cmp(&a.occurred_on)
                .then(b.created_at.cmp(&a.created_at))
        });
        entries
    }

    /// Number of entries of one kind in a scenario.
    pub async fn count(&self, scenario_id: &ScenarioId, kind: EntryKind) -> usize {
        self.by_scenario
            .read()
            .await
            .get(scenario_id)
            .map_or(0, |entries| entries.iter().filter(|e| e.kind == kind).count())
    }

    /// Remove an entry of the given kind from a scenario.
    ///
    /// Returns `false` if no such entry exists in that scenario.
    pub async fn remove(&self, scenario_id: &ScenarioId, kind: EntryKind, id: &EntryId) -> bool {
        let mut by_scenario = self.by_scenario.write().await;
        let Some(entries) = by_scenario.get_mut(scenario_id) else {
            return false;
        };
        let before = entries.len();
        entries.retain(|e| !(e.kind == kind && &e.id == id));
        entries.len() != before
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn usd() -> CurrencyCode {
        CurrencyCode::parse("USD").unwrap()
    }

    fn input<'a>(description: &'a str, amount: &'a str, occurred_on: &'a str) -> EntryInput<'a> {
        EntryInput {
            description,
            amount,
            occurred_on,
            ..EntryInput::default()
        }
    }

    #[test]
    fn test_validate_defaults_currency_and_trims() {
        let entry = EntryInput {
            category: Some("  housing "),
            ..input("  Rent ", "1200.50", "2024-05-01")
        }
        .validate(&usd())
        .unwrap();

        assert_eq!(entry.description, "Rent");
        assert_eq!(entry.amount.to_string(), "1200.50 USD");
        assert_eq!(entry.category.as_deref(), Some("housing"));
        assert_eq!(entry.occurred_on, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
    }

    #[test]
    fn test_validate_explicit_currency() {
        let entry = EntryInput {
            currency: Some("eur"),
            ..input("Ferry", "35", "2024-07-14")
        }
        .validate(&usd())
        .unwrap();
        assert_eq!(entry.amount.currency.as_str(), "EUR");
    }

    #[test]
    fn test_validate_errors() {
        let cases = [
            (input("   ", "1", "2024-01-01"), "description"),
            (input("Coffee", "0", "2024-01-01"), "amount"),
            (input("Coffee", "-3", "2024-01-01"), "amount"),
            (input("Coffee", "lots", "2024-01-01"), "amount"),
            (input("Coffee", "3", "01/02/2024"), "date"),
            (
                EntryInput {
                    currency: Some("dollars"),
                    ..input("Coffee", "3", "2024-01-01")
                },
                "currency",
            ),
        ];
        for (case, code) in cases {
            assert_eq!(case.validate(&usd()).unwrap_err().code(), code, "{case:?}");
        }
    }

    #[tokio::test]
    async fn test_entries_are_scoped_sorted_and_removable() {
        let store = LedgerStore::new();
        let plan = ScenarioId::new("plan");
        let other = ScenarioId::new("other");

        let older = input("Groceries", "80", "2024-03-01").validate(&usd()).unwrap();
        let newer = input("Utilities", "120", "2024-04-01").validate(&usd()).unwrap();
        let salary = input("Salary", "4000", "2024-04-01").validate(&usd()).unwrap();

        let groceries = store.add(&plan, EntryKind::Expense, older).await;
        store.add(&plan, EntryKind::Expense, newer).await;
        store.add(&plan, EntryKind::Income, salary).await;

        let expenses = store.list(&plan, EntryKind::Expense).await;
        let names: Vec<_> = expenses.iter().map(|e| e.description.as_str()).collect();
        assert_eq!(names, ["Utilities", "Groceries"]);
        assert_eq!(store.count(&plan, EntryKind::Income).await, 1);
        assert!(store.list(&other, EntryKind::Expense).await.is_empty());

        assert!(!store.remove(&other, EntryKind::Expense, &groceries.id).await);
        assert!(!store.remove(&plan, EntryKind::Income, &groceries.id).await);
        assert!(store.remove(&plan, EntryKind::Expense, &groceries.id).await);
        assert_eq!(store.count(&plan, EntryKind::Expense).await, 1);
    }
}
