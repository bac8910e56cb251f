//! Expense and income entries.

use core::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use planbook_core::{EntryId, Money, ScenarioId};

/// Which list an entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Expense,
    Income,
}

impl EntryKind {
    /// Route prefix of the list view (`/expenses`, `/income`).
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Expense => "/expenses",
            Self::Income => "/income",
        }
    }

    /// Page heading.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Expense => "Expenses",
            Self::Income => "Income",
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Expense => "expense",
            Self::Income => "income",
        })
    }
}

/// A recorded expense or income item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    pub id: EntryId,
    pub scenario_id: ScenarioId,
    pub kind: EntryKind,
    pub description: String,
    pub amount: Money,
    pub occurred_on: NaiveDate,
    pub category: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Validated input for a new entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEntry {
    pub description: String,
    pub amount: Money,
    pub occurred_on: NaiveDate,
    pub category: Option<String>,
}
