//! Business services for the web application.
//!
//! - `auth` - password registration and login
//! - `directory` - in-memory user store, the session provider's source of truth
//! - `scenarios` - scenario creation and lookup
//! - `ledger` - expense and income entries per scenario

pub mod auth;
pub mod directory;
pub mod ledger;
pub mod scenarios;

pub use auth::{AuthError, AuthService};
pub use directory::{DirectoryError, UserDirectory};
pub use ledger::{EntryInput, LedgerError, LedgerStore};
pub use scenarios::{ScenarioError, ScenarioStore};
