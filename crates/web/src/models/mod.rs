//! Domain models for the web application.

pub mod ledger;
pub mod scenario;
pub mod session;
pub mod user;

pub use ledger::{EntryKind, LedgerEntry, NewEntry};
pub use scenario::Scenario;
pub use session::{CurrentUser, keys as session_keys};
pub use user::User;
