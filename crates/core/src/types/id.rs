//! Newtype IDs for type-safe entity references.
//!
//! Use the `define_id!` macro to create ID wrappers that prevent accidentally
//! mixing identifiers of different entities. IDs are opaque strings: the
//! application generates UUIDs, but any non-empty string round-trips.

/// Macro to define a type-safe, string-backed ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - `new()`, `generate()` and `as_str()`
/// - `Display` and `From<&str>` / `From<String>`
///
/// # Example
///
/// ```rust
/// # use planbook_core::define_id;
/// define_id!(AccountId);
/// define_id!(BudgetId);
///
/// let account = AccountId::new("a-1");
/// assert_eq!(account.as_str(), "a-1");
///
/// // These are different types, so this won't compile:
/// // let _: BudgetId = account;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap an existing identifier.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Generate a fresh random identifier (UUID v4).
            #[must_use]
            pub fn generate() -> Self {
                Self(::uuid::Uuid::new_v4().to_string())
            }

            /// Get the underlying identifier.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

define_id!(UserId);
define_id!(ScenarioId);
define_id!(EntryId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_unique() {
        assert_ne!(ScenarioId::generate(), ScenarioId::generate());
    }

    #[test]
    fn test_id_serializes_as_plain_string() {
        let id = ScenarioId::new("s1");
        assert_eq!(serde_json::to_string(&id).ok().as_deref(), Some("\"s1\""));
        assert_eq!(id.to_string(), "s1");
    }
}
