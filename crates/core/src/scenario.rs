//! Current-scenario resolution.
//!
//! Views scope their data to the scenario the viewer selected last. The
//! selection lives in a shared key-value cache under [`CURRENT_SCENARIO_KEY`];
//! [`ScenarioResolver`] projects that entry into flat, possibly absent
//! identifiers so views never need to know the key or the record shape.

use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize};

use crate::types::{CurrencyCode, ScenarioId, ScenarioSlug};

/// Cache key under which the current scenario is stored.
pub const CURRENT_SCENARIO_KEY: &str = "currentScenario";

/// The cached description of the selected scenario.
///
/// Every field is optional; a partially written record is still usable and
/// each field resolves on its own. A field whose value does not parse is
/// read as absent without affecting the others.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioRef {
    /// Stable scenario identifier.
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<ScenarioId>,
    /// URL-safe scenario name.
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub slug: Option<ScenarioSlug>,
    /// Default currency for amounts in this scenario.
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub base_currency: Option<CurrencyCode>,
}

/// Raw shape of one cached field.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawField {
    Text(String),
    Other(serde::de::IgnoredAny),
}

/// Read an optional field, dropping a value that is not a string or does
/// not parse.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: TryFrom<String>,
{
    Ok(match Option::<RawField>::deserialize(deserializer)? {
        Some(RawField::Text(value)) => T::try_from(value).ok(),
        Some(RawField::Other(_)) | None => None,
    })
}

/// Read access to the shared client cache.
///
/// Implementations are owned and written elsewhere; the resolver only reads.
/// A missing key is a normal answer, not an error.
pub trait ScenarioCache {
    /// Look up the scenario record stored under `key`.
    fn get(&self, key: &str) -> Option<ScenarioRef>;
}

impl<C: ScenarioCache + ?Sized> ScenarioCache for &C {
    fn get(&self, key: &str) -> Option<ScenarioRef> {
        (**self).get(key)
    }
}

impl<C: ScenarioCache + ?Sized> ScenarioCache for Arc<C> {
    fn get(&self, key: &str) -> Option<ScenarioRef> {
        (**self).get(key)
    }
}

/// A plain in-memory cache.
///
/// Used to hold a per-request snapshot of the viewer's cached entries, and
/// as a deterministic cache in tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryCache {
    entries: HashMap<String, ScenarioRef>,
}

impl MemoryCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` under `key`, returning the previous entry.
    pub fn insert(&mut self, key: impl Into<String>, value: ScenarioRef) -> Option<ScenarioRef> {
        self.entries.insert(key.into(), value)
    }

    /// Remove the entry under `key`.
    pub fn remove(&mut self, key: &str) -> Option<ScenarioRef> {
        self.entries.remove(key)
    }
}

impl ScenarioCache for MemoryCache {
    fn get(&self, key: &str) -> Option<ScenarioRef> {
        self.entries.get(key).cloned()
    }
}

/// Scoping identifiers for the current view.
///
/// `loading` is always `false` and `error` is always `None`: the resolver
/// does no fetching of its own and a cache read cannot fail. Callers that
/// need to know whether the cache itself is still being filled must ask the
/// cache. `error` is typed `Option<Infallible>` so it cannot be anything but
/// `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedScenario {
    /// Slug of the selected scenario, if any.
    pub scenario_slug: Option<ScenarioSlug>,
    /// Id of the selected scenario, if any.
    pub scenario_id: Option<ScenarioId>,
    /// Base currency of the selected scenario, if any.
    pub base_currency: Option<CurrencyCode>,
    /// Always `false`.
    pub loading: bool,
    /// Always `None`.
    pub error: Option<Infallible>,
}

impl ResolvedScenario {
    /// The result for a cache with no current scenario.
    #[must_use]
    pub const fn absent() -> Self {
        Self {
            scenario_slug: None,
            scenario_id: None,
            base_currency: None,
            loading: false,
            error: None,
        }
    }

    /// True when neither a slug nor an id is available.
    #[must_use]
    pub const fn is_absent(&self) -> bool {
        self.scenario_slug.is_none() && self.scenario_id.is_none()
    }
}

impl From<ScenarioRef> for ResolvedScenario {
    fn from(entry: ScenarioRef) -> Self {
        Self {
            scenario_slug: entry.slug,
            scenario_id: entry.id,
            base_currency: entry.base_currency,
            loading: false,
            error: None,
        }
    }
}

/// Read-only accessor for the current scenario.
#[derive(Debug, Clone)]
pub struct ScenarioResolver<C> {
    cache: C,
}

impl<C: ScenarioCache> ScenarioResolver<C> {
    /// Create a resolver over the given cache.
    #[must_use]
    pub const fn new(cache: C) -> Self {
        Self { cache }
    }

    /// Project the cached current scenario into scoping identifiers.
    ///
    /// Pure with respect to the cache: without a cache write in between,
    /// repeated calls return equal values.
    #[must_use]
    pub fn resolve(&self) -> ResolvedScenario {
        self.cache
            .get(CURRENT_SCENARIO_KEY)
            .map_or_else(ResolvedScenario::absent, ResolvedScenario::from)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn cache_with(entry: ScenarioRef) -> MemoryCache {
        let mut cache = MemoryCache::new();
        cache.insert(CURRENT_SCENARIO_KEY, entry);
        cache
    }

    #[test]
    fn test_cache_miss_resolves_to_absent() {
        let resolved = ScenarioResolver::new(MemoryCache::new()).resolve();
        assert_eq!(resolved, ResolvedScenario::absent());
        assert!(resolved.is_absent());
        assert!(!resolved.loading);
        assert!(resolved.error.is_none());
    }

    #[test]
    fn test_cache_hit() {
        let cache = cache_with(ScenarioRef {
            id: Some(ScenarioId::new("s1")),
            slug: Some(ScenarioSlug::parse("retirement-plan").unwrap()),
            base_currency: Some(CurrencyCode::parse("USD").unwrap()),
        });

        let resolved = ScenarioResolver::new(&cache).resolve();

        assert_eq!(
            resolved.scenario_slug.as_ref().map(ScenarioSlug::as_str),
            Some("retirement-plan")
        );
        assert_eq!(
            resolved.scenario_id.as_ref().map(ScenarioId::as_str),
            Some("s1")
        );
        assert_eq!(
            resolved.base_currency.as_ref().map(CurrencyCode::as_str),
            Some("USD")
        );
        assert!(!resolved.loading);
        assert!(resolved.error.is_none());
    }

    #[test]
    fn test_partial_entry_fields_resolve_independently() {
        let cache = cache_with(ScenarioRef {
            slug: Some(ScenarioSlug::parse("vacation").unwrap()),
            ..ScenarioRef::default()
        });

        let resolved = ScenarioResolver::new(&cache).resolve();

        assert_eq!(
            resolved.scenario_slug.as_ref().map(ScenarioSlug::as_str),
            Some("vacation")
        );
        assert_eq!(resolved.scenario_id, None);
        assert!(!resolved.is_absent());
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let resolver = ScenarioResolver::new(cache_with(ScenarioRef {
            id: Some(ScenarioId::new("s2")),
            ..ScenarioRef::default()
        }));
        assert_eq!(resolver.resolve(), resolver.resolve());
    }

    #[test]
    fn test_other_keys_are_ignored() {
        let mut cache = MemoryCache::new();
        cache.insert(
            "previousScenario",
            ScenarioRef {
                id: Some(ScenarioId::new("old")),
                ..ScenarioRef::default()
            },
        );
        assert!(ScenarioResolver::new(Arc::new(cache)).resolve().is_absent());
    }

    #[test]
    fn test_malformed_field_is_dropped_alone() {
        let entry: ScenarioRef =
            serde_json::from_str(r#"{"id":"s1","slug":"Vacation Plan"}"#).unwrap();
        assert_eq!(entry.slug, None);

        let resolved = ScenarioResolver::new(&cache_with(entry)).resolve();
        assert_eq!(
            resolved.scenario_id.as_ref().map(ScenarioId::as_str),
            Some("s1")
        );
        assert_eq!(resolved.scenario_slug, None);

        let entry: ScenarioRef = serde_json::from_str(
            r#"{"id":"s1","slug":"retirement-plan","baseCurrency":"dollars"}"#,
        )
        .unwrap();
        assert_eq!(entry.id, Some(ScenarioId::new("s1")));
        assert_eq!(
            entry.slug.as_ref().map(ScenarioSlug::as_str),
            Some("retirement-plan")
        );
        assert_eq!(entry.base_currency, None);

        let entry: ScenarioRef =
            serde_json::from_str(r#"{"id":"s1","slug":42,"baseCurrency":null}"#).unwrap();
        assert_eq!(entry.id, Some(ScenarioId::new("s1")));
        assert_eq!(entry.slug, None);
        assert_eq!(entry.base_currency, None);
    }

    #[test]
    fn test_scenario_ref_uses_camel_case_and_tolerates_missing_fields() {
        let entry: ScenarioRef = serde_json::from_str(r#"{"slug":"vacation"}"#).unwrap();
        assert_eq!(entry.id, None);
        assert_eq!(entry.base_currency, None);

        let full = ScenarioRef {
            id: Some(ScenarioId::new("s1")),
            slug: Some(ScenarioSlug::parse("retirement-plan").unwrap()),
            base_currency: Some(CurrencyCode::parse("usd").unwrap()),
        };
        assert_eq!(
            serde_json::to_string(&full).unwrap(),
            r#"{"id":"s1","slug":"retirement-plan","baseCurrency":"USD"}"#
        );
    }
}
