//! URL-safe scenario slugs.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`ScenarioSlug`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SlugError {
    /// The slug (or the name it was derived from) has no usable characters.
    #[error("slug cannot be empty")]
    Empty,
    /// The slug is longer than [`ScenarioSlug::MAX_LENGTH`].
    #[error("slug must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The slug contains something other than `a-z`, `0-9` and single dashes.
    #[error("slug may only contain lowercase letters, digits and single dashes")]
    InvalidCharacters,
}

/// Human-readable, URL-safe scenario identifier (e.g. `retirement-plan`).
///
/// Lowercase ASCII letters and digits separated by single dashes, with no
/// leading or trailing dash.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ScenarioSlug(String);

impl ScenarioSlug {
    /// Maximum length of a slug.
    pub const MAX_LENGTH: usize = 64;

    /// Parse an existing slug.
    ///
    /// # Errors
    ///
    /// Returns an error if the slug is empty, too long, or not in canonical
    /// form.
    pub fn parse(s: &str) -> Result<Self, SlugError> {
        if s.is_empty() {
            return Err(SlugError::Empty);
        }
        if s.len() > Self::MAX_LENGTH {
            return Err(SlugError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        let canonical = s.split('-').all(|part| {
            !part.is_empty()
                && part
                    .bytes()
                    .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
        });
        if !canonical {
            return Err(SlugError::InvalidCharacters);
        }
        Ok(Self(s.to_owned()))
    }

    /// Derive a slug from a free-text scenario name.
    ///
    /// ASCII letters and digits are kept (lowercased); every other run of
    /// characters becomes a single dash. The result is truncated to
    /// [`Self::MAX_LENGTH`].
    ///
    /// ```
    /// use planbook_core::ScenarioSlug;
    ///
    /// let slug = ScenarioSlug::from_name("  Retirement Plan (2040)! ").unwrap();
    /// assert_eq!(slug.as_str(), "retirement-plan-2040");
    /// ```
    ///
    /// # Errors
    ///
    /// Returns `SlugError::Empty` if the name has no ASCII letters or digits.
    pub fn from_name(name: &str) -> Result<Self, SlugError> {
        let mut slug = String::with_capacity(name.len());
        for c in name.chars() {
            if c.is_ascii_alphanumeric() {
                slug.push(c.to_ascii_lowercase());
            } else if !slug.is_empty() && !slug.ends_with('-') {
                slug.push('-');
            }
        }
        slug.truncate(Self::MAX_LENGTH);
        while slug.ends_with('-') {
            slug.pop();
        }
        if slug.is_empty() {
            return Err(SlugError::Empty);
        }
        Ok(Self(slug))
    }

    /// Returns a copy of this slug with a numeric suffix (`name-2`),
    /// shortening the base if needed to stay within the length limit.
    #[must_use]
    pub fn with_suffix(&self, n: u32) -> Self {
        let suffix = format!("-{n}");
        let mut base = self.0.clone();
        base.truncate(Self::MAX_LENGTH.saturating_sub(suffix.len()));
        while base.ends_with('-') {
            base.pop();
        }
        Self(base + &suffix)
    }

    /// Returns the slug as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ScenarioSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ScenarioSlug {
    type Error = SlugError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ScenarioSlug> for String {
    fn from(slug: ScenarioSlug) -> Self {
        slug.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accepts_canonical() {
        assert!(ScenarioSlug::parse("vacation").is_ok());
        assert!(ScenarioSlug::parse("retirement-plan-2").is_ok());
    }

    #[test]
    fn test_parse_rejects_non_canonical() {
        assert_eq!(ScenarioSlug::parse(""), Err(SlugError::Empty));
        for input in ["Vacation", "-lead", "trail-", "double--dash", "space d"] {
            assert_eq!(
                ScenarioSlug::parse(input),
                Err(SlugError::InvalidCharacters),
                "{input:?}"
            );
        }
    }

    #[test]
    fn test_from_name_collapses_separators() {
        let slug = ScenarioSlug::from_name("Kids' College -- Fund").unwrap();
        assert_eq!(slug.as_str(), "kids-college-fund");
    }

    #[test]
    fn test_from_name_without_usable_characters() {
        assert_eq!(ScenarioSlug::from_name("¡¿ !!"), Err(SlugError::Empty));
    }

    #[test]
    fn test_from_name_truncates() {
        let slug = ScenarioSlug::from_name(&"a".repeat(100)).unwrap();
        assert_eq!(slug.as_str().len(), ScenarioSlug::MAX_LENGTH);
    }

    #[test]
    fn test_with_suffix_stays_within_limit() {
        let slug = ScenarioSlug::from_name(&"b".repeat(64)).unwrap();
        let suffixed = slug.with_suffix(12);
        assert!(suffixed.as_str().ends_with("-12"));
        assert_eq!(suffixed.as_str().len(), ScenarioSlug::MAX_LENGTH);
        assert!(ScenarioSlug::parse(suffixed.as_str()).is_ok());
    }
}
