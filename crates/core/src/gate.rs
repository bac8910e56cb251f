//! Access gate for protected views.
//!
//! The gate turns a session snapshot and the requested location into one of
//! three mutually exclusive outcomes:
//!
//! | `loading` | `user`  | decision                                   |
//! |-----------|---------|--------------------------------------------|
//! | `true`    | any     | [`GateDecision::Suspend`]                  |
//! | `false`   | absent  | [`GateDecision::Redirect`] to the auth page |
//! | `false`   | present | [`GateDecision::Render`]                   |
//!
//! Nothing here knows about a particular router. The web crate maps the
//! decision onto HTTP responses; other front ends can do the same.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Location`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum LocationError {
    /// The location is empty.
    #[error("location cannot be empty")]
    Empty,
    /// The location is not an absolute path on this site.
    #[error("location must be a local absolute path (got {0:?})")]
    NotLocal(String),
    /// The location contains whitespace or control characters.
    #[error("location contains invalid characters")]
    InvalidCharacters,
}

/// A local navigation target: an absolute path plus optional query string.
///
/// Only same-site paths are representable, so a `Location` read back from
/// redirect state can be used as a post-login destination without further
/// checks. Fragments are dropped.
///
/// ```
/// use planbook_core::Location;
///
/// let location = Location::parse("/expenses?month=2024-05").unwrap();
/// assert_eq!(location.path(), "/expenses");
/// assert_eq!(location.query(), Some("month=2024-05"));
///
/// assert!(Location::parse("https://evil.example/").is_err());
/// assert!(Location::parse("//evil.example/").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Location {
    path: String,
    query: Option<String>,
}

impl Location {
    /// Parse a request target such as `/expenses?page=2`.
    ///
    /// # Errors
    ///
    /// Returns an error if the target is empty, is not a local absolute path
    /// (`//host`, `scheme:`, backslashes), or contains whitespace or control
    /// characters.
    pub fn parse(target: &str) -> Result<Self, LocationError> {
        let target = target.split_once('#').map_or(target, |(before, _)| before);
        match target.split_once('?') {
            Some((path, query)) => Self::from_parts(path, Some(query)),
            None => Self::from_parts(target, None),
        }
    }

    /// Build a location from an already split path and query.
    ///
    /// An empty query is treated as no query.
    ///
    /// # Errors
    ///
    /// See [`Location::parse`].
    pub fn from_parts(path: &str, query: Option<&str>) -> Result<Self, LocationError> {
        if path.is_empty() {
            return Err(LocationError::Empty);
        }
        if !path.starts_with('/') || path.starts_with("//") || path.contains('\\') {
            return Err(LocationError::NotLocal(path.to_owned()));
        }
        let query = query.filter(|q| !q.is_empty());
        let invalid = |s: &str| s.chars().any(|c| c.is_whitespace() || c.is_control());
        if invalid(path) || query.is_some_and(invalid) {
            return Err(LocationError::InvalidCharacters);
        }

        Ok(Self {
            path: path.to_owned(),
            query: query.map(str::to_owned),
        })
    }

    /// The path component, always starting with `/`.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The query string without the leading `?`.
    #[must_use]
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.query {
            Some(query) => write!(f, "{}?{query}", self.path),
            None => f.write_str(&self.path),
        }
    }
}

impl TryFrom<String> for Location {
    type Error = LocationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Location> for String {
    fn from(location: Location) -> Self {
        location.to_string()
    }
}

/// What the session provider currently knows about the viewer.
///
/// The provider must hand out a consistent pair; the gate never reads
/// `user` and `loading` separately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot<U> {
    /// The signed-in identity, if any.
    pub user: Option<U>,
    /// True only while the initial session determination is in progress.
    pub loading: bool,
}

impl<U> SessionSnapshot<U> {
    /// Snapshot taken while the session is still being determined.
    #[must_use]
    pub const fn loading() -> Self {
        Self {
            user: None,
            loading: true,
        }
    }

    /// Snapshot of a fully determined session.
    #[must_use]
    pub const fn resolved(user: Option<U>) -> Self {
        Self {
            user,
            loading: false,
        }
    }
}

/// State attached to an authentication redirect.
///
/// Carried next to the redirect rather than in the URL, so the auth page can
/// send the viewer back to `from` after a successful login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedirectState {
    /// The location the viewer originally asked for.
    pub from: Location,
}

/// Navigation instruction produced for unauthenticated viewers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    /// Where to send the viewer (the authentication entry point).
    pub target: Location,
    /// Payload for the destination to read.
    pub state: RedirectState,
}

/// Authorization state of the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GateState {
    /// Session not yet determined. Initial state.
    Unknown,
    /// A user is signed in.
    Authorized,
    /// The session is determined and nobody is signed in.
    Unauthorized,
}

impl GateState {
    /// Short lowercase label for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Authorized => "authorized",
            Self::Unauthorized => "unauthorized",
        }
    }
}

impl fmt::Display for GateState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one gate evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision<U> {
    /// Render nothing until the session is determined.
    Suspend,
    /// Send the viewer to the authentication entry point.
    Redirect(Redirect),
    /// Render the protected subtree for this user.
    Render(U),
}

impl<U> GateDecision<U> {
    /// The gate state this decision corresponds to.
    #[must_use]
    pub const fn state(&self) -> GateState {
        match self {
            Self::Suspend => GateState::Unknown,
            Self::Redirect(_) => GateState::Unauthorized,
            Self::Render(_) => GateState::Authorized,
        }
    }
}

/// Guard placed in front of a protected route subtree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessGate {
    auth_entry: Location,
}

impl AccessGate {
    /// Default authentication entry point.
    pub const DEFAULT_AUTH_PATH: &'static str = "/auth";

    /// Create a gate redirecting to the given authentication entry point.
    #[must_use]
    pub const fn new(auth_entry: Location) -> Self {
        Self { auth_entry }
    }

    /// The authentication entry point unauthenticated viewers are sent to.
    #[must_use]
    pub const fn auth_entry(&self) -> &Location {
        &self.auth_entry
    }

    /// Decide what to do with a navigation to `location`.
    ///
    /// While the session is loading the decision is always
    /// [`GateDecision::Suspend`], whatever `user` holds.
    #[must_use]
    pub fn evaluate<U>(
        &self,
        session: SessionSnapshot<U>,
        location: &Location,
    ) -> GateDecision<U> {
        if session.loading {
            return GateDecision::Suspend;
        }
        match session.user {
            Some(user) => GateDecision::Render(user),
            None => GateDecision::Redirect(Redirect {
                target: self.auth_entry.clone(),
                state: RedirectState {
                    from: location.clone(),
                },
            }),
        }
    }

    /// The gate state for a snapshot, without building a decision.
    #[must_use]
    pub const fn state_of<U>(session: &SessionSnapshot<U>) -> GateState {
        if session.loading {
            GateState::Unknown
        } else if session.user.is_some() {
            GateState::Authorized
        } else {
            GateState::Unauthorized
        }
    }
}

impl Default for AccessGate {
    fn default() -> Self {
        Self {
            auth_entry: Location {
                path: Self::DEFAULT_AUTH_PATH.to_owned(),
                query: None,
            },
        }
    }
}
