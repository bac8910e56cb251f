//! Planbook Core - access control and scenario scoping.
//!
//! This crate holds the decision logic that sits in front of every
//! scenario-scoped view:
//!
//! - [`gate`] - the access gate: suspend, redirect to the auth entry point
//!   (carrying the requested location), or render for a signed-in user
//! - [`scenario`] - the scenario resolver: read the viewer's current scenario
//!   from a shared cache as flat, possibly absent identifiers
//! - [`types`] - newtype IDs, emails, currency codes and slugs
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no async,
//! no HTTP. Session providers and caches are passed in, so the same logic
//! runs under the web crate's axum router and under plain unit tests.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod gate;
pub mod scenario;
pub mod types;

pub use gate::{
    AccessGate, GateDecision, GateState, Location, LocationError, Redirect, RedirectState,
    SessionSnapshot,
};
pub use scenario::{
    CURRENT_SCENARIO_KEY, MemoryCache, ResolvedScenario, ScenarioCache, ScenarioRef,
    ScenarioResolver,
};
pub use types::*;
