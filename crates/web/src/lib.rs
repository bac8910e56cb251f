//! Planbook web application library.
//!
//! Sign-in, scenario selection and per-scenario expense and income lists,
//! served with axum. The binary in `main.rs` wires this up with Sentry and
//! logging; tests drive [`routes::app`] directly.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
