//! API module for HTTP endpoints
//!
//! Exposes the audit log and host metrics over a small JSON REST surface.

pub mod http;
pub mod rest;
pub mod state;

pub use http::create_router;
pub use state::AppState;
