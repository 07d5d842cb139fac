//! CleanWorld REST API
//!
//! Axum-based HTTP API for the CleanWorld service: user accounts and
//! sessions, reported clean-up zones, and volunteer events.

pub mod error;
pub mod extract;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
