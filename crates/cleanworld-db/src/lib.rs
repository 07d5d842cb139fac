//! CleanWorld Database Layer
//!
//! This crate provides the persistence layer for the CleanWorld backend,
//! using SQLite via sqlx. It owns the durable entities (users, zones,
//! clean-up events); everything above it treats it as a lookup-and-save
//! collaborator.

pub mod error;
pub mod models;
pub mod repository;
pub mod utils;

pub use error::DbError;
pub use models::*;
pub use repository::Database;

/// Re-export sqlx types for convenience
pub use sqlx::SqlitePool;
