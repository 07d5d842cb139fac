//! Application state

use cleanworld_auth::AuthState;
use cleanworld_db::Database;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub auth: AuthState,
}

impl AppState {
    pub fn new(db: Database, auth: AuthState) -> Self {
        Self { db, auth }
    }
}
