//! Application state management.
//!
//! Shared across the route builders and the shutdown cleanup:
//! - Configuration
//! - PostgreSQL connection pool
//! - Process start time (for the uptime banner)

use std::time::Instant;

/// Shared application state.
///
/// Cloning is cheap: the connection pool is reference counted.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration loaded from environment variables
    pub config: crate::config::Config,
    /// PostgreSQL database connection pool
    pub db: database::postgres::DatabaseConnection,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(config: crate::config::Config, db: database::postgres::DatabaseConnection) -> Self {
        Self {
            config,
            db,
            started_at: Instant::now(),
        }
    }
}
