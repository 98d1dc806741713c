use axum::{Router, routing::get};
use database::postgres::DatabaseConnection;
use domain_users::{PgUserRepository, UserService, handlers};

pub mod health;
pub mod root;

/// Creates the API routes: the users resource plus the root banner.
///
/// Returns a stateless Router (all sub-routers have state already applied).
pub fn routes(state: &crate::state::AppState) -> Router {
    let users = UserService::new(PgUserRepository::new(state.db.clone()));

    Router::new()
        .merge(handlers::router(users))
        .merge(root::router(state.started_at))
}

/// Creates a router with the /ready endpoint that performs actual health checks.
///
/// This router has state applied and can be merged with the stateless app router
/// from `create_router`.
pub fn ready_router(db: DatabaseConnection) -> Router {
    Router::new()
        .route("/ready", get(health::ready_handler))
        .with_state(db)
}
