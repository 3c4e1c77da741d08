//! Router configuration for the read API.

use axum::{middleware, routing::get, Router};

use super::auth::require_basic_auth;
use super::handlers;
use super::AppState;
use crate::storage::RecordStore;

/// Create the router; every route requires Basic authentication.
pub fn create_router<S>(state: AppState<S>) -> Router
where
    S: RecordStore + Send + 'static,
{
    Router::new()
        .route("/records", get(handlers::list_records::<S>))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_basic_auth::<S>,
        ))
        .with_state(state)
}
