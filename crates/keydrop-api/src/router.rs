//! Route definitions for the Keydrop HTTP API.
//!
//! All routes are mounted under `/api`. Everything except the health check
//! requires the bridge's bearer token.

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware;
use crate::state::AppState;

/// Build the complete Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/events", post(handlers::events::dispatch_event))
        .route("/inventory", get(handlers::snapshot::inventory))
        .route("/leaderboard", get(handlers::snapshot::leaderboard))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_token,
        ));

    let api_routes = Router::new()
        .route("/health", get(handlers::health::health))
        .merge(protected);

    let cors = middleware::cors::build_cors_layer(&state.config.server.cors);

    Router::new()
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(axum_middleware::from_fn(middleware::logging::request_logging))
        .with_state(state)
}
