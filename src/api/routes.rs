use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::api::{handlers, state::AppState};

pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // System endpoints
        .route("/api/health", get(handlers::health_handler))
        .route("/api/tools", get(handlers::list_tools))
        // Agent bridge
        .route("/api/agent", post(handlers::agent_handler))
        // Market endpoints
        .route("/api/farmers", get(handlers::get_farmers))
        .route("/api/listings", post(handlers::post_listing))
        .route("/api/consumers", get(handlers::get_consumers))
        .route("/api/markets", get(handlers::list_markets))
        .route("/api/markets/:country", get(handlers::get_market))
        // Add state, CORS and request tracing
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
