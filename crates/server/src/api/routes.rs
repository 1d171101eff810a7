use axum::{
    http::{header, Method},
    middleware,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::{handlers, middleware::metrics_middleware, shipments, status_updates};
use crate::state::AppState;

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE])
}

pub fn create_router(state: Arc<AppState>) -> Router {
    // API routes
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        // Shipments
        .route("/shipments/classify", post(shipments::classify_shipment))
        // Status updates
        .route("/status-updates", post(status_updates::start_batch))
        .route("/status-updates", delete(status_updates::cancel))
        .route("/status-updates/single", post(status_updates::update_single))
        .route(
            "/status-updates/retry-failed",
            post(status_updates::retry_failed),
        )
        .route("/status-updates/progress", get(status_updates::get_progress))
        .route("/status-updates/results", get(status_updates::get_results))
        .route(
            "/status-updates/results",
            delete(status_updates::clear_results),
        )
        .route("/status-updates/stats", get(status_updates::get_stats))
        // Metrics
        .route("/metrics", get(handlers::metrics))
        .with_state(state);

    Router::new().nest("/api/v1", api_routes).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(build_cors())
            .layer(middleware::from_fn(metrics_middleware)),
    )
}
