use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{get, post},
};
use core_cvgen::{Submitter, health_router};
use data_model_cvgen::JobStore;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod jobs;
pub mod logging_middleware;

/// Shared handler state: the store for status reads and the submit half of the lifecycle.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn JobStore>,
    pub submitter: Submitter,
}

//
// Router
//

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health_router())
        .route("/api/scrapeAndGenerate", post(jobs::post_scrape_and_generate))
        .route("/api/scrapeJobOffer", post(jobs::post_scrape_and_generate))
        .route("/api/status", get(jobs::get_status))
        // Browser frontend is served from another origin
        .layer(CorsLayer::permissive())
        // Custom route access logging
        .layer(middleware::from_fn(logging_middleware::log_route_access))
        // Tracing middleware
        .layer(TraceLayer::new_for_http())
}
