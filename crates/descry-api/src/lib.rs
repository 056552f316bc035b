//! # descry-api
//!
//! HTTP surface for the descry queue: add, remove and inspect jobs.

pub mod config;
pub mod error;
pub mod handlers;

use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use descry_jobs::QueueService;

pub use config::ServerConfig;
pub use error::ApiError;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub service: QueueService,
}

impl AppState {
    pub fn new(service: QueueService) -> Self {
        Self { service }
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/add_job", post(handlers::add_job))
        .route("/remove_job/:correlation_id", delete(handlers::remove_job))
        .route("/check_queue", get(handlers::check_queue))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
