//! API Module
//!
//! HTTP API layer for the accounting server.
//! Each submodule handles endpoints for a specific domain.

pub mod error;
pub mod health;
pub mod jobs;

use axum::{Router, routing::get};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Create the main API router with all endpoints
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Job listings
        .route("/myjobs/json", get(jobs::my_jobs))
        .route("/api/userdata", get(jobs::user_history))
        // Single job
        .route("/job/{jobid}/json", get(jobs::job_history))
        .route("/job/{jobid}/info", get(jobs::job_info))
        // Queue
        .route("/api/job_queue", get(jobs::job_queue))
        // Add state and middleware
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
