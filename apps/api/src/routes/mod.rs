pub mod health;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::brochure::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Brochure API
        .route("/api/v1/brochures", post(handlers::handle_create_brochure))
        .route(
            "/api/v1/brochures/from-prompt",
            post(handlers::handle_create_from_prompt),
        )
        .route(
            "/api/v1/brochures/:job_id/status",
            get(handlers::handle_job_status),
        )
        .route(
            "/api/v1/brochures/:job_id/download",
            get(handlers::handle_download),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
