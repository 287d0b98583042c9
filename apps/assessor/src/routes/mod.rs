pub mod health;

use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::pipeline::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/candidates", post(handlers::handle_register))
        .route("/api/v1/candidates/:id", delete(handlers::handle_abandon))
        .route("/api/v1/candidates/:id/resume", post(handlers::handle_upload_resume))
        .route(
            "/api/v1/candidates/:id/enrichment",
            post(handlers::handle_start_enrichment).get(handlers::handle_enrichment_status),
        )
        .route(
            "/api/v1/candidates/:id/assessment",
            get(handlers::handle_get_assessment).post(handlers::handle_reassess),
        )
        .route(
            "/api/v1/candidates/:id/interview",
            post(handlers::handle_start_interview).get(handlers::handle_get_interview),
        )
        .route(
            "/api/v1/candidates/:id/interview/answers",
            post(handlers::handle_submit_answer),
        )
        .route(
            "/api/v1/candidates/:id/score",
            post(handlers::handle_compute_score).put(handlers::handle_recompute_score),
        )
        .route("/api/v1/jobs/:job_id/dashboard", get(handlers::handle_job_dashboard))
        .route(
            "/api/v1/jobs/:job_id/dashboard/analytics",
            get(handlers::handle_job_analytics),
        )
        .with_state(state)
}
