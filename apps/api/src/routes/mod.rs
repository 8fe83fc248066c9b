pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::ingest::listing::{handle_list_candidates, handle_list_companies, handle_list_jobs};
use crate::ingest::{handle_ingest_candidate, handle_ingest_job};
use crate::matching::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Ingestion and listings
        .route("/api/v1/candidates", get(handle_list_candidates).post(handle_ingest_candidate))
        .route("/api/v1/jobs", get(handle_list_jobs).post(handle_ingest_job))
        .route("/api/v1/companies", get(handle_list_companies))
        // Matching
        .route("/api/v1/matches/find", post(handlers::handle_find_matches))
        .route(
            "/api/v1/matches/job/:company_name/:job_title",
            get(handlers::handle_job_matches),
        )
        .with_state(state)
}
