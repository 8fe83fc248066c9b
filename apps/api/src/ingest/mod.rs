//! Ingestion of parsed candidates and jobs: geocode, embed, store.

pub mod listing;

use axum::{extract::State, Json};
use chrono::Utc;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::embeddings::geocoding::{geocode_first, Geocoder};
use crate::embeddings::{embed_candidate, embed_job, Embedder};
use crate::errors::AppError;
use crate::matching::geo::Coordinate;
use crate::models::candidate::Candidate;
use crate::models::job::Job;
use crate::state::AppState;
use crate::store::DocumentStore;

#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub success: bool,
    pub id: Uuid,
    pub key: String,
    pub location_coordinates: Option<Coordinate>,
    pub has_embeddings: bool,
}

/// Stores a candidate keyed by full name. Re-ingesting the same name replaces
/// the stored record but keeps its id.
pub async fn ingest_candidate(
    store: &dyn DocumentStore,
    embedder: Option<&dyn Embedder>,
    geocoder: &dyn Geocoder,
    mut candidate: Candidate,
) -> Result<Candidate, AppError> {
    candidate.full_name = candidate.full_name.trim().to_string();
    if candidate.full_name.is_empty() {
        return Err(AppError::Validation("full_name must not be blank".to_string()));
    }

    if let Some(existing) = store.get_candidate(&candidate.full_name).await? {
        candidate.id = existing.id;
    }
    candidate.ingested_at = Some(Utc::now());

    if candidate.location_coordinates.is_none() {
        if let Some(location) = candidate.location.as_deref() {
            candidate.location_coordinates = geocoder.geocode(location).await;
        }
    }

    if let Some(embedder) = embedder {
        embed_candidate(embedder, &mut candidate).await;
    }

    store.upsert_candidate(&candidate).await?;
    info!(
        candidate = %candidate.full_name,
        geocoded = candidate.location_coordinates.is_some(),
        embedded = candidate.has_embeddings(),
        "Candidate ingested"
    );
    Ok(candidate)
}

/// Stores a job keyed by (company, title). The job coordinate comes from the
/// first of its locations that geocodes.
pub async fn ingest_job(
    store: &dyn DocumentStore,
    embedder: Option<&dyn Embedder>,
    geocoder: &dyn Geocoder,
    mut job: Job,
) -> Result<Job, AppError> {
    job.company_name = job.company_name.trim().to_string();
    job.job_title = job.job_title.trim().to_string();
    if job.company_name.is_empty() || job.job_title.is_empty() {
        return Err(AppError::Validation(
            "company_name and job_title must not be blank".to_string(),
        ));
    }

    if let Some(existing) = store.get_job(&job.company_name, &job.job_title).await? {
        job.id = existing.id;
    }
    job.ingested_at = Some(Utc::now());

    if job.location_coordinates.is_none() {
        job.location_coordinates = geocode_first(geocoder, &job.locations).await;
    }

    if let Some(embedder) = embedder {
        embed_job(embedder, &mut job).await;
    }

    store.upsert_job(&job).await?;
    info!(
        job = %job.job_key(),
        geocoded = job.location_coordinates.is_some(),
        embedded = job.has_embeddings(),
        "Job ingested"
    );
    Ok(job)
}

/// POST /api/v1/candidates
pub async fn handle_ingest_candidate(
    State(state): State<AppState>,
    Json(candidate): Json<Candidate>,
) -> Result<Json<IngestResponse>, AppError> {
    let candidate = ingest_candidate(
        state.store.as_ref(),
        state.embedder.as_deref(),
        state.geocoder.as_ref(),
        candidate,
    )
    .await?;

    Ok(Json(IngestResponse {
        success: true,
        id: candidate.id,
        has_embeddings: candidate.has_embeddings(),
        location_coordinates: candidate.location_coordinates,
        key: candidate.full_name,
    }))
}

/// POST /api/v1/jobs
pub async fn handle_ingest_job(
    State(state): State<AppState>,
    Json(job): Json<Job>,
) -> Result<Json<IngestResponse>, AppError> {
    let job = ingest_job(
        state.store.as_ref(),
        state.embedder.as_deref(),
        state.geocoder.as_ref(),
        job,
    )
    .await?;

    Ok(Json(IngestResponse {
        success: true,
        id: job.id,
        key: job.job_key(),
        location_coordinates: job.location_coordinates,
        has_embeddings: job.has_embeddings(),
    }))
}
