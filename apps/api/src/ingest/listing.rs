//! Read-only listings of what has been ingested.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::errors::AppError;
use crate::models::candidate::Candidate;
use crate::models::job::Job;
use crate::state::AppState;
use crate::store::LIST_LIMIT;

const MAX_SKILLS_LISTED: usize = 10;

#[derive(Debug, Serialize)]
pub struct CandidateSummary {
    pub name: String,
    pub email: Option<String>,
    pub location: Option<String>,
    pub skills: Vec<String>,
    pub has_embeddings: bool,
}

#[derive(Debug, Serialize)]
pub struct JobSummary {
    pub job_id: String,
    pub company: String,
    pub title: String,
    pub locations: Vec<String>,
    pub skills: Vec<String>,
    pub has_embeddings: bool,
}

#[derive(Debug, Serialize)]
pub struct CandidateListResponse {
    pub success: bool,
    pub count: usize,
    pub candidates: Vec<CandidateSummary>,
}

#[derive(Debug, Serialize)]
pub struct JobListResponse {
    pub success: bool,
    pub count: usize,
    pub jobs: Vec<JobSummary>,
}

#[derive(Debug, Serialize)]
pub struct CompanyListResponse {
    pub success: bool,
    pub companies: Vec<String>,
}

impl From<Candidate> for CandidateSummary {
    fn from(candidate: Candidate) -> Self {
        let has_embeddings = candidate.has_embeddings();
        let mut skills = candidate.skills;
        skills.truncate(MAX_SKILLS_LISTED);
        Self {
            name: candidate.full_name,
            email: candidate.email,
            location: candidate.location,
            skills,
            has_embeddings,
        }
    }
}

impl From<Job> for JobSummary {
    fn from(job: Job) -> Self {
        let job_id = job.job_key();
        let has_embeddings = job.has_embeddings();
        let mut skills = job.skills;
        skills.truncate(MAX_SKILLS_LISTED);
        Self {
            job_id,
            company: job.company_name,
            title: job.job_title,
            locations: job.locations,
            skills,
            has_embeddings,
        }
    }
}

/// GET /api/v1/candidates
pub async fn handle_list_candidates(
    State(state): State<AppState>,
) -> Result<Json<CandidateListResponse>, AppError> {
    let candidates: Vec<CandidateSummary> = state
        .store
        .list_candidates(LIST_LIMIT)
        .await?
        .into_iter()
        .map(CandidateSummary::from)
        .collect();

    Ok(Json(CandidateListResponse {
        success: true,
        count: candidates.len(),
        candidates,
    }))
}

/// GET /api/v1/jobs
pub async fn handle_list_jobs(
    State(state): State<AppState>,
) -> Result<Json<JobListResponse>, AppError> {
    let jobs: Vec<JobSummary> = state
        .store
        .list_jobs(LIST_LIMIT)
        .await?
        .into_iter()
        .map(JobSummary::from)
        .collect();

    Ok(Json(JobListResponse {
        success: true,
        count: jobs.len(),
        jobs,
    }))
}

/// GET /api/v1/companies
pub async fn handle_list_companies(
    State(state): State<AppState>,
) -> Result<Json<CompanyListResponse>, AppError> {
    let companies = state.store.list_companies().await?;
    Ok(Json(CompanyListResponse {
        success: true,
        companies,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_summary_caps_skills() {
        let mut candidate = Candidate::new("Ada");
        candidate.skills = (0..14).map(|i| format!("skill{i}")).collect();
        candidate.profile_embedding = Some(vec![0.1, 0.2]);

        let summary = CandidateSummary::from(candidate);
        assert_eq!(summary.name, "Ada");
        assert_eq!(summary.skills.len(), 10);
        assert!(summary.has_embeddings);
    }

    #[test]
    fn test_job_summary_uses_composite_id() {
        let mut job = Job::new("Acme", "Data Engineer");
        job.locations = vec!["Austin, TX".to_string()];

        let summary = JobSummary::from(job);
        assert_eq!(summary.job_id, "Acme_Data Engineer");
        assert_eq!(summary.locations, vec!["Austin, TX"]);
        assert!(!summary.has_embeddings);
    }
}
