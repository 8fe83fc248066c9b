use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::matching::ranking::{rank_candidates, MatchResult, DEFAULT_TOP_K};
use crate::matching::MatchError;
use crate::models::job::Job;
use crate::state::AppState;

const MAX_KEYWORDS_SHOWN: usize = 10;
const MAX_ROLES_SHOWN: usize = 3;
const MAX_COMPANIES_SHOWN: usize = 3;
const MAX_STRENGTHS_SHOWN: usize = 5;
const MAX_SKILLS_SHOWN: usize = 10;

#[derive(Debug, Deserialize)]
pub struct FindMatchesRequest {
    pub company_name: String,
    pub job_title: String,
    #[serde(default)]
    pub top_k: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct TopKQuery {
    #[serde(default)]
    pub top_k: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct MatchesResponse {
    pub success: bool,
    pub job_id: Uuid,
    pub company_name: String,
    pub job_title: String,
    pub total_matches: usize,
    pub matches: Vec<MatchView>,
}

#[derive(Debug, Serialize)]
pub struct MatchView {
    pub rank: usize,
    pub candidate_name: String,
    pub email: Option<String>,
    pub location: Option<String>,
    /// Unrounded; `None` when either side has no coordinate.
    pub distance_km: Option<f64>,
    pub scores: ScoresView,
    pub explanation: ExplanationView,
    pub clifton_strengths: Vec<String>,
    pub skills: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ScoresView {
    pub combined: f64,
    pub profile: f64,
    pub culture: f64,
}

#[derive(Debug, Serialize)]
pub struct ExplanationView {
    pub keyword_overlap: Vec<String>,
    pub relevant_roles: Vec<String>,
    pub candidate_companies: Vec<String>,
    pub summary: String,
}

fn round3(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}

fn first_n(items: &[String], n: usize) -> Vec<String> {
    items.iter().take(n).cloned().collect()
}

fn parse_top_k(top_k: Option<i64>) -> Result<usize, MatchError> {
    match top_k {
        None => Ok(DEFAULT_TOP_K),
        Some(k) if k > 0 => usize::try_from(k)
            .map_err(|_| MatchError::InvalidArgument(format!("top_k out of range: {k}"))),
        Some(k) => Err(MatchError::InvalidArgument(format!(
            "top_k must be a positive integer, got {k}"
        ))),
    }
}

impl MatchView {
    fn from_result(rank: usize, result: MatchResult) -> Self {
        let features = &result.explanation.features;
        Self {
            rank,
            explanation: ExplanationView {
                keyword_overlap: first_n(&features.keyword_overlap, MAX_KEYWORDS_SHOWN),
                relevant_roles: first_n(&features.relevant_roles, MAX_ROLES_SHOWN),
                candidate_companies: first_n(&features.candidate_companies, MAX_COMPANIES_SHOWN),
                summary: result.explanation.summary,
            },
            scores: ScoresView {
                combined: round3(result.combined_score),
                profile: round3(result.profile_score),
                culture: round3(result.culture_score),
            },
            distance_km: result.distance_km,
            clifton_strengths: first_n(&result.candidate.clifton_strengths, MAX_STRENGTHS_SHOWN),
            skills: first_n(&result.candidate.skills, MAX_SKILLS_SHOWN),
            candidate_name: result.candidate.full_name,
            email: result.candidate.email,
            location: result.candidate.location,
        }
    }
}

/// Loads the job and candidate pool, ranks, and shapes the response.
pub async fn find_matches(
    state: &AppState,
    company_name: &str,
    job_title: &str,
    top_k: Option<i64>,
) -> Result<MatchesResponse, AppError> {
    let top_k = parse_top_k(top_k)?;

    let job: Job = state
        .store
        .get_job(company_name, job_title)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("Job '{job_title}' at '{company_name}' not found"))
        })?;

    let pool = state.store.list_embedded_candidates().await?;
    info!(
        job = %job.job_key(),
        pool = pool.len(),
        top_k,
        "Finding matches"
    );

    let options = {
        let mut options = state.config.rank_options();
        options.top_k = top_k;
        options
    };
    let results = rank_candidates(&job, &pool, &options, state.llm.as_deref()).await?;

    let matches: Vec<MatchView> = results
        .into_iter()
        .enumerate()
        .map(|(i, result)| MatchView::from_result(i + 1, result))
        .collect();

    Ok(MatchesResponse {
        success: true,
        job_id: job.id,
        company_name: job.company_name,
        job_title: job.job_title,
        total_matches: matches.len(),
        matches,
    })
}

/// POST /api/v1/matches/find
pub async fn handle_find_matches(
    State(state): State<AppState>,
    Json(req): Json<FindMatchesRequest>,
) -> Result<Json<MatchesResponse>, AppError> {
    let response = find_matches(&state, &req.company_name, &req.job_title, req.top_k).await?;
    Ok(Json(response))
}

/// GET /api/v1/matches/job/:company_name/:job_title
pub async fn handle_job_matches(
    State(state): State<AppState>,
    Path((company_name, job_title)): Path<(String, String)>,
    Query(params): Query<TopKQuery>,
) -> Result<Json<MatchesResponse>, AppError> {
    let response = find_matches(&state, &company_name, &job_title, params.top_k).await?;
    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::explanation::ExplanationPayload;
    use crate::matching::keywords::MatchFeatures;
    use crate::models::candidate::Candidate;

    #[test]
    fn test_parse_top_k() {
        assert_eq!(parse_top_k(None), Ok(10));
        assert_eq!(parse_top_k(Some(3)), Ok(3));
        assert!(parse_top_k(Some(0)).is_err());
        assert!(parse_top_k(Some(-4)).is_err());
    }

    #[test]
    fn test_view_rounds_and_caps() {
        let mut candidate = Candidate::new("Jo");
        candidate.skills = (0..15).map(|i| format!("skill{i}")).collect();
        candidate.clifton_strengths = (0..8).map(|i| format!("strength{i}")).collect();

        let result = MatchResult {
            candidate,
            combined_score: 0.712_345,
            profile_score: 0.8,
            culture_score: 0.500_49,
            distance_km: Some(12.345),
            explanation: ExplanationPayload {
                features: MatchFeatures {
                    keyword_overlap: (0..15).map(|i| format!("kw{i}")).collect(),
                    relevant_roles: vec!["a".into(), "b".into(), "c".into(), "d".into()],
                    candidate_companies: vec!["x".into(), "y".into(), "z".into(), "w".into()],
                    job_min_years: None,
                    candidate_num_roles: 4,
                },
                summary: "Strong fit".to_string(),
            },
        };

        let view = MatchView::from_result(1, result);
        assert_eq!(view.rank, 1);
        assert_eq!(view.scores.combined, 0.712);
        assert_eq!(view.scores.culture, 0.5);
        assert_eq!(view.distance_km, Some(12.345));
        assert_eq!(view.skills.len(), 10);
        assert_eq!(view.clifton_strengths.len(), 5);
        assert_eq!(view.explanation.keyword_overlap.len(), 10);
        assert_eq!(view.explanation.relevant_roles.len(), 3);
        assert_eq!(view.explanation.candidate_companies, vec!["x", "y", "z"]);
        assert_eq!(view.explanation.summary, "Strong fit");
    }
}
