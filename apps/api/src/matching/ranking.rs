//! Candidate Ranking — orchestrates geo filtering, scoring and explanations.
//!
//! Flow: validate → commute filter → profile/culture similarity →
//!       combined score → stable sort → top-K → explanations (bounded pool).
//!
//! Scoring is pure and synchronous (`score_candidates`); only the explanation
//! phase touches the text generator. Explanations are requested for the
//! retained top-K only, so the LLM is never called for a candidate that would
//! be truncated away.

use std::cmp::Ordering;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::llm_client::TextGenerator;
use crate::matching::explanation::{build_explanation_until, ExplanationPayload};
use crate::matching::geo::{candidate_commutability, Commutability, DEFAULT_MAX_COMMUTE_KM};
use crate::matching::similarity::{
    compute_combined_score, cosine_similarity, culture_similarity, ScoreWeights,
};
use crate::matching::MatchError;
use crate::models::candidate::Candidate;
use crate::models::job::Job;

pub const DEFAULT_TOP_K: usize = 10;
pub const DEFAULT_EXPLANATION_CONCURRENCY: usize = 4;
pub const DEFAULT_EXPLANATION_TIMEOUT: Duration = Duration::from_secs(30);

/// What to do with a candidate whose commute cannot be evaluated because a
/// coordinate is missing on either side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownLocationPolicy {
    #[default]
    Include,
    Exclude,
}

#[derive(Debug, Clone)]
pub struct RankOptions {
    pub top_k: usize,
    pub max_commute_km: f64,
    pub unknown_location: UnknownLocationPolicy,
    pub weights: ScoreWeights,
    /// Maximum explanation calls in flight at once.
    pub explanation_concurrency: usize,
    pub explanation_timeout: Duration,
    /// Hard stop for the explanation phase. Calls still running at the
    /// deadline are abandoned and get a placeholder summary.
    pub deadline: Option<Instant>,
}

impl Default for RankOptions {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            max_commute_km: DEFAULT_MAX_COMMUTE_KM,
            unknown_location: UnknownLocationPolicy::default(),
            weights: ScoreWeights::default(),
            explanation_concurrency: DEFAULT_EXPLANATION_CONCURRENCY,
            explanation_timeout: DEFAULT_EXPLANATION_TIMEOUT,
            deadline: None,
        }
    }
}

impl RankOptions {
    pub fn with_top_k(top_k: usize) -> Self {
        Self {
            top_k,
            ..Self::default()
        }
    }
}

/// A candidate that survived filtering, with its scores but no explanation.
#[derive(Debug, Clone)]
pub struct ScoredCandidate<'a> {
    pub candidate: &'a Candidate,
    pub combined_score: f64,
    pub profile_score: f64,
    pub culture_score: f64,
    pub distance_km: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct MatchResult {
    pub candidate: Candidate,
    pub combined_score: f64,
    pub profile_score: f64,
    pub culture_score: f64,
    pub distance_km: Option<f64>,
    pub explanation: ExplanationPayload,
}

/// Scores, sorts and truncates the pool. Deterministic for a given input.
///
/// Candidates without a profile embedding are skipped. A candidate whose
/// vectors do not match the job's dimensions is skipped and logged; it does
/// not fail the ranking.
pub fn score_candidates<'a>(
    job: &Job,
    pool: &'a [Candidate],
    options: &RankOptions,
) -> Result<Vec<ScoredCandidate<'a>>, MatchError> {
    if options.top_k == 0 {
        return Err(MatchError::InvalidArgument(
            "top_k must be a positive integer".to_string(),
        ));
    }

    let job_profile = job.profile_vector().ok_or_else(|| {
        MatchError::MissingEmbedding(format!(
            "job '{}' at '{}' has no profile embedding",
            job.job_title, job.company_name
        ))
    })?;
    let job_culture = job.culture_vector();

    let mut scored = Vec::new();
    let mut skipped = 0usize;
    let mut out_of_range = 0usize;

    for candidate in pool {
        let Some(candidate_profile) = candidate.profile_vector() else {
            skipped += 1;
            continue;
        };

        let commute = candidate_commutability(
            job.location_coordinates.as_ref(),
            candidate.location_coordinates.as_ref(),
            options.max_commute_km,
        );
        match commute {
            Commutability::NotCommutable { distance_km } => {
                debug!(candidate = %candidate.full_name, distance_km, "beyond commute range");
                out_of_range += 1;
                continue;
            }
            Commutability::Unknown
                if options.unknown_location == UnknownLocationPolicy::Exclude =>
            {
                debug!(candidate = %candidate.full_name, "commute unknown, excluded by policy");
                out_of_range += 1;
                continue;
            }
            Commutability::Unknown | Commutability::Commutable { .. } => {}
        }

        let scores = cosine_similarity(job_profile, candidate_profile).and_then(|profile| {
            culture_similarity(job_culture, candidate.culture_vector()).map(|c| (profile, c))
        });
        let (profile_score, culture_score) = match scores {
            Ok(scores) => scores,
            Err(e) => {
                warn!(candidate = %candidate.full_name, error = %e, "skipping candidate");
                skipped += 1;
                continue;
            }
        };

        let combined_score = compute_combined_score(profile_score, culture_score, &options.weights);
        if !combined_score.is_finite() {
            warn!(candidate = %candidate.full_name, "non-finite score, skipping candidate");
            skipped += 1;
            continue;
        }

        scored.push(ScoredCandidate {
            candidate,
            combined_score,
            profile_score,
            culture_score,
            distance_km: commute.distance_km(),
        });
    }

    // Stable: equal scores keep pool order.
    scored.sort_by(|a, b| {
        b.combined_score
            .partial_cmp(&a.combined_score)
            .unwrap_or(Ordering::Equal)
    });

    let eligible = scored.len();
    scored.truncate(options.top_k);

    info!(
        job = %job.job_title,
        company = %job.company_name,
        pool = pool.len(),
        eligible,
        out_of_range,
        skipped,
        returned = scored.len(),
        "candidates scored"
    );

    Ok(scored)
}

/// Ranks `pool` against `job` and attaches an explanation to each result.
///
/// Explanation calls run concurrently, bounded by
/// `options.explanation_concurrency`, and are re-assembled in score order.
pub async fn rank_candidates(
    job: &Job,
    pool: &[Candidate],
    options: &RankOptions,
    generator: Option<&dyn TextGenerator>,
) -> Result<Vec<MatchResult>, MatchError> {
    let scored = score_candidates(job, pool, options)?;

    let call_timeout = options.explanation_timeout;
    let deadline = options.deadline;

    let explanation_futures: Vec<_> = scored
        .into_iter()
        .enumerate()
        .map(move |(idx, scored)| async move {
            let call_limit = Instant::now().checked_add(call_timeout);
            let limit = match (deadline, call_limit) {
                (Some(d), Some(c)) => Some(d.min(c)),
                (d, c) => d.or(c),
            };

            let explanation = build_explanation_until(
                job,
                scored.candidate,
                scored.combined_score,
                generator,
                limit,
            )
            .await;

            let result = MatchResult {
                candidate: scored.candidate.clone(),
                combined_score: scored.combined_score,
                profile_score: scored.profile_score,
                culture_score: scored.culture_score,
                distance_km: scored.distance_km,
                explanation,
            };
            (idx, result)
        })
        .collect();

    let mut explained: Vec<(usize, MatchResult)> = stream::iter(explanation_futures)
        .buffer_unordered(options.explanation_concurrency.max(1))
        .collect()
        .await;

    explained.sort_by_key(|(idx, _)| *idx);

    Ok(explained.into_iter().map(|(_, result)| result).collect())
}
