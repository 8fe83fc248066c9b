//! Match Explanation — structured features plus an optional LLM summary.
//!
//! The summary is best-effort. A missing generator, an API failure, a timeout
//! or an empty reply all degrade to a placeholder string; the structured
//! features are returned untouched either way.

use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::llm_client::prompts::FACTUAL_INSTRUCTION;
use crate::llm_client::{LlmError, TextGenerator};
use crate::matching::keywords::{build_features, MatchFeatures};
use crate::matching::prompts::{EXPLANATION_PROMPT_TEMPLATE, EXPLANATION_SYSTEM};
use crate::models::candidate::Candidate;
use crate::models::job::Job;

const FAILURE_PREFIX: &str = "Explanation generation failed";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplanationPayload {
    #[serde(flatten)]
    pub features: MatchFeatures,
    /// Never empty: either generated text or a failure placeholder.
    pub summary: String,
}

/// Builds the explanation with no time limit on the generator call.
pub async fn build_explanation(
    job: &Job,
    candidate: &Candidate,
    combined_score: f64,
    generator: Option<&dyn TextGenerator>,
) -> ExplanationPayload {
    build_explanation_until(job, candidate, combined_score, generator, None).await
}

/// Same as [`build_explanation`], but abandons the generator call at `limit`.
pub async fn build_explanation_until(
    job: &Job,
    candidate: &Candidate,
    combined_score: f64,
    generator: Option<&dyn TextGenerator>,
    limit: Option<Instant>,
) -> ExplanationPayload {
    let features = build_features(job, candidate);

    let summary = match generator {
        None => failure_placeholder("text generation client not configured"),
        Some(generator) => {
            let prompt = build_explanation_prompt(job, candidate, &features, combined_score);
            match generate_summary(generator, &prompt, limit).await {
                Ok(text) => text,
                Err(e) => {
                    warn!(
                        candidate = %candidate.full_name,
                        job = %job.job_title,
                        error = %e,
                        "explanation generation failed"
                    );
                    failure_placeholder(&e.to_string())
                }
            }
        }
    };

    ExplanationPayload { features, summary }
}

async fn generate_summary(
    generator: &dyn TextGenerator,
    prompt: &str,
    limit: Option<Instant>,
) -> Result<String, LlmError> {
    let text = match limit {
        Some(limit) => {
            if Instant::now() >= limit {
                return Err(LlmError::Timeout);
            }
            tokio::time::timeout_at(limit, generator.chat(prompt, EXPLANATION_SYSTEM))
                .await
                .map_err(|_| LlmError::Timeout)??
        }
        None => generator.chat(prompt, EXPLANATION_SYSTEM).await?,
    };

    let text = text.trim();
    if text.is_empty() {
        return Err(LlmError::EmptyContent);
    }
    debug!(chars = text.len(), "explanation summary generated");
    Ok(text.to_string())
}

pub fn failure_placeholder(reason: &str) -> String {
    format!("{FAILURE_PREFIX}: {reason}")
}

fn build_explanation_prompt(
    job: &Job,
    candidate: &Candidate,
    features: &MatchFeatures,
    combined_score: f64,
) -> String {
    let min_years = features
        .job_min_years
        .map(|y| y.to_string())
        .unwrap_or_else(|| "not specified".to_string());

    EXPLANATION_PROMPT_TEMPLATE
        .replace("{company}", &job.company_name)
        .replace("{job_title}", &job.job_title)
        .replace("{job_summary}", &job.summary)
        .replace("{job_skills}", &list(&job.skills))
        .replace("{min_years}", &min_years)
        .replace("{candidate_name}", &candidate.full_name)
        .replace(
            "{candidate_location}",
            candidate.location.as_deref().unwrap_or("unknown"),
        )
        .replace("{candidate_summary}", &candidate.summary)
        .replace("{candidate_skills}", &list(&candidate.skills))
        .replace("{candidate_companies}", &list(&features.candidate_companies))
        .replace(
            "{candidate_num_roles}",
            &features.candidate_num_roles.to_string(),
        )
        .replace("{combined_score}", &format!("{combined_score:.4}"))
        .replace("{keyword_overlap}", &list(&features.keyword_overlap))
        .replace("{relevant_roles}", &list(&features.relevant_roles))
        .replace("{factual_instruction}", FACTUAL_INSTRUCTION)
}

fn list(items: &[String]) -> String {
    serde_json::to_string(items).unwrap_or_default()
}
