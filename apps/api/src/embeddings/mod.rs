//! Embedding generation — composes entity text and calls the embedding provider.
//!
//! Provider failures never propagate: the affected embedding stays unset and
//! the entity is simply not matchable until it is re-embedded.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::matching::geo::coordinate_vector;
use crate::models::candidate::Candidate;
use crate::models::job::Job;

pub mod geocoding;

pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-ada-002";
const HTTP_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("provider returned no embedding")]
    Empty,
}

#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    input: [&'a str; 1],
    model: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

/// Client for any OpenAI-compatible `/embeddings` endpoint (OpenAI, Azure
/// OpenAI v1, local gateways).
#[derive(Clone)]
pub struct OpenAiEmbedder {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiEmbedder {
    pub fn new(base_url: String, api_key: String, model: String) -> Result<Self, EmbeddingError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model,
        })
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let response = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&EmbeddingRequest {
                input: [text],
                model: &self.model,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: EmbeddingResponse = response.json().await?;
        body.data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .filter(|v| !v.is_empty())
            .ok_or(EmbeddingError::Empty)
    }
}

/// Summary, skills, role titles and employers.
pub fn candidate_profile_text(candidate: &Candidate) -> String {
    let roles: Vec<&str> = candidate
        .experience
        .iter()
        .map(|e| e.role.as_str())
        .filter(|r| !r.is_empty())
        .collect();
    let companies: Vec<&str> = candidate
        .companies
        .iter()
        .map(String::as_str)
        .filter(|c| !c.is_empty())
        .collect();

    join_sections(&[
        candidate.summary.as_str(),
        &candidate.skills.join(" "),
        &roles.join(" "),
        &companies.join(" "),
    ])
}

/// Title, summary, skills, responsibilities and qualifications.
pub fn job_profile_text(job: &Job) -> String {
    join_sections(&[
        job.job_title.as_str(),
        job.summary.as_str(),
        &job.skills.join(" "),
        &job.responsibilities.join(" "),
        &job.qualifications.join(" "),
    ])
}

fn join_sections(sections: &[&str]) -> String {
    sections
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Embeds `text`, or returns `None` (logged) for blank input or provider failure.
pub async fn embed_or_none(embedder: &dyn Embedder, text: &str, what: &str) -> Option<Vec<f32>> {
    if text.trim().is_empty() {
        debug!(what, "no text to embed");
        return None;
    }
    match embedder.embed(text).await {
        Ok(v) => Some(v),
        Err(e) => {
            warn!(what, error = %e, "embedding generation failed");
            None
        }
    }
}

/// Fills profile, culture and location embeddings on a candidate. Existing
/// embeddings are replaced only when a new one was produced.
pub async fn embed_candidate(embedder: &dyn Embedder, candidate: &mut Candidate) {
    let profile_text = candidate_profile_text(candidate);
    if let Some(v) = embed_or_none(embedder, &profile_text, "candidate profile").await {
        candidate.profile_embedding = Some(v);
    }
    if let Some(culture) = candidate.culture_index.clone() {
        if let Some(v) = embed_or_none(embedder, &culture, "candidate culture").await {
            candidate.culture_embedding = Some(v);
        }
    }
    if let Some(coord) = candidate.location_coordinates.as_ref() {
        candidate.location_embedding = Some(coordinate_vector(coord));
    }
}

pub async fn embed_job(embedder: &dyn Embedder, job: &mut Job) {
    let profile_text = job_profile_text(job);
    if let Some(v) = embed_or_none(embedder, &profile_text, "job profile").await {
        job.profile_embedding = Some(v);
    }
    if let Some(culture) = job.culture_index.clone() {
        if let Some(v) = embed_or_none(embedder, &culture, "job culture").await {
            job.culture_embedding = Some(v);
        }
    }
    if let Some(coord) = job.location_coordinates.as_ref() {
        job.location_embedding = Some(coordinate_vector(coord));
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::matching::geo::Coordinate;
    use crate::models::candidate::ExperienceEntry;

    /// Deterministic embedder: letter-frequency histogram over a-z.
    pub(crate) struct HistogramEmbedder;

    #[async_trait]
    impl Embedder for HistogramEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
            let mut v = vec![0.0_f32; 26];
            for c in text.to_ascii_lowercase().bytes().filter(u8::is_ascii_lowercase) {
                v[(c - b'a') as usize] += 1.0;
            }
            Ok(v)
        }
    }

    struct BrokenEmbedder;

    #[async_trait]
    impl Embedder for BrokenEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
            Err(EmbeddingError::Empty)
        }
    }

    #[test]
    fn test_candidate_profile_text_composition() {
        let mut candidate = Candidate::new("Sam");
        candidate.summary = "Cloud engineer".to_string();
        candidate.skills = vec!["AWS".to_string(), "Go".to_string()];
        candidate.experience = vec![
            ExperienceEntry {
                role: "SRE".to_string(),
                responsibilities: Some("ignored".to_string()),
            },
            ExperienceEntry::default(),
        ];
        candidate.companies = vec!["Initech".to_string(), String::new()];

        assert_eq!(
            candidate_profile_text(&candidate),
            "Cloud engineer AWS Go SRE Initech"
        );
    }

    #[test]
    fn test_job_profile_text_composition() {
        let mut job = Job::new("Acme", "Data Engineer");
        job.summary = "Build pipelines".to_string();
        job.skills = vec!["Spark".to_string()];
        job.qualifications = vec!["BSc".to_string()];
        assert_eq!(job_profile_text(&job), "Data Engineer Build pipelines Spark BSc");
    }

    #[tokio::test]
    async fn test_embed_candidate_fills_all_vectors() {
        let mut candidate = Candidate::new("Sam");
        candidate.summary = "Cloud engineer".to_string();
        candidate.culture_index = Some("Collaborative and curious".to_string());
        candidate.location_coordinates = Some(Coordinate::new(45.0, 90.0).unwrap());

        embed_candidate(&HistogramEmbedder, &mut candidate).await;

        assert_eq!(candidate.profile_embedding.as_ref().unwrap().len(), 26);
        assert_eq!(candidate.culture_embedding.as_ref().unwrap().len(), 26);
        assert_eq!(candidate.location_embedding, Some(vec![0.5, 0.5]));
    }

    #[tokio::test]
    async fn test_embedding_failure_leaves_fields_unset() {
        let mut job = Job::new("Acme", "Engineer");
        job.culture_index = Some("Fast paced".to_string());

        embed_job(&BrokenEmbedder, &mut job).await;

        assert!(job.profile_embedding.is_none());
        assert!(job.culture_embedding.is_none());
        assert!(job.location_embedding.is_none());
    }

    #[tokio::test]
    async fn test_blank_text_is_not_embedded() {
        assert!(embed_or_none(&HistogramEmbedder, "   ", "blank").await.is_none());
    }

    #[test]
    fn test_embedding_response_parses() {
        let json = r#"{"data": [{"embedding": [0.1, 0.2, 0.3], "index": 0}], "model": "x"}"#;
        let parsed: EmbeddingResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.data[0].embedding.len(), 3);
    }
}
