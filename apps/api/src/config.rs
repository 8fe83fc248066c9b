use std::time::Duration;

use anyhow::{Context, Result};

use crate::embeddings::geocoding::DEFAULT_GEOCODER_URL;
use crate::embeddings::DEFAULT_EMBEDDING_MODEL;
use crate::matching::geo::DEFAULT_MAX_COMMUTE_KM;
use crate::matching::ranking::{
    RankOptions, DEFAULT_EXPLANATION_CONCURRENCY, DEFAULT_EXPLANATION_TIMEOUT,
};

const MAX_EXPLANATION_TIMEOUT_SECS: u64 = 3600;

/// Application configuration loaded from environment variables.
/// Startup fails if a required variable is missing or a value does not parse.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    /// Absent: match summaries fall back to the placeholder text.
    pub anthropic_api_key: Option<String>,
    /// Absent: records are stored without embeddings.
    pub embedding: Option<EmbeddingConfig>,
    pub geocoder_url: String,
    pub max_commute_km: f64,
    pub explanation_concurrency: usize,
    pub explanation_timeout: Duration,
    pub port: u16,
    pub rust_log: String,
}

#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    pub api_url: String,
    pub api_key: String,
    pub model: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let embedding = match (get("EMBEDDING_API_URL"), get("EMBEDDING_API_KEY")) {
            (Some(api_url), Some(api_key)) => Some(EmbeddingConfig {
                api_url,
                api_key,
                model: get("EMBEDDING_MODEL")
                    .unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string()),
            }),
            _ => None,
        };

        let max_commute_km = parse_or(&get, "MAX_COMMUTE_KM", DEFAULT_MAX_COMMUTE_KM)?;
        if !max_commute_km.is_finite() || max_commute_km < 0.0 {
            anyhow::bail!("MAX_COMMUTE_KM must be a non-negative number");
        }

        let explanation_timeout_secs = parse_or(
            &get,
            "EXPLANATION_TIMEOUT_SECS",
            DEFAULT_EXPLANATION_TIMEOUT.as_secs(),
        )?;
        if !(1..=MAX_EXPLANATION_TIMEOUT_SECS).contains(&explanation_timeout_secs) {
            anyhow::bail!(
                "EXPLANATION_TIMEOUT_SECS must be between 1 and {MAX_EXPLANATION_TIMEOUT_SECS}"
            );
        }
        let explanation_timeout = Duration::from_secs(explanation_timeout_secs);

        Ok(Config {
            database_url: get("DATABASE_URL")
                .context("Required environment variable 'DATABASE_URL' is not set")?,
            anthropic_api_key: get("ANTHROPIC_API_KEY").filter(|k| !k.trim().is_empty()),
            embedding,
            geocoder_url: get("GEOCODER_URL").unwrap_or_else(|| DEFAULT_GEOCODER_URL.to_string()),
            max_commute_km,
            explanation_concurrency: parse_or(
                &get,
                "EXPLANATION_CONCURRENCY",
                DEFAULT_EXPLANATION_CONCURRENCY,
            )?
            .max(1),
            explanation_timeout,
            port: parse_or(&get, "PORT", 8080u16)?,
            rust_log: get("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Ranking defaults for a request; callers set `top_k`.
    pub fn rank_options(&self) -> RankOptions {
        RankOptions {
            max_commute_km: self.max_commute_km,
            explanation_concurrency: self.explanation_concurrency,
            explanation_timeout: self.explanation_timeout,
            ..RankOptions::default()
        }
    }
}

fn parse_or<T>(get: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value: {raw}")),
        None => Ok(default),
    }
}
