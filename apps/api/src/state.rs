use std::sync::Arc;

use crate::config::Config;
use crate::embeddings::geocoding::Geocoder;
use crate::embeddings::Embedder;
use crate::llm_client::TextGenerator;
use crate::store::DocumentStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    /// None when no API key is configured; summaries use the placeholder.
    pub llm: Option<Arc<dyn TextGenerator>>,
    pub embedder: Option<Arc<dyn Embedder>>,
    pub geocoder: Arc<dyn Geocoder>,
    pub config: Config,
}
