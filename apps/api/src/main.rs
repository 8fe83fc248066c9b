use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use matchmaker::config::Config;
use matchmaker::embeddings::geocoding::{Geocoder, NominatimGeocoder};
use matchmaker::embeddings::{Embedder, OpenAiEmbedder};
use matchmaker::llm_client::{self, LlmClient, TextGenerator};
use matchmaker::routes::build_router;
use matchmaker::state::AppState;
use matchmaker::store::PgDocumentStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting matchmaker v{}", env!("CARGO_PKG_VERSION"));

    let store = PgDocumentStore::connect(&config.database_url).await?;

    let llm: Option<Arc<dyn TextGenerator>> = match &config.anthropic_api_key {
        Some(key) => {
            let client = LlmClient::new(key.clone())?;
            info!("LLM client initialized (model: {})", llm_client::MODEL);
            Some(Arc::new(client))
        }
        None => {
            warn!("ANTHROPIC_API_KEY not set; match summaries will use a placeholder");
            None
        }
    };

    let embedder: Option<Arc<dyn Embedder>> = match &config.embedding {
        Some(emb) => {
            let client =
                OpenAiEmbedder::new(emb.api_url.clone(), emb.api_key.clone(), emb.model.clone())?;
            info!("Embedding client initialized (model: {})", emb.model);
            Some(Arc::new(client))
        }
        None => {
            warn!("Embedding API not configured; ingested records will not be matchable");
            None
        }
    };

    let geocoder: Arc<dyn Geocoder> =
        Arc::new(NominatimGeocoder::new(config.geocoder_url.clone())?);

    info!(
        max_commute_km = config.max_commute_km,
        explanation_concurrency = config.explanation_concurrency,
        explanation_timeout_secs = config.explanation_timeout.as_secs(),
        "Matching configured"
    );

    let state = AppState {
        store: Arc::new(store),
        llm,
        embedder,
        geocoder,
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
