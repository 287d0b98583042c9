mod analysis;
mod config;
mod db;
mod enrichment;
mod errors;
mod interview;
mod llm_client;
mod models;
mod pipeline;
mod routes;
mod scoring;
mod signals;
mod state;
mod store;
mod upstream;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{Config, PipelineConfig};
use crate::db::{create_pool, run_migrations};
use crate::enrichment::{CodeHostingFetcher, ProfessionalNetworkFetcher, RateLimiter};
use crate::interview::{LlmQuestionPhraser, QuestionPhraser};
use crate::llm_client::LlmClient;
use crate::pipeline::{AssessmentService, PipelineDeps};
use crate::routes::build_router;
use crate::scoring::{HolisticReviewer, LlmHolisticReviewer};
use crate::state::AppState;
use crate::store::PgRecordStore;
use crate::upstream::{CachedJobSource, HttpJobSource, JobSource, NoJobSource};

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

    info!("Starting assessor v{}", env!("CARGO_PKG_VERSION"));

    // Pipeline tunables, validated before anything connects
    let pipeline_config = PipelineConfig::load(config.assessment_config_path.as_deref())?;
    info!(
        "Pipeline config loaded (interview {}-{} questions, {} enrichment attempts)",
        pipeline_config.interview.min_questions,
        pipeline_config.interview.max_questions,
        pipeline_config.enrichment.max_attempts
    );

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;
    run_migrations(&db).await?;

    // Initialize Redis
    let redis = redis::Client::open(config.redis_url.clone())?;
    info!("Redis client initialized");

    // Upstream job source, cached in Redis
    let jobs: Arc<dyn JobSource> = match &config.job_source_url {
        Some(url) => {
            info!("Job source: {url} (cache TTL {}s)", config.job_cache_ttl_secs);
            Arc::new(CachedJobSource::new(
                HttpJobSource::new(url.clone())?,
                redis,
                config.job_cache_ttl_secs,
            ))
        }
        None => {
            warn!("JOB_SOURCE_URL not set, every job uses the generic requirement");
            Arc::new(NoJobSource)
        }
    };

    // Third-party fetchers share one rate limiter
    let enrichment = &pipeline_config.enrichment;
    let limiter = Arc::new(RateLimiter::new(Duration::from_millis(enrichment.min_request_interval_ms)));
    let timeout = Duration::from_secs(enrichment.request_timeout_secs);
    if config.professional_network_url.is_none() {
        warn!("PROFESSIONAL_NETWORK_URL not set, professional profiles will be reported unavailable");
    }
    let professional = ProfessionalNetworkFetcher::new(
        config.professional_network_url.clone(),
        config.professional_network_key.clone(),
        limiter.clone(),
        timeout,
    )?;
    let code_hosting = CodeHostingFetcher::new(config.code_hosting_api_url.clone(), limiter, timeout)?;

    // Optional language-model augmentation
    let llm = match &config.llm_api_key {
        Some(key) => {
            let llm = LlmClient::new(config.llm_api_url.clone(), key.clone(), config.llm_model.clone())?;
            info!("LLM client initialized (model: {})", llm.model());
            Some(llm)
        }
        None => {
            warn!("LLM_API_KEY not set, scores use the fallback path and questions keep template wording");
            None
        }
    };
    let reviewer = llm
        .clone()
        .map(|llm| Arc::new(LlmHolisticReviewer(llm)) as Arc<dyn HolisticReviewer>);
    let phraser = llm.map(|llm| Arc::new(LlmQuestionPhraser(llm)) as Arc<dyn QuestionPhraser>);

    let pipeline = AssessmentService::new(
        pipeline_config,
        PipelineDeps {
            store: Arc::new(PgRecordStore::new(db)),
            jobs,
            professional: Arc::new(professional),
            code_hosting: Arc::new(code_hosting),
            reviewer,
            phraser,
        },
    );

    // Build app state
    let state = AppState {
        pipeline: Arc::new(pipeline),
    };

    // Build router
    let app = build_router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()),
    );

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
