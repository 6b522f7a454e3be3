use std::sync::Arc;

use common::{
    error::AppError,
    storage::{db::SurrealDbClient, store::StorageManager, types::course_point::CoursePoint},
    utils::{config::get_config, embedding::EmbeddingProvider},
};
use ingestion_pipeline::{
    run_ingestion, utils::sources::SourceDocuments, ArtifactCache, DefaultPipelineServices,
    DualSinkPublisher, IngestionConfig, IngestionPipeline, IngestionTuning,
};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Set up tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .try_init()
        .ok();

    // Get config
    let config = get_config()?;

    let openai_client = Arc::new(async_openai::Client::with_config(
        async_openai::config::OpenAIConfig::new()
            .with_api_key(&config.openai_api_key)
            .with_api_base(&config.openai_base_url),
    ));

    let embedding_provider = Arc::new(
        EmbeddingProvider::from_config(&config, Some(Arc::clone(&openai_client))).await?,
    );
    info!(
        embedding_backend = embedding_provider.backend_label(),
        embedding_dimension = embedding_provider.dimension(),
        "Embedding provider initialized"
    );

    // A provider whose vectors cannot land in the configured index is a
    // startup failure, never a per-record one.
    if embedding_provider.dimension() != config.embedding_dimensions as usize {
        return Err(AppError::Config(format!(
            "embedding backend produces {}-dimensional vectors but {} are configured",
            embedding_provider.dimension(),
            config.embedding_dimensions
        ))
        .into());
    }

    let record_db = Arc::new(
        SurrealDbClient::new(
            &config.surrealdb_address,
            &config.surrealdb_username,
            &config.surrealdb_password,
            &config.surrealdb_namespace,
            &config.record_database,
        )
        .await?,
    );
    let vector_db = Arc::new(
        SurrealDbClient::new(
            &config.surrealdb_address,
            &config.surrealdb_username,
            &config.surrealdb_password,
            &config.surrealdb_namespace,
            &config.vector_database,
        )
        .await?,
    );

    CoursePoint::ensure_collection(&vector_db, embedding_provider.dimension()).await?;

    let storage = StorageManager::new(&config).await?;

    let sources = SourceDocuments::new(&config.source_dir);
    let ids = sources.enumerate().await?;
    info!(documents = ids.len(), source_dir = %config.source_dir, "enumerated source documents");

    let tuning = IngestionTuning {
        pool_size: config.worker_pool_size,
        batch_size: config.batch_size,
        extraction_pacing_ms: config.extraction_pacing_ms,
        ..IngestionTuning::default()
    };
    let ingestion_config = IngestionConfig {
        tuning: tuning.clone(),
    };

    let services = Arc::new(DefaultPipelineServices::new(
        sources,
        openai_client,
        config.extraction_model.clone(),
        &tuning,
    ));
    let pipeline = IngestionPipeline::new(ArtifactCache::new(storage), services, tuning);
    let publisher = DualSinkPublisher::new(
        embedding_provider,
        vector_db,
        record_db,
        config.vector_namespace.clone(),
    );

    let report = run_ingestion(&pipeline, &publisher, ids, &ingestion_config).await?;

    info!(
        published = report.published.len(),
        skipped_existing = report.skipped_existing.len(),
        failed = report.failures.len(),
        "ingestion complete"
    );
    if report.has_failures() {
        warn!(
            vector_failed = ?report.vector_failed,
            record_failed = ?report.record_failed,
            "run finished with failures; re-running ingestion will retry them"
        );
    }

    Ok(())
}
