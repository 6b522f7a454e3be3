use std::sync::Arc;

use common::{
    error::AppError,
    storage::db::SurrealDbClient,
    utils::{config::get_config, embedding::EmbeddingProvider},
};
use retrieval_pipeline::{recommend, RetrievalConfig};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Set up tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .try_init()
        .ok();

    let prompt = std::env::args().skip(1).collect::<Vec<_>>().join(" ");
    if prompt.trim().is_empty() {
        return Err(AppError::Config("usage: recommend <your goal or interests>".into()).into());
    }

    // Get config
    let config = get_config()?;

    let openai_client = Arc::new(async_openai::Client::with_config(
        async_openai::config::OpenAIConfig::new()
            .with_api_key(&config.openai_api_key)
            .with_api_base(&config.openai_base_url),
    ));

    let embedding_provider =
        EmbeddingProvider::from_config(&config, Some(Arc::clone(&openai_client))).await?;

    if embedding_provider.dimension() != config.embedding_dimensions as usize {
        return Err(AppError::Config(format!(
            "embedding backend produces {}-dimensional vectors but {} are configured",
            embedding_provider.dimension(),
            config.embedding_dimensions
        ))
        .into());
    }

    let record_db = SurrealDbClient::new(
        &config.surrealdb_address,
        &config.surrealdb_username,
        &config.surrealdb_password,
        &config.surrealdb_namespace,
        &config.record_database,
    )
    .await?;
    let vector_db = SurrealDbClient::new(
        &config.surrealdb_address,
        &config.surrealdb_username,
        &config.surrealdb_password,
        &config.surrealdb_namespace,
        &config.vector_database,
    )
    .await?;

    let recommendations = recommend(
        &openai_client,
        &config.query_model,
        &record_db,
        &vector_db,
        &embedding_provider,
        &prompt,
        &RetrievalConfig::default(),
    )
    .await?;

    info!(count = recommendations.len(), "retrieval finished");

    if recommendations.is_empty() {
        println!("No matching courses found.");
        return Ok(());
    }

    for (rank, recommendation) in recommendations.iter().enumerate() {
        let course = &recommendation.course;
        println!(
            "{}. {} ({}) - {} credits",
            rank + 1,
            course.name,
            course.code,
            course.credits
        );
        println!("   Why: {}", recommendation.explanation);
        if !recommendation.favourable_factors.is_empty() {
            println!("   In favour: {}", recommendation.favourable_factors.join("; "));
        }
        if !recommendation.unfavourable_factors.is_empty() {
            println!(
                "   Against: {}",
                recommendation.unfavourable_factors.join("; ")
            );
        }
        if !course.syllabus.is_empty() {
            let topics: Vec<&str> = course
                .syllabus
                .iter()
                .map(|unit| unit.title.as_str())
                .collect();
            println!("   Covers: {}", topics.join(", "));
        }
        println!();
    }

    Ok(())
}
