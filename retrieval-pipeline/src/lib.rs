#![allow(clippy::missing_docs_in_private_items)]

pub mod annotation;
pub mod expansion;

use std::collections::HashMap;

use common::{
    error::AppError,
    storage::{
        db::SurrealDbClient,
        types::{course::Course, course_point::CoursePoint},
    },
    utils::embedding::EmbeddingProvider,
};
use tracing::{debug, instrument, warn};

/// A hydrated course plus the model's justification for recommending it.
#[derive(Debug, Clone)]
pub struct RecommendedCourse {
    pub course: Course,
    pub explanation: String,
    pub favourable_factors: Vec<String>,
    pub unfavourable_factors: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct RetrievalConfig {
    pub top_k: u8,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { top_k: 6 }
    }
}

/// Embed the query text, KNN-search the vector index and hydrate the full
/// records from the record store, preserving rank order. Codes the record
/// store cannot resolve are dropped with a warning; the indexes being out of
/// step for a code is a known transient state.
pub async fn search_courses(
    record_db: &SurrealDbClient,
    vector_db: &SurrealDbClient,
    embedding_provider: &EmbeddingProvider,
    query_text: &str,
    config: &RetrievalConfig,
) -> Result<Vec<Course>, AppError> {
    if query_text.trim().is_empty() {
        warn!("empty query text; skipping similarity search");
        return Ok(Vec::new());
    }

    let query_vector = embedding_provider.embed(query_text).await?;
    let hits = CoursePoint::search(vector_db, &query_vector, config.top_k).await?;
    if hits.is_empty() {
        debug!("vector search returned no hits");
        return Ok(Vec::new());
    }

    let codes: Vec<String> = hits.into_iter().map(|hit| hit.code).collect();
    hydrate_in_rank_order(codes, record_db).await
}

/// Bulk-fetch records for the ranked codes and re-impose the ranking on the
/// unordered query result.
async fn hydrate_in_rank_order(
    codes: Vec<String>,
    record_db: &SurrealDbClient,
) -> Result<Vec<Course>, AppError> {
    let fetched = Course::get_by_codes(codes.clone(), record_db).await?;
    let mut by_code: HashMap<String, Course> = fetched
        .into_iter()
        .map(|course| (course.code.clone(), course))
        .collect();

    let mut ordered = Vec::with_capacity(codes.len());
    for code in codes {
        match by_code.remove(&code) {
            Some(course) => ordered.push(course),
            None => warn!(%code, "vector hit has no record-store entry; dropping"),
        }
    }
    Ok(ordered)
}

/// The full query-time path: expand the prompt, search, hydrate, annotate.
/// Sequential by design; it consumes the indexes the ingestion run filled.
#[instrument(skip_all)]
pub async fn recommend(
    openai_client: &async_openai::Client<async_openai::config::OpenAIConfig>,
    query_model: &str,
    record_db: &SurrealDbClient,
    vector_db: &SurrealDbClient,
    embedding_provider: &EmbeddingProvider,
    user_prompt: &str,
    config: &RetrievalConfig,
) -> Result<Vec<RecommendedCourse>, AppError> {
    let expanded = expansion::expand_query(openai_client, query_model, user_prompt).await?;
    if expanded.trim().is_empty() {
        warn!("query expansion came back empty; aborting retrieval");
        return Ok(Vec::new());
    }

    let courses = search_courses(
        record_db,
        vector_db,
        embedding_provider,
        &expanded,
        config,
    )
    .await?;
    if courses.is_empty() {
        return Ok(Vec::new());
    }

    annotation::annotate_courses(openai_client, query_model, user_prompt, courses).await
}
