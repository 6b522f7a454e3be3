mod batch;
mod cache;
mod config;
pub mod coordinator;
mod error;
mod extraction_result;
mod publisher;
mod services;

pub use batch::BatchAccumulator;
pub use cache::ArtifactCache;
pub use config::{IngestionConfig, IngestionTuning};
pub use error::DocumentError;
pub use extraction_result::LLMCourseExtraction;
pub use publisher::{BatchReport, DualSinkPublisher};
#[allow(clippy::module_name_repetitions)]
pub use services::{DefaultPipelineServices, PipelineServices};

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use common::storage::types::course::Course;
use tracing::info;

use crate::utils::sources::DocumentId;

/// Runs the two extraction stages for one document, consulting the artifact
/// cache before each. Stages are strictly sequential within a document and
/// share nothing across documents.
pub struct IngestionPipeline {
    cache: ArtifactCache,
    services: Arc<dyn PipelineServices>,
    tuning: IngestionTuning,
}

impl IngestionPipeline {
    pub fn new(
        cache: ArtifactCache,
        services: Arc<dyn PipelineServices>,
        tuning: IngestionTuning,
    ) -> Self {
        Self {
            cache,
            services,
            tuning,
        }
    }

    #[tracing::instrument(skip_all, fields(document_id = %id))]
    pub async fn process_document(&self, id: &DocumentId) -> Result<Course, DocumentError> {
        let pipeline_started = Instant::now();

        let stage_start = Instant::now();
        let (text, text_computed) = self
            .cache
            .get_or_compute_text(id, || self.services.extract_text(id))
            .await?;
        let text_duration = stage_start.elapsed();

        let stage_start = Instant::now();
        let (course, course_computed) = self
            .cache
            .get_or_compute_course(id, || self.services.extract_course(id, &text))
            .await?;
        let extract_duration = stage_start.elapsed();

        // Pacing applies only when the rate-limited external call actually
        // ran; cache hits replay for free.
        if course_computed && self.tuning.extraction_pacing_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.tuning.extraction_pacing_ms)).await;
        }

        info!(
            document_id = %id,
            code = %course.code,
            text_cached = !text_computed,
            extraction_cached = !course_computed,
            text_ms = duration_millis(text_duration),
            extract_ms = duration_millis(extract_duration),
            total_ms = duration_millis(pipeline_started.elapsed()),
            "document pipeline finished"
        );

        Ok(course)
    }
}

fn duration_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
