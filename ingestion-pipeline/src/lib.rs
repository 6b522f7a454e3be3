#![allow(clippy::missing_docs_in_private_items)]

pub mod pipeline;
pub mod utils;

use common::error::AppError;
use futures::{pin_mut, StreamExt};
use tracing::{info, warn};

pub use pipeline::{
    ArtifactCache, BatchAccumulator, BatchReport, DefaultPipelineServices, DocumentError,
    DualSinkPublisher, IngestionConfig, IngestionPipeline, IngestionTuning, PipelineServices,
};
use utils::sources::DocumentId;

/// Everything one ingestion run did, for the end-of-run summary.
#[derive(Debug, Default)]
pub struct IngestionReport {
    pub published: Vec<String>,
    pub skipped_existing: Vec<String>,
    pub vector_failed: Vec<String>,
    pub record_failed: Vec<String>,
    pub failures: Vec<(DocumentId, DocumentError)>,
}

impl IngestionReport {
    fn absorb(&mut self, batch: BatchReport) {
        self.published.extend(batch.published);
        self.skipped_existing.extend(batch.skipped_existing);
        self.vector_failed.extend(batch.vector_failed);
        self.record_failed.extend(batch.record_failed);
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
            || !self.vector_failed.is_empty()
            || !self.record_failed.is_empty()
    }
}

/// Drive the full ingestion run: coordinator -> accumulator -> publisher.
///
/// Per-document failures are collected, never fatal; the run always
/// completes unless the configuration itself is unusable.
pub async fn run_ingestion(
    ingestion_pipeline: &IngestionPipeline,
    publisher: &DualSinkPublisher,
    ids: Vec<DocumentId>,
    config: &IngestionConfig,
) -> Result<IngestionReport, AppError> {
    config.validate()?;

    let total = ids.len();
    info!(
        documents = total,
        pool_size = config.tuning.pool_size,
        batch_size = config.tuning.batch_size,
        "starting ingestion run"
    );

    let mut report = IngestionReport::default();
    let mut accumulator = BatchAccumulator::new(config.tuning.batch_size);

    let results = pipeline::coordinator::run(ingestion_pipeline, ids, config.tuning.pool_size);
    pin_mut!(results);

    while let Some((id, result)) = results.next().await {
        match result {
            Ok(course) => {
                if let Some(batch) = accumulator.add(course) {
                    report.absorb(publisher.publish(batch).await?);
                }
            }
            Err(err) => {
                warn!(document_id = %id, kind = err.kind(), error = %err, "document failed");
                report.failures.push((id, err));
            }
        }
    }

    if let Some(batch) = accumulator.drain() {
        report.absorb(publisher.publish(batch).await?);
    }

    info!(
        documents = total,
        published = report.published.len(),
        skipped_existing = report.skipped_existing.len(),
        failed = report.failures.len(),
        "ingestion run finished"
    );
    if !report.failures.is_empty() {
        let failed: Vec<String> = report
            .failures
            .iter()
            .map(|(id, err)| format!("{id} ({})", err.kind()))
            .collect();
        warn!(failed = ?failed, "documents that did not make it this run");
    }

    Ok(report)
}
