use std::sync::Arc;

use common::{
    error::AppError,
    storage::{
        db::SurrealDbClient,
        types::{course::Course, course_point::CoursePoint},
    },
    utils::embedding::EmbeddingProvider,
};
use tracing::{info, warn};

/// What one publish call did, per sink. A non-empty failure list on one
/// side only means the indexes are transiently inconsistent for those
/// codes; re-running ingestion converges them (both writes are idempotent).
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Codes newly written to the record store.
    pub published: Vec<String>,
    /// Codes skipped because the record store already had an entry.
    pub skipped_existing: Vec<String>,
    /// Codes whose vector-index write did not happen.
    pub vector_failed: Vec<String>,
    /// Codes whose record-store write failed.
    pub record_failed: Vec<String>,
}

impl BatchReport {
    pub fn is_partial(&self) -> bool {
        !self.vector_failed.is_empty() || !self.record_failed.is_empty()
    }
}

/// Publishes a batch of records into the vector index and the record store.
///
/// The two sinks deliberately diverge: the vector index is cheap to
/// regenerate, so points are always overwritten; the record store is
/// authoritative and write-once per code. There is no transaction spanning
/// the two; a failure in one sink never rolls back the other.
pub struct DualSinkPublisher {
    embedding_provider: Arc<EmbeddingProvider>,
    vector_db: Arc<SurrealDbClient>,
    record_db: Arc<SurrealDbClient>,
    namespace: String,
}

impl DualSinkPublisher {
    pub fn new(
        embedding_provider: Arc<EmbeddingProvider>,
        vector_db: Arc<SurrealDbClient>,
        record_db: Arc<SurrealDbClient>,
        namespace: String,
    ) -> Self {
        Self {
            embedding_provider,
            vector_db,
            record_db,
            namespace,
        }
    }

    #[tracing::instrument(skip_all, fields(batch_len = batch.len()))]
    pub async fn publish(&self, batch: Vec<Course>) -> Result<BatchReport, AppError> {
        let mut report = BatchReport::default();
        if batch.is_empty() {
            return Ok(report);
        }

        let vectors = self.vectorize(&batch).await?;
        self.upsert_points(&batch, vectors, &mut report).await;
        self.store_records(batch, &mut report).await;

        if report.is_partial() {
            warn!(
                vector_failed = ?report.vector_failed,
                record_failed = ?report.record_failed,
                "publish batch left the indexes inconsistent for these codes; \
                 re-run ingestion to converge"
            );
        }
        info!(
            published = report.published.len(),
            skipped_existing = report.skipped_existing.len(),
            "publish batch finished"
        );

        Ok(report)
    }

    /// One embedding call per batch. A count or dimension mismatch is a
    /// configuration fault and aborts the run; a transport failure only
    /// costs this batch its vector writes.
    async fn vectorize(&self, batch: &[Course]) -> Result<Option<Vec<Vec<f32>>>, AppError> {
        let inputs: Vec<String> = batch.iter().map(Course::embedding_input).collect();

        let vectors = match self.embedding_provider.embed_batch(inputs).await {
            Ok(vectors) => vectors,
            Err(e) => {
                warn!(error = %e, "batch vectorization failed; skipping vector writes");
                return Ok(None);
            }
        };

        if vectors.len() != batch.len() {
            return Err(AppError::Config(format!(
                "embedding service returned {} vectors for {} inputs",
                vectors.len(),
                batch.len()
            )));
        }

        let expected = self.embedding_provider.dimension();
        for vector in &vectors {
            if vector.len() != expected {
                return Err(AppError::Config(format!(
                    "embedding dimension {} does not match the configured {}",
                    vector.len(),
                    expected
                )));
            }
        }

        Ok(Some(vectors))
    }

    async fn upsert_points(
        &self,
        batch: &[Course],
        vectors: Option<Vec<Vec<f32>>>,
        report: &mut BatchReport,
    ) {
        let Some(vectors) = vectors else {
            report
                .vector_failed
                .extend(batch.iter().map(|c| c.code.clone()));
            return;
        };

        for (course, vector) in batch.iter().zip(vectors) {
            let point = CoursePoint::new(&self.namespace, course.code.clone(), vector);
            if let Err(e) = point.upsert(&self.vector_db).await {
                warn!(code = %course.code, error = %e, "vector point upsert failed");
                report.vector_failed.push(course.code.clone());
            }
        }
    }

    async fn store_records(&self, batch: Vec<Course>, report: &mut BatchReport) {
        for course in batch {
            let code = course.code.clone();

            match Course::exists_by_code(&code, &self.record_db).await {
                Ok(true) => {
                    info!(%code, "record already exists; leaving it untouched");
                    report.skipped_existing.push(code);
                }
                Ok(false) => match course.store(&self.record_db).await {
                    Ok(()) => report.published.push(code),
                    Err(e) => {
                        warn!(%code, error = %e, "record store write failed");
                        report.record_failed.push(code);
                    }
                },
                Err(e) => {
                    warn!(%code, error = %e, "record existence check failed");
                    report.record_failed.push(code);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    const TEST_DIMENSION: usize = 16;

    fn course(code: &str, name: &str) -> Course {
        Course::new(
            code.to_string(),
            name.to_string(),
            "Faculty".to_string(),
            format!("Summary of {name}"),
            3.0,
            Vec::new(),
            Vec::new(),
            Vec::new(),
            Vec::new(),
            Vec::new(),
        )
    }

    async fn setup() -> (DualSinkPublisher, Arc<SurrealDbClient>, Arc<SurrealDbClient>) {
        let vector_db = Arc::new(
            SurrealDbClient::memory("test_ns", &Uuid::new_v4().to_string())
                .await
                .expect("vector db"),
        );
        let record_db = Arc::new(
            SurrealDbClient::memory("test_ns", &Uuid::new_v4().to_string())
                .await
                .expect("record db"),
        );
        CoursePoint::ensure_collection(&vector_db, TEST_DIMENSION)
            .await
            .expect("point index");

        let provider =
            Arc::new(EmbeddingProvider::new_hashed(TEST_DIMENSION).expect("hashed provider"));
        let publisher = DualSinkPublisher::new(
            provider,
            Arc::clone(&vector_db),
            Arc::clone(&record_db),
            "courses".to_string(),
        );
        (publisher, vector_db, record_db)
    }

    #[tokio::test]
    async fn publishes_batch_to_both_sinks() {
        let (publisher, vector_db, record_db) = setup().await;

        let report = publisher
            .publish(vec![course("MAT101", "Calculus"), course("FIS201", "Physics")])
            .await
            .expect("publish failed");

        assert_eq!(report.published.len(), 2);
        assert!(!report.is_partial());

        let points: Vec<CoursePoint> = vector_db.get_all_stored_items().await.unwrap();
        assert_eq!(points.len(), 2);
        assert!(Course::exists_by_code("MAT101", &record_db).await.unwrap());
        assert!(Course::exists_by_code("FIS201", &record_db).await.unwrap());
    }

    #[tokio::test]
    async fn skip_if_exists_preserves_original_record() {
        let (publisher, vector_db, record_db) = setup().await;

        course("MAT101", "Original Calculus")
            .store(&record_db)
            .await
            .expect("seed record");

        let report = publisher
            .publish(vec![course("MAT101", "Rewritten Calculus")])
            .await
            .expect("publish failed");

        assert_eq!(report.skipped_existing, vec!["MAT101".to_string()]);
        assert!(report.published.is_empty());

        let stored = Course::get_by_code("MAT101", &record_db)
            .await
            .unwrap()
            .expect("record should exist");
        assert_eq!(stored.name, "Original Calculus");

        // The vector point is still refreshed for the code.
        let points: Vec<CoursePoint> = vector_db.get_all_stored_items().await.unwrap();
        assert_eq!(points.len(), 1);
    }

    #[tokio::test]
    async fn double_publish_is_idempotent() {
        let (publisher, vector_db, record_db) = setup().await;
        let batch = vec![course("MAT101", "Calculus"), course("FIS201", "Physics")];

        publisher.publish(batch.clone()).await.expect("first publish");
        let second = publisher.publish(batch).await.expect("second publish");

        assert_eq!(second.skipped_existing.len(), 2);
        assert!(second.published.is_empty());

        let points: Vec<CoursePoint> = vector_db.get_all_stored_items().await.unwrap();
        assert_eq!(points.len(), 2, "points are upserted, never appended");
        let records: Vec<Course> = record_db.get_all_stored_items().await.unwrap();
        assert_eq!(records.len(), 2);
    }

    #[tokio::test]
    async fn empty_batch_is_a_no_op() {
        let (publisher, vector_db, _record_db) = setup().await;

        let report = publisher.publish(Vec::new()).await.expect("publish failed");

        assert!(report.published.is_empty());
        let points: Vec<CoursePoint> = vector_db.get_all_stored_items().await.unwrap();
        assert!(points.is_empty());
    }
}
