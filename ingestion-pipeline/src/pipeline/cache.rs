use std::future::Future;

use bytes::Bytes;
use common::storage::{store::StorageManager, types::course::Course};
use tracing::debug;

use super::error::DocumentError;
use crate::utils::sources::DocumentId;

const TEXT_STAGE: &str = "text";
const COURSE_STAGE: &str = "course";

/// Permanent memo of per-document stage outputs on stable storage.
///
/// A present artifact is returned as-is: no staleness check against the
/// source document, no TTL. Deleting a location forces recomputation on the
/// next run; an unreadable entry fails that document instead of being
/// silently recomputed.
#[derive(Clone)]
pub struct ArtifactCache {
    storage: StorageManager,
}

impl ArtifactCache {
    pub fn new(storage: StorageManager) -> Self {
        Self { storage }
    }

    fn text_location(id: &DocumentId) -> String {
        format!("artifacts/text/{id}.txt")
    }

    fn course_location(id: &DocumentId) -> String {
        format!("artifacts/course/{id}.json")
    }

    /// Returns the raw-text artifact and whether `compute` ran.
    pub async fn get_or_compute_text<F, Fut>(
        &self,
        id: &DocumentId,
        compute: F,
    ) -> Result<(String, bool), DocumentError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String, DocumentError>>,
    {
        let location = Self::text_location(id);

        if self.exists(TEXT_STAGE, &location).await? {
            let bytes = self.read(TEXT_STAGE, &location).await?;
            let text = String::from_utf8(bytes.to_vec()).map_err(|e| {
                DocumentError::CacheCorruption {
                    stage: TEXT_STAGE,
                    reason: format!("not valid UTF-8: {e}"),
                }
            })?;
            debug!(document_id = %id, "text artifact cache hit");
            return Ok((text, false));
        }

        let text = compute().await?;
        self.write(TEXT_STAGE, &location, Bytes::from(text.clone().into_bytes()))
            .await?;
        Ok((text, true))
    }

    /// Returns the structured-record artifact and whether `compute` ran.
    pub async fn get_or_compute_course<F, Fut>(
        &self,
        id: &DocumentId,
        compute: F,
    ) -> Result<(Course, bool), DocumentError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Course, DocumentError>>,
    {
        let location = Self::course_location(id);

        if self.exists(COURSE_STAGE, &location).await? {
            let bytes = self.read(COURSE_STAGE, &location).await?;
            let course: Course = serde_json::from_slice(&bytes).map_err(|e| {
                DocumentError::CacheCorruption {
                    stage: COURSE_STAGE,
                    reason: format!("failed to parse: {e}"),
                }
            })?;
            debug!(document_id = %id, "course artifact cache hit");
            return Ok((course, false));
        }

        let course = compute().await?;
        let serialized = serde_json::to_vec_pretty(&course).map_err(|e| {
            DocumentError::CacheCorruption {
                stage: COURSE_STAGE,
                reason: format!("failed to serialize: {e}"),
            }
        })?;
        self.write(COURSE_STAGE, &location, Bytes::from(serialized))
            .await?;
        Ok((course, true))
    }

    async fn exists(&self, stage: &'static str, location: &str) -> Result<bool, DocumentError> {
        self.storage
            .exists(location)
            .await
            .map_err(|e| DocumentError::CacheCorruption {
                stage,
                reason: format!("failed to probe cache: {e}"),
            })
    }

    async fn read(&self, stage: &'static str, location: &str) -> Result<Bytes, DocumentError> {
        self.storage
            .get(location)
            .await
            .map_err(|e| DocumentError::CacheCorruption {
                stage,
                reason: format!("failed to read cache: {e}"),
            })
    }

    async fn write(
        &self,
        stage: &'static str,
        location: &str,
        data: Bytes,
    ) -> Result<(), DocumentError> {
        self.storage
            .put(location, data)
            .await
            .map_err(|e| DocumentError::CacheCorruption {
                stage,
                reason: format!("failed to persist cache: {e}"),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::storage::store::testing::memory_storage;

    fn cache() -> ArtifactCache {
        ArtifactCache::new(memory_storage())
    }

    fn doc(id: &str) -> DocumentId {
        DocumentId::from_stem(id)
    }

    fn sample_course() -> Course {
        Course::new(
            "MAT101".to_string(),
            "Calculus".to_string(),
            "Sciences".to_string(),
            "Limits and derivatives.".to_string(),
            4.0,
            Vec::new(),
            Vec::new(),
            Vec::new(),
            Vec::new(),
            Vec::new(),
        )
    }

    #[tokio::test]
    async fn text_computes_once_then_hits() {
        let cache = cache();
        let id = doc("mat101");

        let (first, computed) = cache
            .get_or_compute_text(&id, || async { Ok("raw syllabus text".to_string()) })
            .await
            .expect("first call failed");
        assert!(computed);
        assert_eq!(first, "raw syllabus text");

        let (second, computed) = cache
            .get_or_compute_text(&id, || async {
                panic!("compute must not run on a cache hit")
            })
            .await
            .expect("second call failed");
        assert!(!computed);
        assert_eq!(second, "raw syllabus text");
    }

    #[tokio::test]
    async fn course_roundtrips_through_cache() {
        let cache = cache();
        let id = doc("mat101");
        let course = sample_course();

        let (stored, computed) = cache
            .get_or_compute_course(&id, || async { Ok(course.clone()) })
            .await
            .expect("first call failed");
        assert!(computed);
        assert_eq!(stored.code, "MAT101");

        let (cached, computed) = cache
            .get_or_compute_course(&id, || async {
                panic!("compute must not run on a cache hit")
            })
            .await
            .expect("second call failed");
        assert!(!computed);
        assert_eq!(cached, stored);
    }

    #[tokio::test]
    async fn corrupt_course_artifact_surfaces_not_recomputes() {
        let storage = memory_storage();
        let cache = ArtifactCache::new(storage.clone());
        let id = doc("mat101");

        storage
            .put("artifacts/course/mat101.json", Bytes::from_static(b"{ not json"))
            .await
            .expect("seed corrupt artifact");

        let err = cache
            .get_or_compute_course(&id, || async { Ok(sample_course()) })
            .await
            .expect_err("corrupt artifact must fail the document");
        assert!(matches!(
            err,
            DocumentError::CacheCorruption { stage: "course", .. }
        ));
    }

    #[tokio::test]
    async fn compute_failure_is_not_cached() {
        let cache = cache();
        let id = doc("mat101");

        let err = cache
            .get_or_compute_text(&id, || async {
                Err(DocumentError::Extraction("boom".into()))
            })
            .await
            .expect_err("compute error should propagate");
        assert!(matches!(err, DocumentError::Extraction(_)));

        // A later successful compute still runs and persists.
        let (_, computed) = cache
            .get_or_compute_text(&id, || async { Ok("recovered".to_string()) })
            .await
            .expect("retry failed");
        assert!(computed);
    }
}
