use sha2::{Digest, Sha256};

use crate::{error::AppError, storage::db::SurrealDbClient, stored_object};

/// Name of the HNSW index backing similarity search over course points.
const POINT_INDEX_NAME: &str = "idx_embedding_course_point";

/// Length of the hex point id derived from the namespace and course code.
const POINT_ID_HEX_LEN: usize = 32;

stored_object!(CoursePoint, "course_point", {
    /// Payload: just enough to resolve back to the full record.
    code: String,
    embedding: Vec<f32>
});

/// A search hit: the payload code plus its KNN distance (smaller is closer).
#[derive(Debug, Clone, Deserialize)]
pub struct ScoredPoint {
    pub code: String,
    pub distance: f32,
}

impl CoursePoint {
    /// Deterministic point id: hex SHA-256 of `"{namespace}:{code}"`,
    /// truncated. Content-independent, so re-publishing a code always lands
    /// on the same point and the upsert overwrites instead of appending.
    pub fn point_id(namespace: &str, code: &str) -> String {
        let digest = Sha256::digest(format!("{namespace}:{code}").as_bytes());
        let mut hex = String::with_capacity(POINT_ID_HEX_LEN);
        for byte in digest.iter().take(POINT_ID_HEX_LEN / 2) {
            hex.push_str(&format!("{byte:02x}"));
        }
        hex
    }

    pub fn new(namespace: &str, code: String, embedding: Vec<f32>) -> Self {
        let now = Utc::now();
        Self {
            id: Self::point_id(namespace, &code),
            created_at: now,
            updated_at: now,
            code,
            embedding,
        }
    }

    /// Define the HNSW index over the point table if it is not present.
    /// The dimension is fixed at definition time; a provider emitting a
    /// different dimension is a configuration error caught before any run.
    pub async fn ensure_collection(
        db: &SurrealDbClient,
        dimension: usize,
    ) -> Result<(), AppError> {
        let query = format!(
            "DEFINE INDEX IF NOT EXISTS {POINT_INDEX_NAME} ON TABLE {table} \
             FIELDS embedding HNSW DIMENSION {dimension} DIST COSINE;",
            table = Self::table_name(),
        );

        let res = db.client.query(query).await.map_err(AppError::Database)?;
        res.check().map_err(AppError::Database)?;

        Ok(())
    }

    /// Last-write-wins write keyed by the deterministic point id.
    pub async fn upsert(self, db: &SurrealDbClient) -> Result<(), AppError> {
        let _: Option<Self> = db
            .client
            .upsert((Self::table_name(), self.id.clone()))
            .content(self)
            .await
            .map_err(AppError::Database)?;
        Ok(())
    }

    /// KNN search over the point table, nearest first.
    pub async fn search(
        db: &SurrealDbClient,
        vector: &[f32],
        top_k: u8,
    ) -> Result<Vec<ScoredPoint>, AppError> {
        let query = format!(
            "SELECT code, vector::distance::knn() AS distance FROM {} \
             WHERE embedding <|{},40|> {:?} ORDER BY distance",
            Self::table_name(),
            top_k,
            vector,
        );

        let points: Vec<ScoredPoint> = db
            .client
            .query(query)
            .await
            .map_err(AppError::Database)?
            .take(0)
            .map_err(AppError::Database)?;

        Ok(points)
    }
}
