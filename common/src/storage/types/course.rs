use crate::{error::AppError, storage::db::SurrealDbClient, stored_object};

/// One unit of the syllabus outline, in document order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SyllabusUnit {
    pub title: String,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub estimated_hours: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Prerequisite {
    pub code: String,
    pub name: String,
    /// Requirement kind as stated in the syllabus (e.g. mandatory, co-requisite).
    pub kind: String,
}

stored_object!(Course, "course", {
    /// Domain primary key; also the record id, so lookups go through it.
    code: String,
    name: String,
    faculty: String,
    summary: String,
    credits: f32,
    #[serde(default)]
    professors: Vec<String>,
    #[serde(default)]
    learning_outcomes: Vec<String>,
    #[serde(default)]
    syllabus: Vec<SyllabusUnit>,
    #[serde(default)]
    bibliography: Vec<String>,
    #[serde(default)]
    prerequisites: Vec<Prerequisite>
});

impl Course {
    /// Fixed textual projection fed to the embedding service. Field order
    /// and join style must not change between runs: re-publishing a course
    /// has to reproduce the same input text.
    pub fn embedding_input(&self) -> String {
        let outcomes = self.learning_outcomes.join("; ");
        let units = self
            .syllabus
            .iter()
            .map(|unit| unit.title.as_str())
            .collect::<Vec<_>>()
            .join("; ");
        let bibliography = self.bibliography.join("; ");

        format!(
            "name: {}\nfaculty: {}\nsummary: {}\noutcomes: {}\nsyllabus: {}\nbibliography: {}\ncode: {}\ncredits: {}",
            self.name,
            self.faculty,
            self.summary,
            outcomes,
            units,
            bibliography,
            self.code,
            self.credits,
        )
    }

    pub async fn get_by_code(
        code: &str,
        db: &SurrealDbClient,
    ) -> Result<Option<Self>, AppError> {
        db.get_item(code).await.map_err(AppError::Database)
    }

    pub async fn exists_by_code(code: &str, db: &SurrealDbClient) -> Result<bool, AppError> {
        Ok(Self::get_by_code(code, db).await?.is_some())
    }

    /// Write the record under its code. Caller decides the skip-if-exists
    /// policy; this is a plain insert that fails on a duplicate id.
    pub async fn store(self, db: &SurrealDbClient) -> Result<(), AppError> {
        db.store_item(self).await.map_err(AppError::Database)?;
        Ok(())
    }

    /// Hydrate full records for a set of codes. Result order is unspecified;
    /// callers that care about ranking re-order by their own code list.
    pub async fn get_by_codes(
        codes: Vec<String>,
        db: &SurrealDbClient,
    ) -> Result<Vec<Self>, AppError> {
        if codes.is_empty() {
            return Ok(Vec::new());
        }

        let query = format!(
            "SELECT * FROM {} WHERE code INSIDE $codes",
            Self::table_name()
        );
        let mut result = db
            .client
            .query(query)
            .bind(("codes", codes))
            .await
            .map_err(AppError::Database)?;
        let courses: Vec<Self> = result.take(0).map_err(AppError::Database)?;
        Ok(courses)
    }
}

/// Build a course keyed by its own code.
impl Course {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        code: String,
        name: String,
        faculty: String,
        summary: String,
        credits: f32,
        professors: Vec<String>,
        learning_outcomes: Vec<String>,
        syllabus: Vec<SyllabusUnit>,
        bibliography: Vec<String>,
        prerequisites: Vec<Prerequisite>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: code.clone(),
            created_at: now,
            updated_at: now,
            code,
            name,
            faculty,
            summary,
            credits,
            professors,
            learning_outcomes,
            syllabus,
            bibliography,
            prerequisites,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn sample_course(code: &str) -> Course {
        Course::new(
            code.to_string(),
            "Linear Algebra".to_string(),
            "Sciences".to_string(),
            "Vector spaces and linear maps.".to_string(),
            4.0,
            vec!["A. Turing".to_string()],
            vec!["Solve linear systems".to_string()],
            vec![SyllabusUnit {
                title: "Matrices".to_string(),
                topics: vec!["Gaussian elimination".to_string()],
                estimated_hours: Some(12),
            }],
            vec!["Strang, Introduction to Linear Algebra".to_string()],
            Vec::new(),
        )
    }

    async fn setup_test_db() -> SurrealDbClient {
        SurrealDbClient::memory("test_ns", &Uuid::new_v4().to_string())
            .await
            .expect("Failed to start in-memory surrealdb")
    }

    #[test]
    fn embedding_input_is_deterministic() {
        let course = sample_course("MAT101");
        assert_eq!(course.embedding_input(), course.embedding_input());
    }

    #[test]
    fn embedding_input_orders_fields() {
        let input = sample_course("MAT101").embedding_input();
        let name_pos = input.find("name: Linear Algebra").expect("name present");
        let code_pos = input.find("code: MAT101").expect("code present");
        let credits_pos = input.find("credits: 4").expect("credits present");
        assert!(name_pos < code_pos);
        assert!(code_pos < credits_pos);
        assert!(input.contains("syllabus: Matrices"));
    }

    #[tokio::test]
    async fn store_and_get_by_code() {
        let db = setup_test_db().await;
        let course = sample_course("MAT101");

        course.clone().store(&db).await.expect("store failed");

        let fetched = Course::get_by_code("MAT101", &db)
            .await
            .expect("get failed")
            .expect("course should exist");
        assert_eq!(fetched.code, "MAT101");
        assert_eq!(fetched.name, "Linear Algebra");
        assert!(Course::exists_by_code("MAT101", &db).await.unwrap());
        assert!(!Course::exists_by_code("FIS201", &db).await.unwrap());
    }

    #[tokio::test]
    async fn duplicate_store_fails() {
        let db = setup_test_db().await;
        sample_course("MAT101").store(&db).await.expect("first store");

        let second = sample_course("MAT101").store(&db).await;
        assert!(second.is_err(), "duplicate id insert should fail");
    }

    #[tokio::test]
    async fn get_by_codes_returns_matching_subset() {
        let db = setup_test_db().await;
        sample_course("MAT101").store(&db).await.unwrap();
        sample_course("FIS201").store(&db).await.unwrap();
        sample_course("QUI301").store(&db).await.unwrap();

        let mut fetched = Course::get_by_codes(
            vec![
                "MAT101".to_string(),
                "QUI301".to_string(),
                "NOPE999".to_string(),
            ],
            &db,
        )
        .await
        .expect("bulk get failed");

        fetched.sort_by(|a, b| a.code.cmp(&b.code));
        let codes: Vec<&str> = fetched.iter().map(|c| c.code.as_str()).collect();
        assert_eq!(codes, vec!["MAT101", "QUI301"]);
    }

    #[tokio::test]
    async fn get_by_codes_empty_input() {
        let db = setup_test_db().await;
        let fetched = Course::get_by_codes(Vec::new(), &db).await.unwrap();
        assert!(fetched.is_empty());
    }
}
