use common::storage::types::course::{Course, Prerequisite, SyllabusUnit};
use serde::Deserialize;

/// Shape of the structured-extraction response, before it becomes a stored
/// record. Mirrors the JSON schema sent with the request.
#[derive(Debug, Clone, Deserialize)]
pub struct LLMCourseExtraction {
    pub code: String,
    pub name: String,
    pub faculty: String,
    pub summary: String,
    pub credits: f32,
    #[serde(default)]
    pub professors: Vec<String>,
    #[serde(default)]
    pub learning_outcomes: Vec<String>,
    #[serde(default)]
    pub syllabus: Vec<SyllabusUnit>,
    #[serde(default)]
    pub bibliography: Vec<String>,
    #[serde(default)]
    pub prerequisites: Vec<Prerequisite>,
}

impl LLMCourseExtraction {
    pub fn into_course(self) -> Course {
        Course::new(
            self.code,
            self.name,
            self.faculty,
            self.summary,
            self.credits,
            self.professors,
            self.learning_outcomes,
            self.syllabus,
            self.bibliography,
            self.prerequisites,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_schema_shaped_response() {
        let raw = r#"{
            "code": "ADM330",
            "name": "Strategic Management",
            "faculty": "Business",
            "summary": "Strategy formulation and execution.",
            "credits": 3.5,
            "professors": ["R. Vargas"],
            "learning_outcomes": ["Formulate a corporate strategy"],
            "syllabus": [
                {"title": "Industry analysis", "topics": ["Five forces"], "estimated_hours": 8},
                {"title": "Execution", "topics": [], "estimated_hours": null}
            ],
            "bibliography": ["Porter, Competitive Strategy"],
            "prerequisites": [{"code": "ADM201", "name": "Management", "kind": "mandatory"}]
        }"#;

        let parsed: LLMCourseExtraction = serde_json::from_str(raw).expect("should parse");
        let course = parsed.into_course();

        assert_eq!(course.id, "ADM330");
        assert_eq!(course.code, "ADM330");
        assert_eq!(course.syllabus.len(), 2);
        assert_eq!(course.syllabus[0].estimated_hours, Some(8));
        assert_eq!(course.syllabus[1].estimated_hours, None);
        assert_eq!(course.prerequisites[0].kind, "mandatory");
    }

    #[test]
    fn missing_collections_default_to_empty() {
        let raw = r#"{
            "code": "MAT101",
            "name": "Calculus",
            "faculty": "Sciences",
            "summary": "Limits and derivatives.",
            "credits": 4.0
        }"#;

        let parsed: LLMCourseExtraction = serde_json::from_str(raw).expect("should parse");
        assert!(parsed.professors.is_empty());
        assert!(parsed.syllabus.is_empty());
    }
}
