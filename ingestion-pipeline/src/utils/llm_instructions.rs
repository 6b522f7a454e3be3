use serde_json::json;

pub static COURSE_EXTRACTION_SYSTEM_MESSAGE: &str = r#"You are an AI assistant. You will receive the unstructured text of a university course syllabus, extracted from a PDF. Your task is to produce a structured JSON object describing the course.

Guidelines:
1. The `code` is the official course code printed on the syllabus (e.g. "MAT101"). Copy it exactly; never invent one.
2. `name`, `faculty` and `summary` come from the document. Write the summary as a short paragraph in the document's language.
3. `credits` is the credit count as a number; halves are allowed.
4. `learning_outcomes` lists the stated objectives in document order.
5. `syllabus` lists the content units in document order. Each unit has a `title`, its `topics` (subtopics, possibly empty) and `estimated_hours` when the document states them, otherwise null.
6. `bibliography` lists the referenced works in document order, one string per work.
7. `professors` and `prerequisites` are copied from the document when present, otherwise left empty.
8. Do not add fields, commentary, or information that is not in the document."#;

pub fn get_course_extraction_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "code": { "type": "string" },
            "name": { "type": "string" },
            "faculty": { "type": "string" },
            "summary": { "type": "string" },
            "credits": { "type": "number" },
            "professors": {
                "type": "array",
                "items": { "type": "string" }
            },
            "learning_outcomes": {
                "type": "array",
                "items": { "type": "string" }
            },
            "syllabus": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "title": { "type": "string" },
                        "topics": {
                            "type": "array",
                            "items": { "type": "string" }
                        },
                        "estimated_hours": { "type": ["integer", "null"] }
                    },
                    "required": ["title", "topics", "estimated_hours"],
                    "additionalProperties": false
                }
            },
            "bibliography": {
                "type": "array",
                "items": { "type": "string" }
            },
            "prerequisites": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "code": { "type": "string" },
                        "name": { "type": "string" },
                        "kind": { "type": "string" }
                    },
                    "required": ["code", "name", "kind"],
                    "additionalProperties": false
                }
            }
        },
        "required": [
            "code", "name", "faculty", "summary", "credits", "professors",
            "learning_outcomes", "syllabus", "bibliography", "prerequisites"
        ],
        "additionalProperties": false
    })
}
