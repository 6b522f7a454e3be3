use async_openai::types::{
    ChatCompletionRequestSystemMessage, ChatCompletionRequestUserMessage,
    CreateChatCompletionRequestArgs, ResponseFormat, ResponseFormatJsonSchema,
};
use common::{error::AppError, storage::types::course::Course};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::RecommendedCourse;

const RANKING_SYSTEM_MESSAGE: &str = r"You will receive a student's goal and a list of candidate university courses. Re-order the courses from most to least useful for that goal and, for each one you keep, explain why it helps, which of its aspects favour the goal and which work against it. Refer to courses only by the `code` values you were given; never invent a code. Drop courses that are clearly irrelevant.";

#[derive(Debug, Deserialize)]
struct CourseJudgement {
    code: String,
    explanation: String,
    favourable_factors: Vec<String>,
    unfavourable_factors: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RankingResponse {
    recommendations: Vec<CourseJudgement>,
}

fn get_ranking_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "recommendations": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "code": { "type": "string" },
                        "explanation": { "type": "string" },
                        "favourable_factors": {
                            "type": "array",
                            "items": { "type": "string" }
                        },
                        "unfavourable_factors": {
                            "type": "array",
                            "items": { "type": "string" }
                        }
                    },
                    "required": [
                        "code", "explanation",
                        "favourable_factors", "unfavourable_factors"
                    ],
                    "additionalProperties": false
                }
            }
        },
        "required": ["recommendations"],
        "additionalProperties": false
    })
}

fn courses_to_json(courses: &[Course]) -> serde_json::Value {
    json!(courses
        .iter()
        .map(|course| {
            json!({
                "code": course.code,
                "name": course.name,
                "faculty": course.faculty,
                "summary": course.summary,
                "credits": course.credits,
                "learning_outcomes": course.learning_outcomes,
                "syllabus_titles": course
                    .syllabus
                    .iter()
                    .map(|unit| unit.title.clone())
                    .collect::<Vec<_>>(),
            })
        })
        .collect::<Vec<_>>())
}

/// Join the model's ranked judgements back onto the hydrated records. The
/// model's order wins; judgements for codes we never sent are dropped.
fn join_judgements(
    courses: Vec<Course>,
    judgements: Vec<CourseJudgement>,
) -> Vec<RecommendedCourse> {
    judgements
        .into_iter()
        .filter_map(|judgement| {
            let course = courses.iter().find(|c| c.code == judgement.code)?.clone();
            Some(RecommendedCourse {
                course,
                explanation: judgement.explanation,
                favourable_factors: judgement.favourable_factors,
                unfavourable_factors: judgement.unfavourable_factors,
            })
        })
        .collect()
}

/// Re-rank and annotate the hydrated candidates against the user's goal.
pub async fn annotate_courses(
    client: &async_openai::Client<async_openai::config::OpenAIConfig>,
    model: &str,
    user_prompt: &str,
    courses: Vec<Course>,
) -> Result<Vec<RecommendedCourse>, AppError> {
    if courses.is_empty() {
        return Ok(Vec::new());
    }

    let user_message = format!(
        "Student goal:\n{user_prompt}\n\nCandidate courses:\n{}",
        courses_to_json(&courses)
    );

    let response_format = ResponseFormat::JsonSchema {
        json_schema: ResponseFormatJsonSchema {
            description: Some("Ranked course recommendations for the student".into()),
            name: "course_ranking".into(),
            schema: Some(get_ranking_schema()),
            strict: Some(true),
        },
    };

    let request = CreateChatCompletionRequestArgs::default()
        .model(model)
        .messages([
            ChatCompletionRequestSystemMessage::from(RANKING_SYSTEM_MESSAGE).into(),
            ChatCompletionRequestUserMessage::from(user_message).into(),
        ])
        .response_format(response_format)
        .build()?;

    let response = client.chat().create(request).await?;

    let content = response
        .choices
        .first()
        .and_then(|choice| choice.message.content.as_ref())
        .ok_or_else(|| AppError::LLMParsing("no content in ranking response".into()))?;

    let ranking: RankingResponse = serde_json::from_str(content).map_err(|e| {
        AppError::LLMParsing(format!("failed to parse ranking response: {e}"))
    })?;

    debug!(
        candidates = courses.len(),
        recommended = ranking.recommendations.len(),
        "re-ranking finished"
    );

    Ok(join_judgements(courses, ranking.recommendations))
}
