use async_openai::types::{
    ChatCompletionRequestSystemMessage, ChatCompletionRequestUserMessage,
    CreateChatCompletionRequestArgs,
};
use common::error::AppError;
use tracing::debug;

const QUERY_EXPANSION_SYSTEM_MESSAGE: &str = r"You will receive a student's description of their goals or interests. Write a short, concrete description of a university course that would serve that goal: its subject matter, the skills it teaches, and the kind of topics its syllabus would cover. Answer with the description only, no preamble and no list formatting.";

/// Turn the user's free-form goal into a course-shaped description whose
/// embedding lands near relevant syllabi. Plain-text completion; the result
/// is only ever embedded, never parsed.
pub async fn expand_query(
    client: &async_openai::Client<async_openai::config::OpenAIConfig>,
    model: &str,
    prompt: &str,
) -> Result<String, AppError> {
    let request = CreateChatCompletionRequestArgs::default()
        .model(model)
        .messages([
            ChatCompletionRequestSystemMessage::from(QUERY_EXPANSION_SYSTEM_MESSAGE).into(),
            ChatCompletionRequestUserMessage::from(prompt.to_string()).into(),
        ])
        .build()?;

    let response = client.chat().create(request).await?;

    let content = response
        .choices
        .first()
        .and_then(|choice| choice.message.content.as_ref())
        .map(|content| content.trim().to_string())
        .unwrap_or_default();

    debug!(expanded_len = content.len(), "query expansion finished");
    Ok(content)
}
