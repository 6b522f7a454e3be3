use std::sync::Arc;

use async_openai::types::{
    ChatCompletionRequestSystemMessage, ChatCompletionRequestUserMessage,
    CreateChatCompletionRequest, CreateChatCompletionRequestArgs, ResponseFormat,
    ResponseFormatJsonSchema,
};
use async_trait::async_trait;
use common::storage::types::course::Course;
use tokio_retry::{
    strategy::{jitter, ExponentialBackoff},
    Retry,
};
use tracing::debug;

use super::{config::IngestionTuning, error::DocumentError, extraction_result::LLMCourseExtraction};
use crate::utils::{
    llm_instructions::{get_course_extraction_schema, COURSE_EXTRACTION_SYSTEM_MESSAGE},
    pdf_text::extract_pdf_text,
    sources::{DocumentId, SourceDocuments},
};

/// Seam between the stage pipeline and its external collaborators, so tests
/// can drive the pipeline without a source directory or a model endpoint.
#[async_trait]
pub trait PipelineServices: Send + Sync {
    /// Stage 1: resolve the source document and produce its raw text.
    async fn extract_text(&self, id: &DocumentId) -> Result<String, DocumentError>;

    /// Stage 2: turn raw text into a structured course record.
    async fn extract_course(&self, id: &DocumentId, text: &str)
        -> Result<Course, DocumentError>;
}

pub struct DefaultPipelineServices {
    sources: SourceDocuments,
    openai_client: Arc<async_openai::Client<async_openai::config::OpenAIConfig>>,
    extraction_model: String,
    extraction_attempts: usize,
    extraction_initial_backoff_ms: u64,
}

impl DefaultPipelineServices {
    pub fn new(
        sources: SourceDocuments,
        openai_client: Arc<async_openai::Client<async_openai::config::OpenAIConfig>>,
        extraction_model: String,
        tuning: &IngestionTuning,
    ) -> Self {
        Self {
            sources,
            openai_client,
            extraction_model,
            extraction_attempts: tuning.extraction_attempts,
            extraction_initial_backoff_ms: tuning.extraction_initial_backoff_ms,
        }
    }

    fn prepare_extraction_request(
        &self,
        text: &str,
    ) -> Result<CreateChatCompletionRequest, DocumentError> {
        let response_format = ResponseFormat::JsonSchema {
            json_schema: ResponseFormatJsonSchema {
                description: Some("Structured representation of one course syllabus".into()),
                name: "course_extraction".into(),
                schema: Some(get_course_extraction_schema()),
                strict: Some(true),
            },
        };

        CreateChatCompletionRequestArgs::default()
            .model(&self.extraction_model)
            .messages([
                ChatCompletionRequestSystemMessage::from(COURSE_EXTRACTION_SYSTEM_MESSAGE).into(),
                ChatCompletionRequestUserMessage::from(format!("Syllabus text:\n{text}")).into(),
            ])
            .response_format(response_format)
            .build()
            .map_err(|e| DocumentError::Extraction(format!("failed to build request: {e}")))
    }

    async fn perform_extraction(
        &self,
        request: CreateChatCompletionRequest,
    ) -> Result<Course, DocumentError> {
        // Only the transport call is retried; a parseable-but-wrong response
        // is a per-document failure, not a transient fault.
        let retry_strategy = ExponentialBackoff::from_millis(self.extraction_initial_backoff_ms)
            .map(jitter)
            .take(self.extraction_attempts.saturating_sub(1));

        let response = Retry::spawn(retry_strategy, || async {
            self.openai_client.chat().create(request.clone()).await
        })
        .await
        .map_err(|e| DocumentError::Extraction(format!("extraction call failed: {e}")))?;

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.as_ref())
            .ok_or_else(|| {
                DocumentError::Extraction("no content in extraction response".into())
            })?;

        let extraction: LLMCourseExtraction = serde_json::from_str(content).map_err(|e| {
            DocumentError::Extraction(format!("unparseable extraction response: {e}"))
        })?;

        if extraction.code.trim().is_empty() {
            return Err(DocumentError::Extraction(
                "extraction produced an empty course code".into(),
            ));
        }

        Ok(extraction.into_course())
    }
}

#[async_trait]
impl PipelineServices for DefaultPipelineServices {
    async fn extract_text(&self, id: &DocumentId) -> Result<String, DocumentError> {
        let Some(path) = self.sources.resolve(id).await else {
            return Err(DocumentError::MissingSource(id.clone()));
        };

        debug!(document_id = %id, path = %path.display(), "extracting source text");
        extract_pdf_text(&path)
            .await
            .map_err(|e| DocumentError::Extraction(format!("text extraction failed: {e}")))
    }

    async fn extract_course(
        &self,
        id: &DocumentId,
        text: &str,
    ) -> Result<Course, DocumentError> {
        debug!(document_id = %id, "requesting structured extraction");
        let request = self.prepare_extraction_request(text)?;
        self.perform_extraction(request).await
    }
}
