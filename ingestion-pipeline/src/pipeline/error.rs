use thiserror::Error;

use crate::utils::sources::DocumentId;

/// Outcome of one document's pipeline run. Never aborts the overall run;
/// the coordinator reports these alongside the document identifier.
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("no source document found for '{0}'")]
    MissingSource(DocumentId),
    #[error("structured extraction failed: {0}")]
    Extraction(String),
    #[error("cached {stage} artifact is unusable: {reason}")]
    CacheCorruption {
        stage: &'static str,
        reason: String,
    },
}

impl DocumentError {
    /// Short tag used in log fields and run summaries.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingSource(_) => "missing_source",
            Self::Extraction(_) => "extraction",
            Self::CacheCorruption { .. } => "cache_corruption",
        }
    }
}
