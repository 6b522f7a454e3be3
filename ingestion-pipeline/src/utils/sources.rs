use std::fmt;
use std::path::{Path, PathBuf};

use common::error::AppError;
use serde::{Deserialize, Serialize};

/// Stable, case-normalized name of one source document. Derived once at
/// enumeration time and used as the cache and correlation key everywhere.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentId(String);

impl DocumentId {
    /// Normalizes the identifier space instead of renaming files on disk.
    pub fn from_stem(stem: &str) -> Self {
        Self(stem.to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Directory of source PDFs, enumerated and resolved case-insensitively.
#[derive(Debug, Clone)]
pub struct SourceDocuments {
    dir: PathBuf,
}

impl SourceDocuments {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// List the identifiers of every PDF in the source directory, sorted
    /// and deduplicated. A missing directory is a configuration problem.
    pub async fn enumerate(&self) -> Result<Vec<DocumentId>, AppError> {
        if !self.dir.exists() {
            return Err(AppError::Config(format!(
                "source directory '{}' does not exist",
                self.dir.display()
            )));
        }

        let mut ids = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if !is_pdf(&path) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                ids.push(DocumentId::from_stem(stem));
            }
        }

        ids.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        ids.dedup();
        Ok(ids)
    }

    /// Find the on-disk PDF for an identifier, matching the stem
    /// case-insensitively. `None` means the document has no source.
    pub async fn resolve(&self, id: &DocumentId) -> Option<PathBuf> {
        let mut entries = tokio::fs::read_dir(&self.dir).await.ok()?;
        while let Ok(Some(entry)) = entries.next_entry().await {
            let path = entry.path();
            if !is_pdf(&path) {
                continue;
            }
            let matches = path
                .file_stem()
                .and_then(|s| s.to_str())
                .is_some_and(|stem| stem.to_lowercase() == id.as_str());
            if matches {
                return Some(path);
            }
        }
        None
    }
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}
