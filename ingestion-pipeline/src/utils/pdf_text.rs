use std::path::Path;

use common::error::AppError;
use lopdf::Document;
use tracing::debug;

/// Minimum amount of extracted text considered a usable text layer.
const MIN_EXTRACTED_CHARS: usize = 150;

/// Extract the page-ordered text layer of a PDF.
///
/// Fails when the document has no pages or the text layer is too sparse to
/// be a syllabus; scanned documents without OCR land here.
pub async fn extract_pdf_text(file_path: &Path) -> Result<String, AppError> {
    let pdf_bytes = tokio::fs::read(file_path).await?;

    let page_count = load_page_count(pdf_bytes.clone()).await?;
    if page_count == 0 {
        return Err(AppError::Processing("PDF appears to have no pages".into()));
    }
    debug!(pages = page_count, path = %file_path.display(), "extracting PDF text layer");

    let text = tokio::task::spawn_blocking(move || {
        pdf_extract::extract_text_from_mem(&pdf_bytes)
            .map_err(|e| AppError::Processing(format!("PDF text extraction failed: {e}")))
    })
    .await??;

    let trimmed = text.trim();
    if trimmed.chars().count() < MIN_EXTRACTED_CHARS {
        return Err(AppError::Processing(format!(
            "PDF text layer too sparse ({} chars); document may be scanned",
            trimmed.chars().count()
        )));
    }

    Ok(trimmed.to_string())
}

async fn load_page_count(pdf_bytes: Vec<u8>) -> Result<usize, AppError> {
    tokio::task::spawn_blocking(move || {
        Document::load_mem(&pdf_bytes)
            .map(|doc| doc.get_pages().len())
            .map_err(|e| AppError::Processing(format!("failed to read PDF structure: {e}")))
    })
    .await?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_is_io_error() {
        let err = extract_pdf_text(Path::new("/no/such/file.pdf"))
            .await
            .expect_err("should fail");
        assert!(matches!(err, AppError::Io(_)));
    }

    #[tokio::test]
    async fn garbage_bytes_fail_structure_read() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("broken.pdf");
        tokio::fs::write(&path, b"not a pdf at all").await.unwrap();

        let err = extract_pdf_text(&path).await.expect_err("should fail");
        assert!(matches!(err, AppError::Processing(_)));
    }
}
