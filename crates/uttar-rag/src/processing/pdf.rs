//! Per-page PDF text extraction via lopdf.

use anyhow::{Context, Result};
use lopdf::Document;
use std::path::Path;

/// Text content of a single PDF page.
#[derive(Debug, Clone)]
pub struct PdfPage {
    /// 1-based page number.
    pub page_number: u32,
    pub text: String,
}

/// Extract text from every page of a PDF, skipping pages that cannot be
/// decoded. Fails only when the document itself cannot be loaded.
pub fn extract_pdf_pages(path: &Path) -> Result<Vec<PdfPage>> {
    let doc = Document::load(path)
        .with_context(|| format!("failed to load PDF {}", path.display()))?;

    let mut pages = Vec::new();
    for page_number in doc.get_pages().keys() {
        match doc.extract_text(&[*page_number]) {
            Ok(text) => {
                if !text.trim().is_empty() {
                    pages.push(PdfPage {
                        page_number: *page_number,
                        text,
                    });
                }
            }
            Err(e) => {
                tracing::warn!(
                    document = %path.display(),
                    page = *page_number,
                    error = %e,
                    "skipping unreadable PDF page"
                );
            }
        }
    }

    Ok(pages)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_an_error() {
        let err = extract_pdf_pages(Path::new("/nonexistent/file.pdf"));
        assert!(err.is_err());
    }

    #[test]
    fn test_non_pdf_bytes_are_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.pdf");
        std::fs::write(&path, b"this is not a pdf").unwrap();
        assert!(extract_pdf_pages(&path).is_err());
    }
}
