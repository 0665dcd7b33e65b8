//! PDF text extraction

use crate::error::{Error, Result};

/// Extracts plain text from PDF bytes, one entry per page in page order
pub trait PdfExtractor: Send + Sync {
    fn extract_pages(&self, filename: &str, data: &[u8]) -> Result<Vec<String>>;
}

/// PDF extraction backed by `lopdf`
#[derive(Debug, Default, Clone, Copy)]
pub struct LopdfExtractor;

impl PdfExtractor for LopdfExtractor {
    fn extract_pages(&self, filename: &str, data: &[u8]) -> Result<Vec<String>> {
        let doc = lopdf::Document::load_mem(data)
            .map_err(|e| Error::file_parse(filename, format!("Failed to load PDF: {}", e)))?;

        let pages = doc.get_pages();
        let mut texts = Vec::with_capacity(pages.len());
        for page_num in pages.keys() {
            match doc.extract_text(&[*page_num]) {
                Ok(text) => texts.push(text),
                Err(e) => {
                    tracing::debug!("Could not extract text from page {} of {}: {}", page_num, filename, e);
                    texts.push(String::new());
                }
            }
        }

        if texts.iter().all(|t| t.trim().is_empty()) {
            tracing::warn!("{} produced no text, PDF may be image-based or encrypted", filename);
        }

        Ok(texts)
    }
}
