use crate::error::{Result, TransdocError};

/// Extract the raw text layer of a PDF
pub fn extract_text(bytes: &[u8]) -> Result<String> {
    pdf_extract::extract_text_from_mem(bytes)
        .map_err(|e| TransdocError::Extraction(format!("PDF text extraction failed: {}", e)))
}
