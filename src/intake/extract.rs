// src/intake/extract.rs
// Bounded payload extraction from staged uploads

use std::path::Path;

use tracing::debug;

use crate::{BanterError, Result};

/// Upper bound on extracted text handed to a capability
pub const MAX_PAYLOAD_CHARS: usize = 2000;

/// Page cap for the fallback PDF extraction path
pub const FALLBACK_PAGE_LIMIT: usize = 5;

/// Truncate to at most `limit` characters, respecting char boundaries
pub fn truncate_chars(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Extract PDF text: full-document extraction first, then a fallback
/// bounded to the first pages. The result is trimmed and capped at
/// MAX_PAYLOAD_CHARS.
pub fn pdf_text(path: &Path) -> Result<String> {
    let raw = match pdf_extract::extract_text(path) {
        Ok(text) => text,
        Err(primary) => {
            debug!(error = %primary, "full PDF extraction failed, trying page-bounded fallback");
            first_pages_text(path, FALLBACK_PAGE_LIMIT)?
        }
    };
    Ok(truncate_chars(raw.trim(), MAX_PAYLOAD_CHARS).to_string())
}

/// Page-bounded extraction via lopdf
fn first_pages_text(path: &Path, page_limit: usize) -> Result<String> {
    let doc = lopdf::Document::load(path).map_err(|e| BanterError::Pdf(e.to_string()))?;
    let pages: Vec<u32> = doc.get_pages().keys().take(page_limit).copied().collect();
    doc.extract_text(&pages)
        .map_err(|e| BanterError::Pdf(e.to_string()))
}

/// Read a text upload, capped at MAX_PAYLOAD_CHARS
pub async fn text_payload(path: &Path) -> Result<String> {
    let raw = tokio::fs::read_to_string(path).await?;
    Ok(truncate_chars(&raw, MAX_PAYLOAD_CHARS).to_string())
}
