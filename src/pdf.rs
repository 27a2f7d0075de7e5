//! PDF text extraction
//!
//! Extracts per-page text content from PDF files using lopdf. Pages keep
//! their index so downstream chunks stay traceable to their source page.

use crate::errors::IngestError;
use std::path::Path;
use tracing::{debug, warn};

/// Extracted text for a single page
#[derive(Debug, Clone)]
pub struct PageText {
    /// Zero-based page index within the document
    pub index: u32,
    /// Cleaned extracted text, empty when the page has no extractable text
    pub text: String,
}

/// Extract the ordered page texts of a PDF file
pub fn extract_pages(path: &Path) -> Result<Vec<PageText>, IngestError> {
    if !path.is_file() {
        return Err(IngestError::DocumentNotFound(path.display().to_string()));
    }

    let doc = lopdf::Document::load(path).map_err(|e| IngestError::PdfParse {
        path: path.display().to_string(),
        message: format!("Failed to load PDF: {}", e),
    })?;

    let page_ids: Vec<_> = doc.page_iter().collect();
    debug!(page_count = page_ids.len(), "Extracting text from PDF");

    let mut pages = Vec::with_capacity(page_ids.len());
    for (index, page_id) in page_ids.into_iter().enumerate() {
        let index = index as u32;
        let content = doc
            .get_page_content(page_id)
            .map_err(|e| IngestError::PdfParse {
                path: path.display().to_string(),
                message: format!("Failed to read page {} content: {}", index, e),
            })?;

        let raw = extract_text_from_content(&content);
        let text = clean_text(&raw);

        if text.is_empty() {
            warn!(page = index, "No extractable text on page");
        }

        pages.push(PageText { index, text });
    }

    debug!(page_count = pages.len(), "Text extraction complete");
    Ok(pages)
}

/// Extract text from a PDF content stream
fn extract_text_from_content(content: &[u8]) -> String {
    // Text lives between BT and ET operators
    let content_str = String::from_utf8_lossy(content);
    let mut text = String::new();
    let mut in_text_block = false;
    let mut current_text = String::new();

    for line in content_str.lines() {
        let trimmed = line.trim();

        if trimmed == "BT" {
            in_text_block = true;
            continue;
        }

        if trimmed == "ET" {
            in_text_block = false;
            if !current_text.is_empty() {
                text.push_str(&current_text);
                text.push(' ');
                current_text.clear();
            }
            continue;
        }

        if in_text_block {
            // Text showing operators: Tj, TJ, ', "
            if let Some(text_content) = extract_text_from_operator(trimmed) {
                current_text.push_str(&text_content);
                current_text.push(' ');
            }
        }
    }

    text
}

/// Extract text from a PDF text operator
fn extract_text_from_operator(line: &str) -> Option<String> {
    // Handle (text) Tj operator
    if line.ends_with("Tj") || line.ends_with('\'') || line.ends_with('"') {
        if let Some(start) = line.find('(') {
            if let Some(end) = line.rfind(')') {
                let text = &line[start + 1..end];
                return Some(decode_pdf_string(text));
            }
        }
    }

    // Handle [(text) num (text) num] TJ operator (array of text)
    if line.ends_with("TJ") {
        let mut result = String::new();
        let mut in_paren = false;
        let mut current = String::new();

        for ch in line.chars() {
            match ch {
                '(' => {
                    in_paren = true;
                }
                ')' => {
                    in_paren = false;
                    result.push_str(&decode_pdf_string(&current));
                    current.clear();
                }
                _ if in_paren => {
                    current.push(ch);
                }
                _ => {}
            }
        }

        if !result.is_empty() {
            return Some(result);
        }
    }

    None
}

/// Decode PDF string escapes
fn decode_pdf_string(s: &str) -> String {
    let mut result = String::new();
    let mut chars = s.chars();

    while let Some(ch) = chars.next() {
        if ch == '\\' {
            match chars.next() {
                Some('n') => result.push('\n'),
                Some('r') => result.push('\r'),
                Some('t') => result.push('\t'),
                Some('\\') => result.push('\\'),
                Some('(') => result.push('('),
                Some(')') => result.push(')'),
                Some(c) => result.push(c),
                None => {}
            }
        } else {
            result.push(ch);
        }
    }

    result
}

/// Clean extracted page text
fn clean_text(text: &str) -> String {
    text
        // Collapse runs of whitespace
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        // Remove BOM artifacts
        .replace('\u{FEFF}', "")
        // Normalize quotes
        .replace(['\u{201C}', '\u{201D}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'")
}
