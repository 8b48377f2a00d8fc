// src/pdf_extract.rs

use crate::error::SourceError;
use lopdf::{Document, Object, ObjectId};
use std::path::Path;
use tracing::{debug, info};

/// What a page's resource dictionary says it draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PageKind {
    /// Has fonts, so it carries a text layer.
    Text,
    /// Draws images and has no fonts: a photographed or scanned sheet.
    ImageOnly,
    /// No own resources (possibly inherited from the page tree).
    Unknown,
}

fn page_kind(doc: &Document, page_id: ObjectId) -> PageKind {
    let resources = doc
        .get_object(page_id)
        .and_then(Object::as_dict)
        .ok()
        .and_then(|page| page.get(b"Resources").ok())
        .and_then(|r| doc.dereference(r).ok())
        .and_then(|(_, resolved)| resolved.as_dict().ok());

    let has = |key: &[u8]| {
        resources
            .and_then(|res| res.get(key).ok())
            .and_then(|o| doc.dereference(o).ok())
            .and_then(|(_, resolved)| resolved.as_dict().ok())
            .is_some_and(|d| !d.is_empty())
    };

    match (has(b"Font"), has(b"XObject")) {
        (true, _) => PageKind::Text,
        (false, true) => PageKind::ImageOnly,
        (false, false) => PageKind::Unknown,
    }
}

/// Stock, supply and capacity sheets are printed reports: one page with
/// fonts is enough to try text extraction. Only a document with image
/// pages and no font anywhere is taken as a scan.
fn is_scanned(kinds: &[PageKind]) -> bool {
    !kinds.contains(&PageKind::Text) && kinds.contains(&PageKind::ImageOnly)
}

/// Text of an in-memory PDF. `path` only labels errors.
fn pdf_text(path: &Path, bytes: &[u8]) -> Result<String, SourceError> {
    let pdf_error = |reason: String| SourceError::Pdf {
        path: path.to_path_buf(),
        reason,
    };

    let doc = Document::load_mem(bytes).map_err(|e| pdf_error(e.to_string()))?;
    let kinds: Vec<PageKind> = doc
        .get_pages()
        .values()
        .map(|&id| page_kind(&doc, id))
        .collect();
    info!(
        pages = kinds.len(),
        text_pages = kinds.iter().filter(|k| **k == PageKind::Text).count(),
        image_pages = kinds.iter().filter(|k| **k == PageKind::ImageOnly).count(),
        "PDF pages classified"
    );
    if is_scanned(&kinds) {
        return Err(SourceError::ScannedPdf(path.to_path_buf()));
    }

    let text = pdf_extract::extract_text_from_mem(bytes).map_err(|e| pdf_error(e.to_string()))?;
    if text.split_whitespace().next().is_none() {
        // fonts declared but nothing drawn with them
        return Err(SourceError::ScannedPdf(path.to_path_buf()));
    }
    debug!(chars = text.len(), "PDF text extracted");
    Ok(text)
}

/// Read a PDF from disk and return its text layer.
pub fn read_pdf_text(path: &Path) -> Result<String, SourceError> {
    let bytes = std::fs::read(path).map_err(|source| SourceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), pdf_bytes = bytes.len(), "Loaded PDF");
    pdf_text(path, &bytes)
}
