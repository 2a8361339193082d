// Page text extractor abstraction
//
// This module defines the boundary between document parsing (bytes -> positioned
// fragments) and layout reconstruction (fragments -> words and lines). Everything
// after this point works with Fragments and is format-agnostic.

use crate::error::ExtractResult;
use crate::types::{TextContent, Viewport};
use std::path::Path;

/// Options forwarded to the extractor when a document is opened
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenOptions {
    /// Emit extractor diagnostics (undecodable fonts, skipped operators, ...)
    pub verbose: bool,
}

/// Page text extractor - opens documents and hands out pages
///
/// Extractors handle:
/// - Document format parsing (PDF, pre-extracted dumps, ...)
/// - Text run decoding and positioning
/// - Page geometry (viewport)
pub trait PageTextExtractor: Send + Sync {
    /// Open a document from raw bytes.
    ///
    /// Fails with `ExtractError::DocumentOpen` on malformed input.
    fn open(&self, bytes: &[u8], options: &OpenOptions) -> ExtractResult<Box<dyn ExtractedDocument>>;

    /// Convenience method: open from file path
    fn open_file(&self, path: &Path, options: &OpenOptions) -> ExtractResult<Box<dyn ExtractedDocument>> {
        let bytes = std::fs::read(path)?;
        self.open(&bytes, options)
    }

    /// Extractor name for logging
    fn name(&self) -> &str;

    /// Check if extractor supports the given file type
    fn supports_file_type(&self, path: &Path) -> bool;
}

/// An opened document
pub trait ExtractedDocument {
    fn page_count(&self) -> u32;

    /// Get a page by 1-based index.
    ///
    /// Fails with `ExtractError::PageIndex` when out of range.
    fn page(&self, page_num: u32) -> ExtractResult<Box<dyn ExtractedPage + '_>>;
}

pub trait ExtractedPage {
    /// Page geometry at scale 1
    fn viewport(&self) -> Viewport;

    /// Raw fragments in extraction order
    fn text_content(&self) -> ExtractResult<TextContent>;
}

/// Shared range check for 1-based page lookups
pub(crate) fn check_page_index(page_num: u32, page_count: u32) -> ExtractResult<()> {
    if page_num == 0 || page_num > page_count {
        return Err(crate::error::ExtractError::PageIndex {
            page: page_num,
            page_count,
        });
    }
    Ok(())
}

pub(crate) fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| extensions.iter().any(|ext| e.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}
