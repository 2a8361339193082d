//! Page Text Extractors
//!
//! This module provides the extraction layer that turns document bytes into
//! per-page positioned text fragments for the reconstruction pipeline.
//!
//! ## Architecture
//!
//! ```text
//! Document bytes (PDF, fragment dump)
//!     ↓
//! [Format-specific Extractor]
//!     ↓
//! ExtractedDocument → ExtractedPage → (Viewport, TextContent)
//!     ↓
//! [Reconstruction pipeline]
//!     ↓
//! Words, Lines, Compact lines
//! ```
//!
//! ## Available Extractors
//!
//! - `JsonFragmentExtractor` - pre-extracted text-content dumps (always available)
//! - `LopdfExtractor` - PDF documents via lopdf (feature `lopdf-backend`)

pub mod json;
#[cfg(feature = "lopdf-backend")]
pub mod pdf;
pub mod traits;

use crate::error::ExtractResult;
use std::path::Path;

pub use json::{FragmentDump, JsonFragmentExtractor};
#[cfg(feature = "lopdf-backend")]
pub use pdf::LopdfExtractor;
pub use traits::{ExtractedDocument, ExtractedPage, OpenOptions, PageTextExtractor};

/// Extractor enum for runtime backend selection
pub enum ExtractorImpl {
    Json(JsonFragmentExtractor),
    #[cfg(feature = "lopdf-backend")]
    Lopdf(LopdfExtractor),
}

impl ExtractorImpl {
    /// Pick the compiled-in extractor that claims the file's extension
    pub fn for_path(path: &Path) -> Option<Self> {
        let json = JsonFragmentExtractor::new();
        if json.supports_file_type(path) {
            return Some(ExtractorImpl::Json(json));
        }

        #[cfg(feature = "lopdf-backend")]
        {
            let pdf = LopdfExtractor::new();
            if pdf.supports_file_type(path) {
                return Some(ExtractorImpl::Lopdf(pdf));
            }
        }

        None
    }
}

impl PageTextExtractor for ExtractorImpl {
    fn open(&self, bytes: &[u8], options: &OpenOptions) -> ExtractResult<Box<dyn ExtractedDocument>> {
        match self {
            ExtractorImpl::Json(extractor) => extractor.open(bytes, options),
            #[cfg(feature = "lopdf-backend")]
            ExtractorImpl::Lopdf(extractor) => extractor.open(bytes, options),
        }
    }

    fn name(&self) -> &str {
        match self {
            ExtractorImpl::Json(extractor) => extractor.name(),
            #[cfg(feature = "lopdf-backend")]
            ExtractorImpl::Lopdf(extractor) => extractor.name(),
        }
    }

    fn supports_file_type(&self, path: &Path) -> bool {
        match self {
            ExtractorImpl::Json(extractor) => extractor.supports_file_type(path),
            #[cfg(feature = "lopdf-backend")]
            ExtractorImpl::Lopdf(extractor) => extractor.supports_file_type(path),
        }
    }
}
