// Pagelines Core Library
//
// Rebuilds reading-ordered words, lines and compact lines from the positioned
// text fragments a page text extractor produces, and flags documents that
// look scanned.

pub mod config;
pub mod error;
pub mod extractors;
pub mod geometry;
pub mod pipeline;
pub mod reader;
pub mod types;

// Re-export main types and functions for easy use
pub use config::{CompactLineAlgorithm, ReaderConfig, ScannedThreshold, SortAlgorithm};
pub use error::{ExtractError, ExtractResult};
pub use extractors::{ExtractedDocument, ExtractedPage, ExtractorImpl, JsonFragmentExtractor, OpenOptions, PageTextExtractor};
pub use pipeline::DebugConfig;
pub use reader::{reconstruct_page, PdfTextReader};
pub use types::*;

// Re-export backends for direct use
#[cfg(feature = "lopdf-backend")]
pub use extractors::LopdfExtractor;
