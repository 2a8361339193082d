use thiserror::Error;

/// Failures raised by page text extractors.
///
/// The reconstruction pipeline never recovers from these; they reach the
/// caller unchanged.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// Input bytes are malformed or not a format the extractor understands
    #[error("failed to open document: {0}")]
    DocumentOpen(String),

    #[error("page {page} out of range (document has {page_count} pages)")]
    PageIndex { page: u32, page_count: u32 },

    /// Page exists but its text content could not be read
    #[error("failed to read text of page {page}: {reason}")]
    PageContent { page: u32, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type ExtractResult<T> = std::result::Result<T, ExtractError>;
