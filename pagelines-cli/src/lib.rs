// All reconstruction lives in pagelines-core
// This CLI adds backend selection, on-disk caching and JSON output

// CLI-specific modules
pub mod cache;
pub mod storage;

// Re-export core types for convenience
pub use pagelines_core::*;

// Re-export CLI utilities
pub use cache::{extract_texts_cached, TextsCacheKey, TextsCacheValue};
pub use storage::{FileStorage, NoOpStorage, TextsStorage};
