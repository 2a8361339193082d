use crate::storage::{calculate_config_hash, calculate_document_hash, TextsStorage};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use pagelines_core::{PageTexts, PdfTextReader};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Version constants for cache invalidation
pub mod versions {
    pub const PAGELINES_VERSION: &str = env!("CARGO_PKG_VERSION");
    /// Bump when reconstruction output changes for the same input and config
    pub const PROCESSING_VERSION: &str = "1.0.0";
}

/// Cache key for extracted page texts (document + extractor + config)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct TextsCacheKey {
    pub document_hash: String,
    pub extractor: String,
    pub config_hash: String,
    pub pagelines_version: String,
    pub processing_version: String,
}

impl TextsCacheKey {
    pub fn new(document_hash: String, extractor: &str, config_hash: String) -> Self {
        Self {
            document_hash,
            extractor: extractor.to_string(),
            config_hash,
            pagelines_version: versions::PAGELINES_VERSION.to_string(),
            processing_version: versions::PROCESSING_VERSION.to_string(),
        }
    }

    /// Compute cache key hash for storage
    pub fn to_cache_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(&self.document_hash);
        hasher.update(&self.extractor);
        hasher.update(&self.config_hash);
        hasher.update(&self.pagelines_version);
        hasher.update(&self.processing_version);
        format!("{:x}", hasher.finalize())
    }
}

/// Cached page texts with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextsCacheValue {
    pub texts: PageTexts,
    pub created_at: DateTime<Utc>,
    pub processing_time_ms: u64,
    pub cache_version: String,
}

impl TextsCacheValue {
    pub fn new(texts: PageTexts, processing_time_ms: u64) -> Self {
        Self {
            texts,
            created_at: Utc::now(),
            processing_time_ms,
            cache_version: versions::PAGELINES_VERSION.to_string(),
        }
    }
}

/// Extract page texts, going through the cache when it has an entry
pub fn extract_texts_cached(reader: &PdfTextReader, path: &Path, storage: &dyn TextsStorage) -> Result<PageTexts> {
    let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;

    let cache_key = TextsCacheKey::new(
        calculate_document_hash(&bytes),
        reader.extractor_name(),
        calculate_config_hash(reader.config())?,
    );

    match storage.get_texts(&cache_key) {
        Ok(Some(cached)) => {
            info!(
                created_at = %cached.created_at.to_rfc3339(),
                processing_time_ms = cached.processing_time_ms,
                "Using cached page texts"
            );
            return Ok(cached.texts);
        }
        Ok(None) => debug!(key = %cache_key.to_cache_hash(), "Cache miss"),
        Err(e) => warn!("Ignoring unreadable cache entry: {:#}", e),
    }

    let start = Instant::now();
    let doc = reader.open(&bytes)?;
    let texts = reader.get_texts(doc.as_ref())?;
    let processing_time_ms = start.elapsed().as_millis() as u64;

    if let Err(e) = storage.store_texts(&cache_key, &TextsCacheValue::new(texts.clone(), processing_time_ms)) {
        warn!("Failed to cache page texts: {:#}", e);
    }

    Ok(texts)
}
