use crate::cache::{TextsCacheKey, TextsCacheValue};
use anyhow::{anyhow, Result};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

/// Storage abstraction for caching extracted page texts
pub trait TextsStorage {
    fn get_texts(&self, cache_key: &TextsCacheKey) -> Result<Option<TextsCacheValue>>;
    fn store_texts(&self, cache_key: &TextsCacheKey, cache_value: &TextsCacheValue) -> Result<()>;
}

/// File-based storage implementation using local cache directory
pub struct FileStorage {
    cache_dir: PathBuf,
}

impl FileStorage {
    pub fn new(cache_dir: impl AsRef<Path>) -> Result<Self> {
        let cache_dir = cache_dir.as_ref().to_path_buf();
        // Ensure cache directory exists
        fs::create_dir_all(cache_dir.join("texts"))?;

        Ok(Self { cache_dir })
    }

    /// `<user cache dir>/pagelines`, falling back to `./cache`
    pub fn default_dir() -> PathBuf {
        dirs::cache_dir()
            .map(|dir| dir.join("pagelines"))
            .unwrap_or_else(|| PathBuf::from("cache"))
    }

    fn texts_path(&self, cache_key: &TextsCacheKey) -> PathBuf {
        self.cache_dir
            .join("texts")
            .join(format!("{}.json", cache_key.to_cache_hash()))
    }
}

impl TextsStorage for FileStorage {
    fn get_texts(&self, cache_key: &TextsCacheKey) -> Result<Option<TextsCacheValue>> {
        let path = self.texts_path(cache_key);
        if path.exists() {
            let json_str = fs::read_to_string(path)?;
            let cache_value: TextsCacheValue = serde_json::from_str(&json_str)
                .map_err(|e| anyhow!("Failed to deserialize cached TextsCacheValue: {}", e))?;
            Ok(Some(cache_value))
        } else {
            Ok(None)
        }
    }

    fn store_texts(&self, cache_key: &TextsCacheKey, cache_value: &TextsCacheValue) -> Result<()> {
        let path = self.texts_path(cache_key);
        let json_str = serde_json::to_string(cache_value)
            .map_err(|e| anyhow!("Failed to serialize TextsCacheValue: {}", e))?;
        fs::write(path, json_str)?;
        Ok(())
    }
}

/// No-op storage implementation that disables all caching
#[derive(Debug, Default)]
pub struct NoOpStorage;

impl NoOpStorage {
    pub fn new() -> Self {
        Self
    }
}

impl TextsStorage for NoOpStorage {
    fn get_texts(&self, _cache_key: &TextsCacheKey) -> Result<Option<TextsCacheValue>> {
        Ok(None) // Always cache miss
    }

    fn store_texts(&self, _cache_key: &TextsCacheKey, _cache_value: &TextsCacheValue) -> Result<()> {
        Ok(())
    }
}

/// Calculate hash over the full document content
pub fn calculate_document_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Calculate hash for configuration data
pub fn calculate_config_hash<T: serde::Serialize>(config: &T) -> Result<String> {
    let config_json = serde_json::to_string(config)
        .map_err(|e| anyhow!("Failed to serialize config for hashing: {}", e))?;

    let mut hasher = Sha256::new();
    hasher.update(config_json.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagelines_core::{PageText, PageTexts, ReaderConfig};

    fn sample_key() -> TextsCacheKey {
        let config_hash = calculate_config_hash(&ReaderConfig::default()).unwrap();
        TextsCacheKey::new(calculate_document_hash(b"%PDF-1.7 sample"), "LopdfExtractor", config_hash)
    }

    #[test]
    fn test_document_hash_consistency() {
        let data = b"test pdf content with some data";
        assert_eq!(calculate_document_hash(data), calculate_document_hash(data));
    }

    #[test]
    fn test_document_hash_uniqueness() {
        assert_ne!(
            calculate_document_hash(b"test pdf content 1"),
            calculate_document_hash(b"test pdf content 2")
        );
    }

    #[test]
    fn test_document_hash_sees_middle_of_large_files() {
        let mut a = vec![b'x'; 4096];
        let mut b = a.clone();
        a[2048] = b'a';
        b[2048] = b'b';
        assert_ne!(calculate_document_hash(&a), calculate_document_hash(&b));
    }

    #[test]
    fn test_config_hash_changes_with_config() {
        let default = calculate_config_hash(&ReaderConfig::default()).unwrap();
        let raw = calculate_config_hash(&ReaderConfig {
            raw: true,
            ..ReaderConfig::default()
        })
        .unwrap();
        assert_ne!(default, raw);
    }

    #[test]
    fn test_file_storage_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(temp_dir.path()).unwrap();
        let key = sample_key();

        assert!(storage.get_texts(&key).unwrap().is_none());

        let mut texts = PageTexts::new();
        texts.insert(1, PageText::default());
        storage.store_texts(&key, &TextsCacheValue::new(texts.clone(), 12)).unwrap();

        let cached = storage.get_texts(&key).unwrap().unwrap();
        assert_eq!(cached.texts, texts);
        assert_eq!(cached.processing_time_ms, 12);
        assert!(temp_dir.path().join("texts").join(format!("{}.json", key.to_cache_hash())).exists());
    }

    #[test]
    fn test_corrupt_entry_is_an_error() {
        let temp_dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(temp_dir.path()).unwrap();
        let key = sample_key();
        fs::write(storage.texts_path(&key), "not json").unwrap();

        assert!(storage.get_texts(&key).is_err());
    }

    #[test]
    fn test_noop_storage_always_misses() {
        let storage = NoOpStorage::new();
        let key = sample_key();
        storage.store_texts(&key, &TextsCacheValue::new(PageTexts::new(), 0)).unwrap();
        assert!(storage.get_texts(&key).unwrap().is_none());
    }
}
