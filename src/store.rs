use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::models::UrlRecord;

// ── Errors ─────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

// ── Contract ───────────────────────────────────────────────────────────────

/// Whole-collection persistence for URL records.
///
/// `load` returns the full record set (empty if nothing has been persisted
/// yet) and `save` replaces it wholesale. There are no per-key operations
/// and no schema version field — format changes are breaking.
#[async_trait]
pub trait UrlStore: Send + Sync + 'static {
    async fn load(&self) -> Result<Vec<UrlRecord>, StoreError>;
    async fn save(&self, records: &[UrlRecord]) -> Result<(), StoreError>;
}

// ── JSON file store ────────────────────────────────────────────────────────

/// Stores the collection as a single JSON document on disk.
///
/// The file is the one "named slot" of the storage model: every save
/// rewrites it completely. Durability is whatever the filesystem provides.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl UrlStore for JsonFileStore {
    async fn load(&self) -> Result<Vec<UrlRecord>, StoreError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            // Nothing persisted yet
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn save(&self, records: &[UrlRecord]) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(records)?;
        tokio::fs::write(&self.path, json).await?;
        Ok(())
    }
}

// ── In-memory store ────────────────────────────────────────────────────────

/// Ephemeral store backed by a `Vec`, for tests and throwaway runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<Vec<UrlRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UrlStore for MemoryStore {
    async fn load(&self) -> Result<Vec<UrlRecord>, StoreError> {
        Ok(self.records.read().await.clone())
    }

    async fn save(&self, records: &[UrlRecord]) -> Result<(), StoreError> {
        *self.records.write().await = records.to_vec();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    fn sample_record(code: &str) -> UrlRecord {
        let created = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        UrlRecord {
            id: Uuid::nil(),
            long_url: "https://example.com".into(),
            short_code: code.into(),
            short_url: format!("http://localhost:3000/{code}"),
            created_at: created,
            expiry_date: created + chrono::Duration::minutes(30),
            clicks: 0,
            click_data: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_file_store_missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("links.json"));

        let records = store.load().await.unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("links.json"));

        store
            .save(&[sample_record("abc123"), sample_record("xyz789")])
            .await
            .unwrap();

        let records = store.load().await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].short_code, "abc123");
        assert_eq!(records[1].short_code, "xyz789");
    }

    #[tokio::test]
    async fn test_file_store_save_replaces_collection() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("links.json"));

        store.save(&[sample_record("abc123")]).await.unwrap();
        store.save(&[sample_record("xyz789")]).await.unwrap();

        let records = store.load().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].short_code, "xyz789");
    }

    #[tokio::test]
    async fn test_file_store_corrupt_document_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("links.json");
        tokio::fs::write(&path, b"not json").await.unwrap();

        let store = JsonFileStore::new(&path);
        assert!(matches!(store.load().await, Err(StoreError::Serde(_))));
    }

    #[tokio::test]
    async fn test_memory_store_round_trip() {
        let store = MemoryStore::new();
        assert!(store.load().await.unwrap().is_empty());

        store.save(&[sample_record("abc123")]).await.unwrap();
        let records = store.load().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].short_code, "abc123");
    }
}
