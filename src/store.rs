//! Storage contract for bookmark sync records.
//!
//! Handlers depend only on the [`BookmarkStore`] capability, so the
//! backend can be swapped (in-memory for tests, libsql on disk in
//! production) without touching handler logic.

use std::collections::HashMap;
use std::future::Future;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::RwLock;

use crate::model::Bookmarks;

#[derive(Debug, Error)]
pub enum StoreError {
    /// No record exists under the given id, or the stored value failed
    /// the fully-populated check.
    #[error("bookmarks with given id has not been found")]
    NotFound,
    /// The caller's lastUpdated token no longer matches the stored
    /// value; the client must re-fetch before retrying.
    #[error("supplied lastUpdated does not match the stored value")]
    StaleVersion,
    #[error("storage backend failure: {0}")]
    Backend(#[source] anyhow::Error),
}

pub trait BookmarkStore: Send + Sync + 'static {
    /// Upserts the record under its id.
    fn put(&self, b: Bookmarks) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Retrieves the record stored under `id`.
    fn get(&self, id: &str) -> impl Future<Output = Result<Bookmarks, StoreError>> + Send;

    /// Compare-and-swap on the lastUpdated token: replaces the payload
    /// and stamps `now` only if `expected` exactly matches the stored
    /// timestamp. Returns the record as written.
    ///
    /// Implementations must make the read-compare-write atomic per id,
    /// otherwise two concurrent updates can both observe the same stale
    /// token and silently lose one write.
    fn swap_payload(
        &self,
        id: &str,
        expected: DateTime<Utc>,
        payload: String,
        now: DateTime<Utc>,
    ) -> impl Future<Output = Result<Bookmarks, StoreError>> + Send;
}

/// Non-durable [`BookmarkStore`] backed by a map. Used by the test
/// suite and suitable for ephemeral deployments.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<String, Bookmarks>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BookmarkStore for MemoryStore {
    async fn put(&self, b: Bookmarks) -> Result<(), StoreError> {
        self.records.write().await.insert(b.id.clone(), b);
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Bookmarks, StoreError> {
        let records = self.records.read().await;
        match records.get(id) {
            Some(b) if b.is_complete() => Ok(b.clone()),
            _ => Err(StoreError::NotFound),
        }
    }

    async fn swap_payload(
        &self,
        id: &str,
        expected: DateTime<Utc>,
        payload: String,
        now: DateTime<Utc>,
    ) -> Result<Bookmarks, StoreError> {
        // Single write-lock acquisition keeps the compare-and-swap atomic.
        let mut records = self.records.write().await;
        let existing = match records.get(id) {
            Some(b) if b.is_complete() => b,
            _ => return Err(StoreError::NotFound),
        };

        if existing.last_updated != expected {
            return Err(StoreError::StaleVersion);
        }

        let updated = Bookmarks {
            id: existing.id.clone(),
            bookmarks: payload,
            last_updated: now,
            version: existing.version.clone(),
        };
        records.insert(updated.id.clone(), updated.clone());
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn record(id: &str) -> Bookmarks {
        Bookmarks {
            id: id.to_string(),
            bookmarks: String::new(),
            last_updated: Utc::now(),
            version: "1.0.0".to_string(),
        }
    }

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let store = MemoryStore::new();
        let b = record("abc123");
        store.put(b.clone()).await.unwrap();

        let got = store.get("abc123").await.unwrap();
        assert_eq!(got, b);
    }

    #[tokio::test]
    async fn get_of_unknown_id_is_not_found() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.get("missing").await,
            Err(StoreError::NotFound)
        ));
    }

    #[tokio::test]
    async fn incomplete_record_reads_as_not_found() {
        let store = MemoryStore::new();
        let mut b = record("abc123");
        b.version = String::new();
        store.put(b).await.unwrap();

        assert!(matches!(
            store.get("abc123").await,
            Err(StoreError::NotFound)
        ));
    }

    #[tokio::test]
    async fn swap_with_matching_token_advances_timestamp() {
        let store = MemoryStore::new();
        let b = record("abc123");
        let t0 = b.last_updated;
        store.put(b).await.unwrap();

        let t1 = t0 + Duration::milliseconds(5);
        let updated = store
            .swap_payload("abc123", t0, "cipher".to_string(), t1)
            .await
            .unwrap();

        assert_eq!(updated.last_updated, t1);
        assert_eq!(updated.bookmarks, "cipher");
        assert_eq!(updated.version, "1.0.0");
        assert_eq!(store.get("abc123").await.unwrap(), updated);
    }

    #[tokio::test]
    async fn swap_with_stale_token_fails() {
        let store = MemoryStore::new();
        let b = record("abc123");
        let t0 = b.last_updated;
        store.put(b).await.unwrap();

        store
            .swap_payload("abc123", t0, "first".to_string(), Utc::now())
            .await
            .unwrap();

        // Replaying the original token must fail now that the
        // timestamp has advanced.
        let replay = store
            .swap_payload("abc123", t0, "second".to_string(), Utc::now())
            .await;
        assert!(matches!(replay, Err(StoreError::StaleVersion)));
        assert_eq!(store.get("abc123").await.unwrap().bookmarks, "first");
    }

    #[tokio::test]
    async fn swap_on_unknown_id_is_not_found() {
        let store = MemoryStore::new();
        let swap = store
            .swap_payload("missing", Utc::now(), String::new(), Utc::now())
            .await;
        assert!(matches!(swap, Err(StoreError::NotFound)));
    }
}
