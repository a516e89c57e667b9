//! Blob and document store doubles.

use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use syncbridge::{
    blob::{BlobStore, ProgressFn, Transfer},
    document::{RoomDocument, RoomPatch, Snapshot, WriteMode},
    error::{BlobError, BlobResult, StoreError, StoreResult},
    room::RoomCode,
    store::{DocumentStore, MemoryDocumentStore, Subscription},
};

/// Blobs in a map, addressed as `mem://{path}`. Uploads of names containing
/// `fail_on` are rejected.
#[allow(dead_code)]
#[derive(Default)]
pub struct MemoryBlobStore {
    pub blobs: DashMap<String, Bytes>,
    pub deleted: Mutex<Vec<String>>,
    pub fail_on: Option<String>,
}

#[allow(dead_code)]
impl MemoryBlobStore {
    pub fn failing_on(name: &str) -> Self {
        Self {
            fail_on: Some(name.to_owned()),
            ..Default::default()
        }
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn upload(&self, path: &str, data: Bytes, progress: ProgressFn) -> BlobResult<String> {
        if self.fail_on.as_deref().is_some_and(|name| path.contains(name)) {
            return Err(BlobError::Rejected(500));
        }
        let total_bytes = data.len() as u64;
        progress(Transfer { bytes_transferred: total_bytes / 2, total_bytes });
        progress(Transfer { bytes_transferred: total_bytes, total_bytes });
        self.blobs.insert(path.to_owned(), data);
        Ok(format!("mem://{path}"))
    }

    async fn delete(&self, path: &str) -> BlobResult<()> {
        self.deleted.lock().unwrap().push(path.to_owned());
        self.blobs
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| BlobError::NotFound(path.to_owned()))
    }

    async fn fetch(&self, url: &str) -> BlobResult<Bytes> {
        let path = url.strip_prefix("mem://").unwrap_or(url);
        self.blobs
            .get(path)
            .map(|data| data.clone())
            .ok_or_else(|| BlobError::NotFound(path.to_owned()))
    }
}

/// Reads like a memory store, refuses every write.
#[allow(dead_code)]
#[derive(Default)]
pub struct ReadOnlyDocumentStore {
    pub inner: MemoryDocumentStore,
}

#[async_trait]
impl DocumentStore for ReadOnlyDocumentStore {
    async fn subscribe(&self, room: &RoomCode) -> StoreResult<Subscription> {
        self.inner.subscribe(room).await
    }

    async fn get(&self, room: &RoomCode) -> StoreResult<Snapshot> {
        self.inner.get(room).await
    }

    async fn write(
        &self,
        _room: &RoomCode,
        _mode: WriteMode,
        _patch: RoomPatch,
    ) -> StoreResult<RoomDocument> {
        Err(StoreError::Offline)
    }
}
