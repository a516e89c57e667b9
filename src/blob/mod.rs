//! Blob stores holding uploaded files.

pub mod fs;
pub mod http;

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::BlobResult;

pub use fs::FsBlobStore;
pub use http::HttpBlobStore;

/// Chunk size uploads are streamed and reported in (64 KiB).
pub const CHUNK_SIZE: usize = 64 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transfer {
    pub bytes_transferred: u64,
    pub total_bytes: u64,
}

impl Transfer {
    pub fn percent(&self) -> f64 {
        if self.total_bytes == 0 {
            return 100.0;
        }
        self.bytes_transferred as f64 / self.total_bytes as f64 * 100.0
    }
}

pub type ProgressFn = Arc<dyn Fn(Transfer) + Send + Sync>;

pub fn no_progress() -> ProgressFn {
    Arc::new(|_| {})
}

#[async_trait]
pub trait BlobStore: Send + Sync + 'static {
    /// Stores `data` under `path`, reporting progress per chunk, and returns a durable
    /// retrieval URL. `path` stays the handle for `delete`.
    async fn upload(&self, path: &str, data: Bytes, progress: ProgressFn) -> BlobResult<String>;

    async fn delete(&self, path: &str) -> BlobResult<()>;

    async fn fetch(&self, url: &str) -> BlobResult<Bytes>;
}
