//! Shared file list of a room: upload, list, download, delete, clear.

pub mod naming;
pub mod progress;

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use bytes::Bytes;
use futures_util::future::join_all;
use tokio::{sync::watch, task::JoinHandle};
use tracing::{debug, warn};

use crate::{
    blob::{BlobStore, Transfer},
    document::{ClientId, FileDescriptor, RoomPatch, Snapshot},
    error::{FileError, StoreError},
    now_millis,
    notice::Notices,
    room::RoomCode,
    store::DocumentStore,
};

pub use progress::{UploadId, UploadProgress, UploadTracker};

/// A file picked for upload.
#[derive(Debug, Clone)]
pub struct LocalFile {
    pub name: String,
    pub mime_type: String,
    pub data: Bytes,
}

impl LocalFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    Saved(PathBuf),
    /// Fetching failed; hand the retrieval URL to something that can open it.
    OpenUrl(String),
}

/// Detached best-effort deletion of a blob. Nobody has to wait for it.
pub struct BlobCleanup(JoinHandle<()>);

impl BlobCleanup {
    pub async fn finished(self) {
        let _ = self.0.await;
    }
}

fn spawn_blob_delete(blobs: Arc<dyn BlobStore>, path: String) -> BlobCleanup {
    BlobCleanup(tokio::spawn(async move {
        match blobs.delete(&path).await {
            Ok(()) => debug!("deleted blob {path}"),
            Err(e) => warn!("could not delete blob {path}: {e}"),
        }
    }))
}

pub struct FileChannel {
    room: RoomCode,
    me: ClientId,
    docs: Arc<dyn DocumentStore>,
    blobs: Arc<dyn BlobStore>,
    uploads: UploadTracker,
    notices: Notices,
    max_file_bytes: u64,
    files: watch::Sender<Vec<FileDescriptor>>,
}

impl FileChannel {
    pub fn new(
        room: RoomCode,
        me: ClientId,
        docs: Arc<dyn DocumentStore>,
        blobs: Arc<dyn BlobStore>,
        notices: Notices,
        max_file_bytes: u64,
    ) -> Self {
        Self {
            room,
            me,
            docs,
            blobs,
            uploads: UploadTracker::new(),
            notices,
            max_file_bytes,
            files: watch::Sender::new(Vec::new()),
        }
    }

    pub fn uploads(&self) -> &UploadTracker {
        &self.uploads
    }

    pub fn files(&self) -> Vec<FileDescriptor> {
        self.files.borrow().clone()
    }

    pub fn watch_files(&self) -> watch::Receiver<Vec<FileDescriptor>> {
        self.files.subscribe()
    }

    pub fn apply_snapshot(&self, snapshot: &Snapshot) {
        let listed = snapshot.as_ref().map(|doc| doc.files.clone()).unwrap_or_default();
        self.files.send_if_modified(|files| {
            let changed = *files != listed;
            *files = listed;
            changed
        });
    }

    pub fn validate(&self, file: &LocalFile) -> Result<(), FileError> {
        if file.size() > self.max_file_bytes {
            return Err(FileError::TooLarge {
                name: file.name.clone(),
                size: file.size(),
                limit: self.max_file_bytes,
            });
        }
        Ok(())
    }

    /// Uploads a batch concurrently. Each file succeeds or fails on its own.
    pub async fn upload_all(&self, files: Vec<LocalFile>) -> Vec<Result<FileDescriptor, FileError>> {
        join_all(files.into_iter().map(|file| self.upload(file))).await
    }

    pub async fn upload(&self, file: LocalFile) -> Result<FileDescriptor, FileError> {
        if let Err(e) = self.validate(&file) {
            let limit_mb = self.max_file_bytes / (1024 * 1024);
            self.notices
                .error(format!("{} is too large (Max {limit_mb} MB)", file.name));
            return Err(e);
        }

        let storage_path = self
            .room
            .blob_path(&naming::storage_key(&file.name, naming::monotonic_millis()));
        let id = self.uploads.start(&file.name);
        let tracker = self.uploads.clone();
        let progress = Arc::new(move |t: Transfer| tracker.report(id, t.percent()));

        let url = match self.blobs.upload(&storage_path, file.data.clone(), progress).await {
            Ok(url) => url,
            Err(source) => {
                self.uploads.finish(id);
                self.notices.error(format!("Failed to upload {}", file.name));
                return Err(FileError::Upload { name: file.name, source });
            }
        };

        let descriptor = FileDescriptor {
            name: file.name.clone(),
            mime_type: file.mime_type,
            url,
            storage_path,
            size: file.data.len() as u64,
            uploaded_at: now_millis(),
        };
        let committed = self.register(descriptor.clone()).await;
        self.uploads.finish(id);

        match committed {
            Ok(()) => {
                self.notices.success(format!("{} uploaded!", file.name));
                Ok(descriptor)
            }
            Err(source) => {
                // the blob is unreachable without its descriptor
                spawn_blob_delete(self.blobs.clone(), descriptor.storage_path);
                self.notices.error(format!("Failed to upload {}", file.name));
                Err(FileError::Commit { name: file.name, source })
            }
        }
    }

    /// Appends to an existing room, falling back to a write that creates it.
    async fn register(&self, descriptor: FileDescriptor) -> Result<(), StoreError> {
        let patch = RoomPatch::append_file(descriptor).sender(self.me);
        match self.docs.update(&self.room, patch.clone()).await {
            Ok(_) => Ok(()),
            Err(e) => {
                debug!("append to room {} failed ({e}), creating it", self.room);
                self.docs.merge_write(&self.room, patch).await.map(|_| ())
            }
        }
    }

    /// Saves the file under its original name in `dir`, or returns its URL to open.
    pub async fn download(&self, file: &FileDescriptor, dir: &Path) -> DownloadOutcome {
        self.notices.success("Starting download...");
        let file_name = Path::new(&file.name)
            .file_name()
            .map(|name| name.to_owned())
            .unwrap_or_else(|| naming::sanitize(&file.name).into());
        let target = dir.join(file_name);

        let saved = match self.blobs.fetch(&file.url).await {
            Ok(data) => tokio::fs::write(&target, data).await.map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };
        match saved {
            Ok(()) => DownloadOutcome::Saved(target),
            Err(e) => {
                debug!("direct download of {} failed ({e}), opening url", file.name);
                DownloadOutcome::OpenUrl(file.url.clone())
            }
        }
    }

    /// Removes `file` from the room once `confirm` agrees. The document is authoritative;
    /// the blob goes in the background.
    pub async fn delete(
        &self,
        file: &FileDescriptor,
        confirm: impl FnOnce(&str) -> bool,
    ) -> Result<Option<BlobCleanup>, FileError> {
        if !confirm(&format!("Delete {}?", file.name)) {
            return Ok(None);
        }

        let patch = RoomPatch::remove_file(file.clone()).sender(self.me);
        if let Err(source) = self.docs.update(&self.room, patch).await {
            self.notices.error("Could not delete file");
            return Err(FileError::Remove { name: file.name.clone(), source });
        }
        let cleanup = spawn_blob_delete(self.blobs.clone(), file.storage_path.clone());
        self.notices.success("File deleted");
        Ok(Some(cleanup))
    }

    /// Empties text and files in one replace. Blobs of cleared files stay in the blob
    /// store.
    pub async fn clear(&self, confirm: impl FnOnce(&str) -> bool) -> Result<bool, FileError> {
        if !confirm("Clear text and ALL files?") {
            return Ok(false);
        }
        self.docs
            .replace_write(&self.room, RoomPatch::cleared().sender(self.me))
            .await
            .map_err(FileError::Clear)?;
        self.notices.success("Room cleared");
        Ok(true)
    }
}
