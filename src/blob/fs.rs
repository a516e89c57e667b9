use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::{fs, io::AsyncWriteExt};
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::error::{BlobError, BlobResult};

use super::{BlobStore, CHUNK_SIZE, ProgressFn, Transfer};

/// Blobs kept under a local directory and served from `{public_base}/blobs/{path}`.
pub struct FsBlobStore {
    root: PathBuf,
    public_base: String,
}

impl FsBlobStore {
    pub async fn new(root: impl AsRef<Path>, public_base: &str) -> BlobResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).await?;
        Ok(Self {
            root,
            public_base: public_base.trim_end_matches('/').to_owned(),
        })
    }

    pub fn url_for(&self, path: &str) -> String {
        format!("{}/blobs/{path}", self.public_base)
    }

    fn key_path(&self, key: &str) -> BlobResult<PathBuf> {
        if key.is_empty() || key.starts_with('/') || key.starts_with('\\') {
            return Err(BlobError::InvalidPath(key.to_owned()));
        }
        for component in Path::new(key).components() {
            let Component::Normal(_) = component else {
                return Err(BlobError::InvalidPath(key.to_owned()));
            };
        }
        Ok(self.root.join(key))
    }

    pub async fn read(&self, key: &str) -> BlobResult<Bytes> {
        let path = self.key_path(key)?;
        match fs::read(&path).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(BlobError::NotFound(key.to_owned()))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn exists(&self, key: &str) -> BlobResult<bool> {
        Ok(fs::try_exists(self.key_path(key)?).await?)
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    #[instrument(skip(self, data, progress), fields(size = data.len()))]
    async fn upload(&self, key: &str, data: Bytes, progress: ProgressFn) -> BlobResult<String> {
        let path = self.key_path(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        // write next to the target then rename, so readers never see a partial blob
        let temp = path.with_extension(format!("{}.tmp", Uuid::new_v4().simple()));
        let total_bytes = data.len() as u64;
        let written = async {
            let mut file = fs::File::create(&temp).await?;
            let mut bytes_transferred = 0u64;
            for chunk in data.chunks(CHUNK_SIZE) {
                file.write_all(chunk).await?;
                bytes_transferred += chunk.len() as u64;
                progress(Transfer { bytes_transferred, total_bytes });
            }
            if total_bytes == 0 {
                progress(Transfer { bytes_transferred: 0, total_bytes });
            }
            file.sync_all().await?;
            fs::rename(&temp, &path).await
        }
        .await;

        if let Err(e) = written {
            let _ = fs::remove_file(&temp).await;
            return Err(e.into());
        }
        debug!("stored blob {key}");
        Ok(self.url_for(key))
    }

    async fn delete(&self, key: &str) -> BlobResult<()> {
        let path = self.key_path(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(BlobError::NotFound(key.to_owned()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn fetch(&self, url: &str) -> BlobResult<Bytes> {
        let prefix = format!("{}/blobs/", self.public_base);
        let key = url
            .strip_prefix(&prefix)
            .ok_or_else(|| BlobError::InvalidPath(url.to_owned()))?;
        self.read(key).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use tempfile::tempdir;

    use super::*;
    use crate::blob::no_progress;

    #[tokio::test]
    async fn upload_reports_progress_and_returns_url() {
        let dir = tempdir().unwrap();
        let store = FsBlobStore::new(dir.path(), "http://localhost:8080/").await.unwrap();

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let data = Bytes::from(vec![7u8; CHUNK_SIZE * 2 + 10]);
        let url = store
            .upload(
                "uploads/482913/1_a.bin",
                data.clone(),
                Arc::new(move |t: Transfer| sink.lock().unwrap().push(t.percent())),
            )
            .await
            .unwrap();

        assert_eq!(url, "http://localhost:8080/blobs/uploads/482913/1_a.bin");
        let seen = seen.lock().unwrap().clone();
        assert_eq!(seen.len(), 3);
        assert!(seen.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(*seen.last().unwrap(), 100.0);
        assert_eq!(store.fetch(&url).await.unwrap(), data);
    }

    #[tokio::test]
    async fn delete_removes_exactly_one_blob() {
        let dir = tempdir().unwrap();
        let store = FsBlobStore::new(dir.path(), "http://host").await.unwrap();
        for key in ["uploads/482913/1_a", "uploads/482913/2_a"] {
            store.upload(key, Bytes::from_static(b"x"), no_progress()).await.unwrap();
        }

        store.delete("uploads/482913/1_a").await.unwrap();
        assert!(!store.exists("uploads/482913/1_a").await.unwrap());
        assert!(store.exists("uploads/482913/2_a").await.unwrap());
        assert!(matches!(
            store.delete("uploads/482913/1_a").await,
            Err(BlobError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn dots_inside_a_name_are_fine() {
        let dir = tempdir().unwrap();
        let store = FsBlobStore::new(dir.path(), "http://host").await.unwrap();
        let key = "uploads/482913/1_a..b.txt";

        let url = store.upload(key, Bytes::from_static(b"abc"), no_progress()).await.unwrap();
        assert_eq!(url, "http://host/blobs/uploads/482913/1_a..b.txt");
        assert_eq!(store.read(key).await.unwrap(), Bytes::from_static(b"abc"));
    }

    #[tokio::test]
    async fn rejects_traversal() {
        let dir = tempdir().unwrap();
        let store = FsBlobStore::new(dir.path(), "http://host").await.unwrap();
        for key in ["../etc/passwd", "/abs", "uploads/../../x", ""] {
            assert!(matches!(
                store.upload(key, Bytes::new(), no_progress()).await,
                Err(BlobError::InvalidPath(_))
            ));
        }
        assert!(matches!(
            store.fetch("http://elsewhere/blobs/x").await,
            Err(BlobError::InvalidPath(_))
        ));
    }
}
