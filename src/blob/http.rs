use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream;
use reqwest::{Body, Client, StatusCode};
use serde::Deserialize;
use url::Url;

use crate::error::{BlobError, BlobResult};

use super::{BlobStore, CHUNK_SIZE, ProgressFn, Transfer};

#[derive(Deserialize)]
pub(crate) struct Stored {
    pub(crate) url: String,
}

/// Talks to a syncbridge server's `/blobs` routes.
pub struct HttpBlobStore {
    base: Url,
    http: Client,
}

impl HttpBlobStore {
    pub fn new(base: Url, http: Client) -> Self {
        Self { base, http }
    }

    fn blob_url(&self, path: &str) -> BlobResult<Url> {
        self.base
            .join(&format!("blobs/{path}"))
            .map_err(|_| BlobError::InvalidPath(path.to_owned()))
    }
}

fn check(status: StatusCode, path: &str) -> BlobResult<()> {
    match status {
        status if status.is_success() => Ok(()),
        StatusCode::NOT_FOUND => Err(BlobError::NotFound(path.to_owned())),
        StatusCode::BAD_REQUEST => Err(BlobError::InvalidPath(path.to_owned())),
        status => Err(BlobError::Rejected(status.as_u16())),
    }
}

#[async_trait]
impl BlobStore for HttpBlobStore {
    async fn upload(&self, path: &str, data: Bytes, progress: ProgressFn) -> BlobResult<String> {
        let total_bytes = data.len() as u64;
        let chunks: Vec<Bytes> = (0..data.len())
            .step_by(CHUNK_SIZE)
            .map(|start| data.slice(start..(start + CHUNK_SIZE).min(data.len())))
            .collect();

        // progress advances as the body is pulled onto the wire
        let mut bytes_transferred = 0u64;
        let body = stream::iter(chunks.into_iter().map(move |chunk| {
            bytes_transferred += chunk.len() as u64;
            progress(Transfer { bytes_transferred, total_bytes });
            Ok::<_, std::io::Error>(chunk)
        }));

        let response = self
            .http
            .put(self.blob_url(path)?)
            .header(reqwest::header::CONTENT_LENGTH, total_bytes)
            .body(Body::wrap_stream(body))
            .send()
            .await?;
        check(response.status(), path)?;
        Ok(response.json::<Stored>().await?.url)
    }

    async fn delete(&self, path: &str) -> BlobResult<()> {
        let response = self.http.delete(self.blob_url(path)?).send().await?;
        check(response.status(), path)
    }

    async fn fetch(&self, url: &str) -> BlobResult<Bytes> {
        let response = self.http.get(url).send().await?;
        check(response.status(), url)?;
        Ok(response.bytes().await?)
    }
}
