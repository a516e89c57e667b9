//! Router under test, backed by in-memory SQLite and a temp blob root.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value;
use sqlx::sqlite::SqlitePoolOptions;
use syncbridge::{blob::FsBlobStore, store::SqliteDocumentStore, AppState, Config};
use tempfile::TempDir;
use tower::ServiceExt;
use url::Url;

#[allow(dead_code)]
pub struct TestServer {
    pub router: Router,
    pub state: AppState,
    _temp_dir: TempDir,
}

#[allow(dead_code)]
impl TestServer {
    pub async fn new() -> Self {
        Self::with_config(Config {
            public_url: "http://sync.test".to_string(),
            max_upload_bytes: 1024,
            ..Default::default()
        })
        .await
    }

    /// Serves the router on an ephemeral local port and returns the server's base URL.
    pub async fn serve() -> (Self, Url) {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind listener");
        let base = Url::parse(&format!("http://{}/", listener.local_addr().unwrap())).unwrap();

        let server = Self::with_config(Config {
            public_url: base.as_str().trim_end_matches('/').to_string(),
            max_upload_bytes: 1024 * 1024,
            ..Default::default()
        })
        .await;
        let router = server.router.clone();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        (server, base)
    }

    async fn with_config(mut config: Config) -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
        config.blob_root = temp_dir.path().join("blobs").display().to_string();

        let db_pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("Failed to open database");
        let docs = SqliteDocumentStore::new(db_pool)
            .await
            .expect("Failed to create document store");
        let blobs = FsBlobStore::new(&config.blob_root, &config.public_url)
            .await
            .expect("Failed to create blob store");

        let state = AppState {
            docs: Arc::new(docs),
            blobs: Arc::new(blobs),
            config: Arc::new(config),
        };
        Self {
            router: syncbridge::router(state.clone()),
            state,
            _temp_dir: temp_dir,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> axum::response::Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// Sends a request with an optional JSON body and decodes the JSON reply.
    pub async fn json(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(v) => {
                builder = builder.header("Content-Type", "application/json");
                Body::from(serde_json::to_vec(&v).unwrap())
            }
            None => Body::empty(),
        };

        let response = self.send(builder.body(body).unwrap()).await;
        let status = response.status();
        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);
        (status, json)
    }
}
