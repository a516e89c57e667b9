use std::sync::Arc;

use syncbridge::{blob::FsBlobStore, store::SqliteDocumentStore, AppState, Config};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env();

    let docs = SqliteDocumentStore::connect(&config.database_url).await?;
    let blobs = FsBlobStore::new(&config.blob_root, &config.public_url).await?;
    let app_state = AppState {
        docs: Arc::new(docs),
        blobs: Arc::new(blobs),
        config: Arc::new(config.clone()),
    };

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
    info!("syncbridge listening on {}", listener.local_addr()?);
    axum::serve(listener, syncbridge::router(app_state)).await?;
    Ok(())
}
