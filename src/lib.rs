pub mod appresult;
pub mod auth;
pub mod blob;
pub mod blobs;
pub mod client;
pub mod config;
pub mod connectivity;
pub mod document;
pub mod error;
pub mod files;
pub mod identity;
pub mod index;
pub mod notice;
pub mod room;
pub mod rooms;
pub mod session;
pub mod store;
pub mod sync;

use std::{any::Any, sync::Arc};

use axum::{
    extract::FromRef,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use time::OffsetDateTime;
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer, trace::TraceLayer};
use tower_sessions::{cookie::SameSite, Expiry, MemoryStore, SessionManagerLayer};
use tracing::error;

pub use appresult::{AppError, AppResult};
pub use client::SyncClient;
pub use config::{ClientSettings, Config};

use crate::{blob::FsBlobStore, store::SqliteDocumentStore};

#[derive(Clone, FromRef)]
pub struct AppState {
    pub docs: Arc<SqliteDocumentStore>,
    pub blobs: Arc<FsBlobStore>,
    pub config: Arc<Config>,
}

pub fn now_millis() -> i64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

fn crash_notice(_: Box<dyn Any + Send + 'static>) -> Response {
    error!("request handler panicked");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Something went wrong. Reload to continue.",
    )
        .into_response()
}

pub fn router(app_state: AppState) -> Router {
    let session_layer = SessionManagerLayer::new(MemoryStore::default())
        .with_secure(false)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(
            app_state.config.session_idle_minutes,
        )));

    Router::new()
        .route("/", get(index::index))
        .nest("/auth", auth::router())
        .nest("/r", rooms::router())
        .nest("/blobs", blobs::router(app_state.config.max_upload_bytes))
        .with_state(app_state)
        .layer(session_layer)
        .layer(CatchPanicLayer::custom(crash_notice))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
