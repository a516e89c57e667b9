use std::sync::Arc;

use axum::{
    body::Bytes,
    debug_handler,
    extract::{DefaultBodyLimit, Path, State},
    http::StatusCode,
    routing::put,
    Json, Router,
};
use serde::Serialize;

use crate::{
    blob::{no_progress, BlobStore, FsBlobStore},
    error::BlobError,
    room::RoomCode,
    AppResult, AppState,
};

pub fn router(max_upload_bytes: u64) -> Router<AppState> {
    Router::new()
        .route(
            "/{*path}",
            put(store_blob).get(read_blob).delete(delete_blob),
        )
        .layer(DefaultBodyLimit::max(max_upload_bytes as usize))
}

#[derive(Serialize)]
pub(crate) struct Stored {
    url: String,
}

/// Blobs live at `uploads/{room}/{key}` and nowhere else.
fn room_scoped(path: &str) -> Result<(), BlobError> {
    let invalid = || BlobError::InvalidPath(path.to_owned());
    let mut parts = path.splitn(3, '/');
    let (Some("uploads"), Some(code), Some(key)) = (parts.next(), parts.next(), parts.next()) else {
        return Err(invalid());
    };
    RoomCode::parse(code).map_err(|_| invalid())?;
    if key.is_empty() || key.contains('/') {
        return Err(invalid());
    }
    Ok(())
}

#[debug_handler(state = AppState)]
pub(crate) async fn store_blob(
    Path(path): Path<String>,
    State(blobs): State<Arc<FsBlobStore>>,
    body: Bytes,
) -> AppResult<Json<Stored>> {
    room_scoped(&path)?;
    let url = blobs.upload(&path, body, no_progress()).await?;
    Ok(Json(Stored { url }))
}

#[debug_handler(state = AppState)]
pub(crate) async fn read_blob(
    Path(path): Path<String>,
    State(blobs): State<Arc<FsBlobStore>>,
) -> AppResult<Bytes> {
    room_scoped(&path)?;
    Ok(blobs.read(&path).await?)
}

#[debug_handler(state = AppState)]
pub(crate) async fn delete_blob(
    Path(path): Path<String>,
    State(blobs): State<Arc<FsBlobStore>>,
) -> AppResult<StatusCode> {
    room_scoped(&path)?;
    blobs.delete(&path).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_room_scoped_paths_pass() {
        assert!(room_scoped("uploads/482913/1700000000000_a.txt").is_ok());
        assert!(room_scoped("uploads/48291/x").is_err());
        assert!(room_scoped("uploads/482913/").is_err());
        assert!(room_scoped("uploads/482913/a/b").is_err());
        assert!(room_scoped("elsewhere/482913/a").is_err());
    }
}
