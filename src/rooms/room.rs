use std::sync::Arc;

use axum::{debug_handler, extract::{Path, State}, Json};

use crate::{
    document::{RoomDocument, RoomPatch, Snapshot},
    room::RoomCode,
    store::{DocumentStore, SqliteDocumentStore},
    AppResult, AppState,
};

#[debug_handler(state = AppState)]
pub(crate) async fn room(
    Path(room): Path<RoomCode>,
    State(docs): State<Arc<SqliteDocumentStore>>,
) -> AppResult<Json<Snapshot>> {
    Ok(Json(docs.get(&room).await?))
}

#[debug_handler(state = AppState)]
pub(crate) async fn merge(
    Path(room): Path<RoomCode>,
    State(docs): State<Arc<SqliteDocumentStore>>,
    Json(patch): Json<RoomPatch>,
) -> AppResult<Json<RoomDocument>> {
    Ok(Json(docs.merge_write(&room, patch).await?))
}

/// Merge that refuses to create the room.
#[debug_handler(state = AppState)]
pub(crate) async fn update(
    Path(room): Path<RoomCode>,
    State(docs): State<Arc<SqliteDocumentStore>>,
    Json(patch): Json<RoomPatch>,
) -> AppResult<Json<RoomDocument>> {
    Ok(Json(docs.update(&room, patch).await?))
}

#[debug_handler(state = AppState)]
pub(crate) async fn replace(
    Path(room): Path<RoomCode>,
    State(docs): State<Arc<SqliteDocumentStore>>,
    Json(patch): Json<RoomPatch>,
) -> AppResult<Json<RoomDocument>> {
    Ok(Json(docs.replace_write(&room, patch).await?))
}
