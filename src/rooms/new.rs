use std::sync::Arc;

use axum::{debug_handler, extract::State, Json};
use serde::Serialize;

use crate::{room::RoomCode, AppState, Config};

#[derive(Serialize)]
pub(crate) struct NewRoom {
    room: RoomCode,
    link: String,
}

/// A fresh code and its share link. The room itself appears on first write.
#[debug_handler(state = AppState)]
pub(crate) async fn new_room(State(config): State<Arc<Config>>) -> Json<NewRoom> {
    let room = RoomCode::generate();
    let link = room.share_link(&config.public_url);
    Json(NewRoom { room, link })
}
