use axum::{debug_handler, extract::Query, response::{IntoResponse, Redirect, Response}};
use serde::Deserialize;

use crate::room::{RoomCode, ROOM_PARAM};

#[derive(Deserialize)]
pub(crate) struct DeepLinkQuery {
    room: Option<String>,
}

/// `/?room=<code>` goes straight to the room; the code leaves the address bar.
#[debug_handler]
pub(crate) async fn index(Query(DeepLinkQuery { room }): Query<DeepLinkQuery>) -> Response {
    if let Some(room) = room.as_deref().and_then(|room| RoomCode::parse(room).ok()) {
        return Redirect::to(&format!("/r/{room}")).into_response();
    }

    format!("syncbridge: share a room with <origin>?{ROOM_PARAM}=<code>").into_response()
}
