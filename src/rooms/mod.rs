mod new;
mod room;
mod ws;

use axum::{routing::{get, post}, Router};

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/new", get(new::new_room))
        .route(
            "/{code}",
            get(room::room).patch(room::merge).put(room::replace),
        )
        .route("/{code}/update", post(room::update))
        .route("/{code}/ws", get(ws::room_ws))
}
