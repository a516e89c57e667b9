use std::sync::Arc;

use axum::{
    debug_handler,
    extract::{ws::Message, Path, State, WebSocketUpgrade},
    response::{IntoResponse, Response},
};
use futures_util::{SinkExt, StreamExt};
use tracing::{debug, warn};

use crate::{
    room::RoomCode,
    store::{DocumentStore, SqliteDocumentStore},
    AppResult, AppState,
};

/// Streams every committed snapshot of the room, the current one first.
#[debug_handler(state = AppState)]
pub(crate) async fn room_ws(
    Path(room): Path<RoomCode>,
    State(docs): State<Arc<SqliteDocumentStore>>,
    ws: WebSocketUpgrade,
) -> AppResult<Response> {
    let mut snapshots = docs.subscribe(&room).await?;
    debug!("room {room} has {} watchers", docs.hub().watchers(&room));

    Ok(ws.on_upgrade(move |stream| async move {
        let (mut sender, mut receiver) = stream.split();

        let mut forward_task = tokio::spawn(async move {
            while let Some(item) = snapshots.next().await {
                let snapshot = match item {
                    Ok(snapshot) => snapshot,
                    Err(e) => {
                        warn!("dropping snapshot: {e}");
                        continue;
                    }
                };
                let Ok(json) = serde_json::to_string(&snapshot) else {
                    continue;
                };
                if sender.send(Message::Text(json.into())).await.is_err() {
                    break;
                }
            }
        });

        // watchers only listen; anything but a close frame is ignored
        let mut listen_task = tokio::spawn(async move {
            while let Some(Ok(msg)) = receiver.next().await {
                if let Message::Close(_) = msg {
                    break;
                }
            }
        });

        tokio::select! {
            _ = &mut forward_task => listen_task.abort(),
            _ = &mut listen_task => forward_task.abort(),
        };
        debug!("watcher of room {room} left");
    })
    .into_response())
}
