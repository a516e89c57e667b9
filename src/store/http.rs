use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::{Client, Method, StatusCode};
use tokio::sync::{mpsc, watch};
use tokio_stream::wrappers::ReceiverStream;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};
use url::Url;

use crate::{
    document::{RoomDocument, RoomPatch, Snapshot, WriteMode},
    error::{StoreError, StoreResult},
    room::RoomCode,
};

use super::{DocumentStore, Subscription};

/// Talks to a syncbridge server's `/r` routes.
pub struct HttpDocumentStore {
    base: Url,
    http: Client,
    online: watch::Sender<bool>,
    reconnect_delay: Duration,
}

impl HttpDocumentStore {
    pub fn new(base: Url, http: Client, reconnect_delay: Duration) -> Self {
        Self {
            base,
            http,
            online: watch::Sender::new(true),
            reconnect_delay,
        }
    }

    fn room_url(&self, room: &RoomCode, suffix: &str) -> StoreResult<Url> {
        Ok(self.base.join(&format!("r/{room}{suffix}"))?)
    }

    fn ensure_online(&self) -> StoreResult<()> {
        if *self.online.borrow() {
            Ok(())
        } else {
            Err(StoreError::Offline)
        }
    }
}

#[async_trait]
impl DocumentStore for HttpDocumentStore {
    async fn subscribe(&self, room: &RoomCode) -> StoreResult<Subscription> {
        // http -> ws, https -> wss
        let url = Url::parse(&self.room_url(room, "/ws")?.as_str().replacen("http", "ws", 1))?;

        let (tx, rx) = mpsc::channel(16);
        tokio::spawn(pump_snapshots(
            url,
            self.online.subscribe(),
            tx,
            self.reconnect_delay,
        ));
        Ok(ReceiverStream::new(rx).boxed())
    }

    async fn get(&self, room: &RoomCode) -> StoreResult<Snapshot> {
        self.ensure_online()?;
        let response = self.http.get(self.room_url(room, "")?).send().await?;
        if !response.status().is_success() {
            return Err(StoreError::Rejected(response.status().as_u16()));
        }
        Ok(response.json().await?)
    }

    async fn write(
        &self,
        room: &RoomCode,
        mode: WriteMode,
        patch: RoomPatch,
    ) -> StoreResult<RoomDocument> {
        self.ensure_online()?;
        let (method, url) = match mode {
            WriteMode::Merge => (Method::PATCH, self.room_url(room, "")?),
            WriteMode::Update => (Method::POST, self.room_url(room, "/update")?),
            WriteMode::Replace => (Method::PUT, self.room_url(room, "")?),
        };

        let response = self.http.request(method, url).json(&patch).send().await?;
        match response.status() {
            status if status.is_success() => Ok(response.json().await?),
            StatusCode::NOT_FOUND => Err(StoreError::NotFound(room.clone())),
            status => Err(StoreError::Rejected(status.as_u16())),
        }
    }

    async fn set_network_enabled(&self, enabled: bool) {
        self.online.send_replace(enabled);
    }
}

/// Keeps one websocket open while the network is enabled and forwards its snapshots.
/// Ends when the subscriber goes away.
async fn pump_snapshots(
    url: Url,
    mut online: watch::Receiver<bool>,
    tx: mpsc::Sender<StoreResult<Snapshot>>,
    reconnect_delay: Duration,
) {
    loop {
        if online.wait_for(|up| *up).await.is_err() {
            return;
        }

        let mut frames = match connect_async(url.as_str()).await {
            Ok((stream, _)) => stream,
            Err(e) => {
                if tx.send(Err(StoreError::Socket(Box::new(e)))).await.is_err() {
                    return;
                }
                tokio::time::sleep(reconnect_delay).await;
                continue;
            }
        };
        info!("subscribed to {url}");

        loop {
            tokio::select! {
                frame = frames.next() => {
                    let item = match frame {
                        Some(Ok(msg @ (Message::Text(_) | Message::Binary(_)))) => {
                            serde_json::from_slice::<Snapshot>(&msg.into_data())
                                .map_err(StoreError::from)
                        }
                        Some(Ok(Message::Close(_))) | None => break,
                        Some(Ok(_)) => continue,
                        Some(Err(e)) => {
                            let _ = tx.send(Err(StoreError::Socket(Box::new(e)))).await;
                            break;
                        }
                    };
                    if tx.send(item).await.is_err() {
                        return;
                    }
                }
                changed = online.changed() => {
                    if changed.is_err() {
                        return;
                    }
                    if !*online.borrow() {
                        debug!("network disabled, dropping subscription to {url}");
                        if tx.send(Err(StoreError::Offline)).await.is_err() {
                            return;
                        }
                        break;
                    }
                }
                _ = tx.closed() => return,
            }
        }

        if tx.is_closed() {
            return;
        }
        if *online.borrow() {
            warn!("subscription to {url} dropped, reconnecting");
            tokio::time::sleep(reconnect_delay).await;
        }
    }
}
