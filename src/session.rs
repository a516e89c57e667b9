//! One room view: a single subscription feeding the text and file channels.

use std::sync::Arc;

use futures_util::StreamExt;
use tokio::{sync::watch, task::JoinHandle};
use tracing::{info, warn};

use crate::{
    blob::BlobStore,
    config::ClientSettings,
    document::ClientId,
    error::{FileError, StoreResult},
    files::FileChannel,
    notice::Notices,
    room::RoomCode,
    store::DocumentStore,
    sync::TextChannel,
};

pub struct RoomSession {
    room: RoomCode,
    text: Arc<TextChannel>,
    files: Arc<FileChannel>,
    connected: watch::Receiver<bool>,
    listener: JoinHandle<()>,
}

impl RoomSession {
    pub async fn join(
        room: RoomCode,
        me: ClientId,
        docs: Arc<dyn DocumentStore>,
        blobs: Arc<dyn BlobStore>,
        notices: Notices,
        settings: &ClientSettings,
    ) -> StoreResult<Self> {
        let text = Arc::new(TextChannel::new(room.clone(), me, docs.clone(), settings.debounce));
        let files = Arc::new(FileChannel::new(
            room.clone(),
            me,
            docs.clone(),
            blobs,
            notices,
            settings.max_file_bytes,
        ));

        let mut snapshots = docs.subscribe(&room).await?;
        let (connected_tx, connected) = watch::channel(false);
        let listener = {
            let (text, files, room) = (text.clone(), files.clone(), room.clone());
            tokio::spawn(async move {
                while let Some(item) = snapshots.next().await {
                    match item {
                        Ok(snapshot) => {
                            text.apply_snapshot(&snapshot);
                            files.apply_snapshot(&snapshot);
                            connected_tx.send_replace(true);
                        }
                        Err(e) => {
                            warn!("room {room} subscription error: {e}");
                            connected_tx.send_replace(false);
                        }
                    }
                }
                connected_tx.send_replace(false);
            })
        };
        info!("joined room {room}");

        Ok(Self {
            room,
            text,
            files,
            connected,
            listener,
        })
    }

    pub fn room(&self) -> &RoomCode {
        &self.room
    }

    pub fn text(&self) -> &TextChannel {
        &self.text
    }

    pub fn files(&self) -> &FileChannel {
        &self.files
    }

    pub fn is_connected(&self) -> bool {
        *self.connected.borrow()
    }

    pub fn watch_connected(&self) -> watch::Receiver<bool> {
        self.connected.clone()
    }

    /// Wipes text and files for everyone, after `confirm`.
    pub async fn clear(&self, confirm: impl FnOnce(&str) -> bool) -> Result<bool, FileError> {
        let cleared = self.files.clear(confirm).await?;
        if cleared {
            self.text.reset_local();
        }
        Ok(cleared)
    }
}

impl Drop for RoomSession {
    fn drop(&mut self) {
        self.listener.abort();
    }
}
