use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use time::OffsetDateTime;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::{
    document::{ClientId, RoomPatch, Snapshot},
    now_millis,
    room::RoomCode,
    store::DocumentStore,
};

use super::Debouncer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    Idle,
    Syncing,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextView {
    pub text: String,
    pub status: SyncStatus,
    /// When another client's text last landed here.
    pub last_updated: Option<OffsetDateTime>,
}

impl Default for TextView {
    fn default() -> Self {
        Self {
            text: String::new(),
            status: SyncStatus::Idle,
            last_updated: None,
        }
    }
}

/// Last-writer-wins text shared by everyone in a room.
///
/// Local edits show up at once and are written after a quiet period. Inbound
/// snapshots tagged with our own id are ignored so a stale echo never moves the caret.
pub struct TextChannel {
    room: RoomCode,
    me: ClientId,
    docs: Arc<dyn DocumentStore>,
    view: Arc<watch::Sender<TextView>>,
    debounce: Debouncer,
    // bumped on every keystroke; a write only settles the status if it is the latest
    edits: Arc<AtomicU64>,
}

impl TextChannel {
    pub fn new(room: RoomCode, me: ClientId, docs: Arc<dyn DocumentStore>, quiet: Duration) -> Self {
        Self {
            room,
            me,
            docs,
            view: Arc::new(watch::Sender::new(TextView::default())),
            debounce: Debouncer::new(quiet),
            edits: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn input(&self, value: impl Into<String>) {
        let value = value.into();
        self.view.send_modify(|view| {
            view.text = value.clone();
            view.status = SyncStatus::Syncing;
        });

        let docs = self.docs.clone();
        let room = self.room.clone();
        let me = self.me;
        let view = self.view.clone();
        let edits = self.edits.clone();
        let edit = edits.fetch_add(1, Ordering::SeqCst) + 1;
        self.debounce.schedule(async move {
            let patch = RoomPatch::text(value).sender(me).touched(now_millis());
            match docs.merge_write(&room, patch).await {
                Ok(doc) => {
                    debug!("room {room} text synced at version {}", doc.version);
                    if edits.load(Ordering::SeqCst) != edit {
                        return;
                    }
                    view.send_if_modified(|view| {
                        let settled = view.status == SyncStatus::Syncing;
                        view.status = SyncStatus::Idle;
                        settled
                    });
                }
                // stays Syncing; the next keystroke writes again
                Err(e) => warn!("text write to room {room} failed: {e}"),
            }
        });
    }

    pub fn apply_snapshot(&self, snapshot: &Snapshot) {
        let me = self.me;
        self.view.send_if_modified(|view| match snapshot {
            None => {
                let changed = !view.text.is_empty();
                view.text.clear();
                changed
            }
            Some(doc) if doc.last_sender != Some(me) && doc.text != view.text => {
                view.text = doc.text.clone();
                view.last_updated = Some(OffsetDateTime::now_utc());
                true
            }
            Some(_) => false,
        });
    }

    /// Local side of a room clear.
    pub fn reset_local(&self) {
        self.edits.fetch_add(1, Ordering::SeqCst);
        self.debounce.cancel();
        self.view.send_modify(|view| {
            view.text.clear();
            view.status = SyncStatus::Idle;
        });
    }

    pub fn view(&self) -> TextView {
        self.view.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<TextView> {
        self.view.subscribe()
    }
}
