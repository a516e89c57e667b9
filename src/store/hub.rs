use std::future::ready;

use dashmap::DashMap;
use futures_util::{StreamExt, stream};
use tokio::sync::broadcast;
use tokio_stream::wrappers::{BroadcastStream, errors::BroadcastStreamRecvError};
use tracing::debug;

use crate::{document::Snapshot, room::RoomCode};

use super::Subscription;

const CHANNEL_CAPACITY: usize = 64;

/// Per-room fan-out of committed snapshots.
#[derive(Default)]
pub struct SnapshotHub {
    rooms: DashMap<RoomCode, broadcast::Sender<Snapshot>>,
}

impl SnapshotHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes to `room`, first dropping the channels of rooms nobody watches anymore.
    pub fn receiver(&self, room: &RoomCode) -> broadcast::Receiver<Snapshot> {
        self.rooms.retain(|_, tx| tx.receiver_count() > 0);
        self.rooms
            .entry(room.clone())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe()
    }

    /// Chains `initial` in front of everything published after `rx` was taken.
    ///
    /// Take `rx` before reading `initial` so no write slips between the two. A lagging
    /// subscriber skips ahead; every snapshot is the full document.
    pub fn subscription(rx: broadcast::Receiver<Snapshot>, initial: Snapshot) -> Subscription {
        let updates = BroadcastStream::new(rx).filter_map(|item| {
            ready(match item {
                Ok(snapshot) => Some(Ok(snapshot)),
                Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                    debug!("subscriber lagged by {skipped} snapshots");
                    None
                }
            })
        });
        stream::once(ready(Ok(initial))).chain(updates).boxed()
    }

    pub fn publish(&self, room: &RoomCode, snapshot: Snapshot) {
        let orphaned = match self.rooms.get(room) {
            Some(tx) => tx.send(snapshot).is_err(),
            None => false,
        };
        if orphaned {
            self.rooms.remove_if(room, |_, tx| tx.receiver_count() == 0);
        }
    }

    pub fn watchers(&self, room: &RoomCode) -> usize {
        self.rooms.get(room).map_or(0, |tx| tx.receiver_count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rooms_without_watchers_are_pruned() {
        let hub = SnapshotHub::new();
        let room = RoomCode::parse("482913").unwrap();

        let rx = hub.receiver(&room);
        assert_eq!(hub.watchers(&room), 1);
        drop(rx);

        hub.publish(&room, None);
        assert_eq!(hub.watchers(&room), 0);
        assert!(hub.rooms.is_empty());
    }

    #[test]
    fn abandoned_rooms_are_swept_on_subscribe() {
        let hub = SnapshotHub::new();
        let left = RoomCode::parse("111111").unwrap();
        let joined = RoomCode::parse("222222").unwrap();

        drop(hub.receiver(&left));
        let _rx = hub.receiver(&joined);

        assert!(!hub.rooms.contains_key(&left));
        assert_eq!(hub.watchers(&joined), 1);
        assert_eq!(hub.rooms.len(), 1);
    }
}
