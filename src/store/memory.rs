use std::{collections::HashMap, sync::Mutex};

use async_trait::async_trait;

use crate::{
    document::{RoomDocument, RoomPatch, Snapshot, WriteMode},
    error::StoreResult,
    room::RoomCode,
};

use super::{DocumentStore, SnapshotHub, Subscription};

/// Rooms held in process memory.
#[derive(Default)]
pub struct MemoryDocumentStore {
    rooms: Mutex<HashMap<RoomCode, RoomDocument>>,
    hub: SnapshotHub,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn load(&self, room: &RoomCode) -> Snapshot {
        self.rooms
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(room)
            .cloned()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn subscribe(&self, room: &RoomCode) -> StoreResult<Subscription> {
        let rx = self.hub.receiver(room);
        Ok(SnapshotHub::subscription(rx, self.load(room)))
    }

    async fn get(&self, room: &RoomCode) -> StoreResult<Snapshot> {
        Ok(self.load(room))
    }

    async fn write(
        &self,
        room: &RoomCode,
        mode: WriteMode,
        patch: RoomPatch,
    ) -> StoreResult<RoomDocument> {
        let mut rooms = self.rooms.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let next = RoomDocument::commit(room, rooms.get(room).cloned(), mode, patch)?;
        rooms.insert(room.clone(), next.clone());
        self.hub.publish(room, Some(next.clone()));
        Ok(next)
    }
}
