//! Room document stores.
//!
//! - `MemoryDocumentStore`: process-local, used for local-only sessions and tests
//! - `SqliteDocumentStore`: what the server persists rooms in
//! - `HttpDocumentStore`: a client of the server's `/r` routes

mod hub;
pub mod http;
pub mod memory;
pub mod sqlite;

use std::pin::Pin;

use async_trait::async_trait;
use futures_util::Stream;

use crate::{
    document::{RoomDocument, RoomPatch, Snapshot, WriteMode},
    error::StoreResult,
    room::RoomCode,
};

pub use hub::SnapshotHub;
pub use http::HttpDocumentStore;
pub use memory::MemoryDocumentStore;
pub use sqlite::SqliteDocumentStore;

/// Totally ordered snapshots of one room, current state first.
pub type Subscription = Pin<Box<dyn Stream<Item = StoreResult<Snapshot>> + Send>>;

#[async_trait]
pub trait DocumentStore: Send + Sync + 'static {
    async fn subscribe(&self, room: &RoomCode) -> StoreResult<Subscription>;

    async fn get(&self, room: &RoomCode) -> StoreResult<Snapshot>;

    /// Applies `patch` atomically and publishes the resulting snapshot.
    async fn write(&self, room: &RoomCode, mode: WriteMode, patch: RoomPatch)
    -> StoreResult<RoomDocument>;

    async fn merge_write(&self, room: &RoomCode, patch: RoomPatch) -> StoreResult<RoomDocument> {
        self.write(room, WriteMode::Merge, patch).await
    }

    async fn update(&self, room: &RoomCode, patch: RoomPatch) -> StoreResult<RoomDocument> {
        self.write(room, WriteMode::Update, patch).await
    }

    async fn replace_write(&self, room: &RoomCode, patch: RoomPatch) -> StoreResult<RoomDocument> {
        self.write(room, WriteMode::Replace, patch).await
    }

    /// Suspends or resumes network activity. Local stores have none.
    async fn set_network_enabled(&self, _enabled: bool) {}
}
