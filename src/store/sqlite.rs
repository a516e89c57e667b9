use async_trait::async_trait;
use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::{
    document::{RoomDocument, RoomPatch, Snapshot, WriteMode},
    error::StoreResult,
    room::RoomCode,
};

use super::{DocumentStore, SnapshotHub, Subscription};

/// Rooms persisted in SQLite, one JSON body per room.
pub struct SqliteDocumentStore {
    db_pool: SqlitePool,
    hub: SnapshotHub,
    // one committed write at a time keeps append/remove atomic per call
    write_gate: Mutex<()>,
}

impl SqliteDocumentStore {
    pub async fn connect(database_url: &str) -> StoreResult<Self> {
        let db_pool = SqlitePoolOptions::new()
            .max_connections(16)
            .connect(database_url)
            .await?;
        Self::new(db_pool).await
    }

    pub async fn new(db_pool: SqlitePool) -> StoreResult<Self> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS sync_rooms (
                code TEXT PRIMARY KEY NOT NULL,
                body TEXT NOT NULL,
                version INTEGER NOT NULL
            )",
        )
        .execute(&db_pool)
        .await?;
        info!("room store ready");

        Ok(Self {
            db_pool,
            hub: SnapshotHub::new(),
            write_gate: Mutex::new(()),
        })
    }

    pub fn hub(&self) -> &SnapshotHub {
        &self.hub
    }

    async fn load(&self, room: &RoomCode) -> StoreResult<Snapshot> {
        let row: Option<(String,)> = sqlx::query_as("SELECT body FROM sync_rooms WHERE code=?")
            .bind(room.as_str())
            .fetch_optional(&self.db_pool)
            .await?;
        match row {
            Some((body,)) => Ok(Some(serde_json::from_str(&body)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn subscribe(&self, room: &RoomCode) -> StoreResult<Subscription> {
        let rx = self.hub.receiver(room);
        let initial = self.load(room).await?;
        Ok(SnapshotHub::subscription(rx, initial))
    }

    async fn get(&self, room: &RoomCode) -> StoreResult<Snapshot> {
        self.load(room).await
    }

    async fn write(
        &self,
        room: &RoomCode,
        mode: WriteMode,
        patch: RoomPatch,
    ) -> StoreResult<RoomDocument> {
        let _gate = self.write_gate.lock().await;

        let current = self.load(room).await?;
        let next = RoomDocument::commit(room, current, mode, patch)?;

        sqlx::query(
            "INSERT INTO sync_rooms (code,body,version) VALUES (?,?,?)
            ON CONFLICT(code) DO UPDATE SET body=excluded.body, version=excluded.version",
        )
        .bind(room.as_str())
        .bind(serde_json::to_string(&next)?)
        .bind(next.version as i64)
        .execute(&self.db_pool)
        .await?;

        debug!("room {room} at version {}", next.version);
        self.hub.publish(room, Some(next.clone()));
        Ok(next)
    }
}
