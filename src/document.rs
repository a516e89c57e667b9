//! The shared room record and the typed partial writes applied to it.
//!
//! Every committed write produces a new version. Concurrent writers are not merged:
//! whichever write reaches the store last decides `text`. The `files` collection is only
//! touched through append/remove/set operations that the store applies atomically.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{error::StoreError, room::RoomCode};

/// Anonymous identity of one client process.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(Uuid);

impl ClientId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ClientId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "ClientId({})", self.0)
    }
}

/// Metadata of one uploaded blob. Equality is structural and is what removal matches on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDescriptor {
    pub name: String,
    pub mime_type: String,
    pub url: String,
    pub storage_path: String,
    pub size: u64,
    pub uploaded_at: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomDocument {
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_sender: Option<ClientId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
    #[serde(default)]
    pub files: Vec<FileDescriptor>,
    #[serde(default)]
    pub version: u64,
}

/// What a subscriber sees: the document, or `None` while the room has never been written.
pub type Snapshot = Option<RoomDocument>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "op", content = "value")]
pub enum FilesUpdate {
    Append(FileDescriptor),
    Remove(FileDescriptor),
    Set(Vec<FileDescriptor>),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_sender: Option<ClientId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files: Option<FilesUpdate>,
}

impl RoomPatch {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn append_file(file: FileDescriptor) -> Self {
        Self {
            files: Some(FilesUpdate::Append(file)),
            ..Self::default()
        }
    }

    pub fn remove_file(file: FileDescriptor) -> Self {
        Self {
            files: Some(FilesUpdate::Remove(file)),
            ..Self::default()
        }
    }

    /// Empty text and no files.
    pub fn cleared() -> Self {
        Self {
            text: Some(String::new()),
            files: Some(FilesUpdate::Set(Vec::new())),
            ..Self::default()
        }
    }

    pub fn sender(mut self, sender: ClientId) -> Self {
        self.last_sender = Some(sender);
        self
    }

    pub fn touched(mut self, at: i64) -> Self {
        self.updated_at = Some(at);
        self
    }
}

/// How a patch meets the stored document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Merge into the document, creating it when absent.
    Merge,
    /// Merge into the document, failing when absent.
    Update,
    /// Replace the document with exactly the patch's fields.
    Replace,
}

impl RoomDocument {
    fn merge(&mut self, patch: RoomPatch) {
        if let Some(text) = patch.text {
            self.text = text;
        }
        if patch.last_sender.is_some() {
            self.last_sender = patch.last_sender;
        }
        if patch.updated_at.is_some() {
            self.updated_at = patch.updated_at;
        }
        match patch.files {
            Some(FilesUpdate::Append(file)) => {
                if !self.files.contains(&file) {
                    self.files.push(file);
                }
            }
            Some(FilesUpdate::Remove(file)) => self.files.retain(|f| *f != file),
            Some(FilesUpdate::Set(files)) => {
                self.files.clear();
                for file in files {
                    if !self.files.contains(&file) {
                        self.files.push(file);
                    }
                }
            }
            None => {}
        }
    }

    /// Computes the next committed state of `room` from its current one.
    pub fn commit(
        room: &RoomCode,
        current: Option<RoomDocument>,
        mode: WriteMode,
        patch: RoomPatch,
    ) -> Result<RoomDocument, StoreError> {
        let version = current.as_ref().map_or(0, |doc| doc.version) + 1;
        let mut next = match (mode, current) {
            (WriteMode::Update, None) => return Err(StoreError::NotFound(room.clone())),
            (WriteMode::Replace, _) | (_, None) => RoomDocument::default(),
            (_, Some(doc)) => doc,
        };
        next.merge(patch);
        next.version = version;
        Ok(next)
    }
}
