use std::sync::Arc;

use reqwest::Client;
use tokio::sync::broadcast;
use url::Url;

use crate::{
    blob::{BlobStore, HttpBlobStore},
    config::ClientSettings,
    connectivity::{Monitor, SessionState},
    error::SessionError,
    identity::{HttpIdentity, IdentityProvider},
    notice::{Notice, Notices},
    room::RoomCode,
    session::RoomSession,
    store::{DocumentStore, HttpDocumentStore},
};

/// Everything a participant needs: identity gate, stores and notices.
pub struct SyncClient {
    docs: Arc<dyn DocumentStore>,
    blobs: Arc<dyn BlobStore>,
    monitor: Monitor,
    notices: Notices,
    settings: ClientSettings,
}

impl SyncClient {
    pub fn new(
        docs: Arc<dyn DocumentStore>,
        blobs: Arc<dyn BlobStore>,
        identity: Arc<dyn IdentityProvider>,
        settings: ClientSettings,
    ) -> Self {
        Self {
            monitor: Monitor::new(identity, docs.clone()),
            docs,
            blobs,
            notices: Notices::new(),
            settings,
        }
    }

    /// A client of the syncbridge server at `base`.
    pub fn remote(base: Url, settings: ClientSettings) -> Self {
        let http = Client::new();
        let docs = Arc::new(HttpDocumentStore::new(
            base.clone(),
            http.clone(),
            settings.reconnect_delay,
        ));
        let blobs = Arc::new(HttpBlobStore::new(base.clone(), http.clone()));
        let identity = Arc::new(HttpIdentity::new(base, http));
        Self::new(docs, blobs, identity, settings)
    }

    pub async fn start(&self) {
        self.monitor.start().await;
    }

    pub fn monitor(&self) -> &Monitor {
        &self.monitor
    }

    pub fn notices(&self) -> broadcast::Receiver<Notice> {
        self.notices.subscribe()
    }

    pub async fn join(&self, room: RoomCode) -> Result<RoomSession, SessionError> {
        let me = match self.monitor.state() {
            SessionState::Ready(identity) => identity.id,
            SessionState::Initializing => return Err(SessionError::NotReady),
            SessionState::Offline => return Err(SessionError::Offline),
        };
        Ok(RoomSession::join(
            room,
            me,
            self.docs.clone(),
            self.blobs.clone(),
            self.notices.clone(),
            &self.settings,
        )
        .await?)
    }
}
