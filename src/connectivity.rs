//! Gates the client on an anonymous identity and network reachability.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use tokio::sync::watch;
use tracing::{info, warn};

use crate::{document::ClientId, identity::IdentityProvider, store::DocumentStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub id: ClientId,
    /// Sign-in failed and the id was minted locally.
    pub local_only: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No identity yet. Nothing is usable.
    Initializing,
    Ready(Identity),
    /// Blocking notice until the network returns or `retry` is called.
    Offline,
}

pub struct Monitor {
    provider: Arc<dyn IdentityProvider>,
    docs: Arc<dyn DocumentStore>,
    online: AtomicBool,
    identity: watch::Sender<Option<Identity>>,
    state: watch::Sender<SessionState>,
}

impl Monitor {
    pub fn new(provider: Arc<dyn IdentityProvider>, docs: Arc<dyn DocumentStore>) -> Self {
        Self {
            provider,
            docs,
            online: AtomicBool::new(true),
            identity: watch::Sender::new(None),
            state: watch::Sender::new(SessionState::Initializing),
        }
    }

    pub async fn start(&self) {
        self.sign_in().await;
    }

    async fn sign_in(&self) {
        let resolved = match self.provider.sign_in_anonymous().await {
            Ok(id) => {
                info!("signed in as {id}");
                Identity { id, local_only: false }
            }
            Err(e) => {
                let kept = *self.identity.borrow();
                match kept {
                    Some(identity) => {
                        warn!("anonymous sign-in failed, keeping {}: {e}", identity.id);
                        identity
                    }
                    None => {
                        warn!("anonymous sign-in failed, continuing local-only: {e}");
                        Identity { id: ClientId::new(), local_only: true }
                    }
                }
            }
        };
        self.identity.send_if_modified(|current| {
            let changed = *current != Some(resolved);
            *current = Some(resolved);
            changed
        });
        self.refresh();
    }

    fn refresh(&self) {
        let next = if !self.online.load(Ordering::SeqCst) {
            SessionState::Offline
        } else {
            match *self.identity.borrow() {
                Some(identity) => SessionState::Ready(identity),
                None => SessionState::Initializing,
            }
        };
        self.state.send_if_modified(|state| {
            let changed = *state != next;
            *state = next;
            changed
        });
    }

    /// Feed of platform online/offline signals.
    pub async fn set_online(&self, online: bool) {
        if self.online.swap(online, Ordering::SeqCst) == online {
            return;
        }
        if online {
            info!("network is back, resuming sync");
        } else {
            warn!("network lost, suspending sync");
        }
        self.docs.set_network_enabled(online).await;
        self.refresh();
    }

    /// Manual recovery from the offline notice: resume the network and sign in again.
    pub async fn retry(&self) {
        self.online.store(true, Ordering::SeqCst);
        self.docs.set_network_enabled(true).await;
        self.sign_in().await;
    }

    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    pub fn watch_state(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn watch_identity(&self) -> watch::Receiver<Option<Identity>> {
        self.identity.subscribe()
    }

    pub fn identity(&self) -> Option<ClientId> {
        self.identity.borrow().map(|identity| identity.id)
    }
}
