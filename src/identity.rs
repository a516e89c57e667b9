use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use crate::{document::ClientId, error::IdentityError};

#[async_trait]
pub trait IdentityProvider: Send + Sync + 'static {
    async fn sign_in_anonymous(&self) -> Result<ClientId, IdentityError>;
}

/// Mints one identity for the lifetime of the process, no network involved.
pub struct EphemeralIdentity {
    id: ClientId,
}

impl EphemeralIdentity {
    pub fn new() -> Self {
        Self { id: ClientId::new() }
    }
}

impl Default for EphemeralIdentity {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityProvider for EphemeralIdentity {
    async fn sign_in_anonymous(&self) -> Result<ClientId, IdentityError> {
        Ok(self.id)
    }
}

#[derive(Deserialize)]
struct SignedIn {
    uid: ClientId,
}

/// Anonymous sign-in against a syncbridge server's `/auth/anonymous`.
pub struct HttpIdentity {
    base: Url,
    http: Client,
}

impl HttpIdentity {
    pub fn new(base: Url, http: Client) -> Self {
        Self { base, http }
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentity {
    async fn sign_in_anonymous(&self) -> Result<ClientId, IdentityError> {
        let response = self
            .http
            .post(self.base.join("auth/anonymous")?)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(IdentityError::Rejected(response.status().as_u16()));
        }
        Ok(response.json::<SignedIn>().await?.uid)
    }
}
