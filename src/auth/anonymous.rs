use axum::{debug_handler, Json};
use serde::Serialize;
use tower_sessions::Session;
use tracing::info;

use crate::{document::ClientId, AppResult};

use super::USER_ID;

#[derive(Serialize)]
pub(crate) struct SignedIn {
    uid: ClientId,
}

/// Hands out an anonymous id, stable for the lifetime of the cookie session.
#[debug_handler]
pub(crate) async fn sign_in(session: Session) -> AppResult<Json<SignedIn>> {
    let uid = match session.get::<ClientId>(USER_ID).await? {
        Some(uid) => uid,
        None => {
            let uid = ClientId::new();
            session.insert(USER_ID, uid).await?;
            info!("welcome u/{uid}");
            uid
        }
    };

    Ok(Json(SignedIn { uid }))
}
