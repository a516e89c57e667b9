mod anonymous;

use axum::{routing::post, Router};

use crate::AppState;

pub(crate) const USER_ID: &str = "user_id";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/anonymous", post(anonymous::sign_in))
}
