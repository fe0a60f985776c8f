use crate::gate::Identity;
use axum::{extract::Extension, response::Json};

#[utoipa::path(
    get,
    path = "/session",
    responses(
        (status = 200, description = "Credential is valid", body = Identity),
        (status = 400, description = "Credential subject is not a user id", body = super::Message),
        (status = 401, description = "Credential missing, malformed or invalid", body = super::Message)
    ),
    tag = "session"
)]
pub async fn session(Extension(identity): Extension<Identity>) -> Json<Identity> {
    Json(identity)
}
