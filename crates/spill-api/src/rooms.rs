use axum::{Extension, Json, extract::State, response::IntoResponse};
use spill_core::answers;
use spill_types::api::Claims;

use crate::error::ApiError;
use crate::extract::RoomId;
use crate::state::{AppState, run_blocking};

/// GET /rooms/{room_id}/secrets: every visible secret, newest first.
pub async fn list_secrets(
    State(state): State<AppState>,
    RoomId(room_id): RoomId,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let viewer = claims.sub;
    let secrets = run_blocking(&state, move |db| answers::room_secrets(db, room_id, viewer)).await?;
    Ok(Json(secrets))
}
