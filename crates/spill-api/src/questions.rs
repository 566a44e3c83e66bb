use axum::{Extension, Json, extract::State, response::IntoResponse};
use spill_core::answers;
use spill_types::api::Claims;

use crate::error::ApiError;
use crate::extract::{AnswersRoom, QuestionId};
use crate::state::{AppState, run_blocking};

/// GET /questions/{question_id}/answers?roomId=: everyone's answers, oldest first.
/// Refused with 403 until the caller has answered the question themselves.
pub async fn list_answers(
    State(state): State<AppState>,
    QuestionId(question_id): QuestionId,
    AnswersRoom(room_id): AnswersRoom,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let viewer = claims.sub;
    let listed = run_blocking(&state, move |db| {
        answers::question_answers(db, room_id, question_id, viewer)
    })
    .await?;
    Ok(Json(listed))
}
