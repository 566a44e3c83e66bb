use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use spill_core::answers::{self, SubmitAnswer};
use spill_core::rating;
use spill_core::unlock::{self, UnlockCommand};
use spill_types::api::{
    Claims, RateRequest, RateResponse, SecretResponse, SubmitAnswerRequest, UnlockRequest,
    UnlockResponse,
};

use crate::error::ApiError;
use crate::extract::{ApiJson, SecretId};
use crate::state::{AppState, run_blocking};

/// POST /secrets: first answer to a question is 201, an edit of it is 200.
pub async fn submit_answer(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(req): ApiJson<SubmitAnswerRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let cmd = SubmitAnswer {
        author_id: claims.sub,
        room_id: req.room_id,
        question_id: req.question_id,
        body: req.body,
        self_rating: req.self_rating,
        importance: req.importance,
        is_anonymous: req.is_anonymous,
        answer_data: req.answer_data,
    };
    let submitted = run_blocking(&state, move |db| answers::submit_answer(db, cmd)).await?;

    let status = if submitted.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((
        status,
        Json(SecretResponse {
            secret: submitted.secret,
        }),
    ))
}

/// GET /secrets/{secret_id}
pub async fn get_secret(
    State(state): State<AppState>,
    SecretId(secret_id): SecretId,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let viewer = claims.sub;
    let secret = run_blocking(&state, move |db| answers::get_secret(db, secret_id, viewer)).await?;
    Ok(Json(SecretResponse { secret }))
}

/// DELETE /secrets/{secret_id}: author-only soft delete.
pub async fn hide_secret(
    State(state): State<AppState>,
    SecretId(secret_id): SecretId,
    Extension(claims): Extension<Claims>,
) -> Result<StatusCode, ApiError> {
    let author = claims.sub;
    run_blocking(&state, move |db| answers::hide_secret(db, secret_id, author)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /secrets/{secret_id}/unlock
pub async fn unlock_secret(
    State(state): State<AppState>,
    SecretId(secret_id): SecretId,
    Extension(claims): Extension<Claims>,
    ApiJson(req): ApiJson<UnlockRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let cmd = UnlockCommand {
        secret_id,
        buyer_id: claims.sub,
        question_id: req.question_id,
        body: req.body,
        self_rating: req.self_rating,
        importance: req.importance,
    };
    let secret = run_blocking(&state, move |db| unlock::unlock(db, cmd)).await?;

    Ok(Json(UnlockResponse {
        message: "Secret unlocked".to_string(),
        secret,
    }))
}

/// POST /secrets/{secret_id}/rate
pub async fn rate_secret(
    State(state): State<AppState>,
    SecretId(secret_id): SecretId,
    Extension(claims): Extension<Claims>,
    ApiJson(req): ApiJson<RateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let rater = claims.sub;
    let avg_rating =
        run_blocking(&state, move |db| rating::rate(db, secret_id, rater, req.rating)).await?;

    Ok(Json(RateResponse {
        message: "Rating saved".to_string(),
        avg_rating,
    }))
}
