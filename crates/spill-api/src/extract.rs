//! Extractors whose rejections go through [`ApiError`], so malformed input
//! gets the same `{error, message}` body as every other failure.

use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Path, Query, Request, rejection::JsonRejection},
    http::request::Parts,
};
use serde::de::DeserializeOwned;
use spill_core::SpillError;
use spill_types::api::{AnswersQuery, RateRequest, SubmitAnswerRequest, UnlockRequest};
use tracing::debug;
use uuid::Uuid;

use crate::error::ApiError;

/// How a request body that fails to decode is reported.
pub trait InvalidBody {
    /// Message used when the JSON is well formed but a field is missing or mistyped.
    const MALFORMED: &'static str;

    fn invalid(message: &str) -> SpillError;
}

impl InvalidBody for RateRequest {
    const MALFORMED: &'static str = "rating must be a whole number between 1 and 5";

    fn invalid(message: &str) -> SpillError {
        SpillError::InvalidRating(message.to_string())
    }
}

impl InvalidBody for UnlockRequest {
    const MALFORMED: &'static str = "unlock needs questionId, body, selfRating and importance";

    fn invalid(message: &str) -> SpillError {
        SpillError::InvalidAnswer(message.to_string())
    }
}

impl InvalidBody for SubmitAnswerRequest {
    const MALFORMED: &'static str = "answer is missing a field or has a malformed value";

    fn invalid(message: &str) -> SpillError {
        SpillError::InvalidAnswer(message.to_string())
    }
}

/// `Json<T>` that rejects with the body type's own error kind. Serde's
/// message is logged, never sent.
pub struct ApiJson<T>(pub T);

impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned + InvalidBody,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => {
                debug!("Rejected request body: {}", rejection.body_text());
                let message = match rejection {
                    JsonRejection::JsonDataError(_) => T::MALFORMED,
                    JsonRejection::MissingJsonContentType(_) => {
                        "request body must be sent as application/json"
                    }
                    _ => "request body is not valid JSON",
                };
                Err(T::invalid(message).into())
            }
        }
    }
}

async fn path_uuid<S: Send + Sync>(
    parts: &mut Parts,
    state: &S,
    what: &'static str,
) -> Result<Uuid, ApiError> {
    match Path::<Uuid>::from_request_parts(parts, state).await {
        Ok(Path(id)) => Ok(id),
        Err(rejection) => {
            debug!("Rejected {} id: {}", what, rejection.body_text());
            Err(SpillError::NotFound(what).into())
        }
    }
}

/// `{secret_id}` path segment. Anything that is not a UUID names no secret.
pub struct SecretId(pub Uuid);

impl<S: Send + Sync> FromRequestParts<S> for SecretId {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        path_uuid(parts, state, "secret").await.map(Self)
    }
}

pub struct RoomId(pub Uuid);

impl<S: Send + Sync> FromRequestParts<S> for RoomId {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        path_uuid(parts, state, "room").await.map(Self)
    }
}

pub struct QuestionId(pub Uuid);

impl<S: Send + Sync> FromRequestParts<S> for QuestionId {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        path_uuid(parts, state, "question").await.map(Self)
    }
}

/// `?roomId=` of the collaborative view. A missing or malformed id names no room.
pub struct AnswersRoom(pub Uuid);

impl<S: Send + Sync> FromRequestParts<S> for AnswersRoom {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<AnswersQuery>::from_request_parts(parts, state).await {
            Ok(Query(query)) => Ok(Self(query.room_id)),
            Err(rejection) => {
                debug!("Rejected answers query: {}", rejection.body_text());
                Err(SpillError::NotFound("room").into())
            }
        }
    }
}
