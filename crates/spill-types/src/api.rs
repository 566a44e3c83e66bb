use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{AnswerData, ProjectedSecret};

// -- JWT Claims --

/// Claims of the bearer token minted by the identity service.
/// Only `sub` is consumed by the engine; `name` is informational and may be absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    #[serde(default)]
    pub name: String,
    pub exp: usize,
}

// -- Answers --

// Ratings arrive as plain integers so that out-of-range values reach
// validation; bodies that fail to decode at all are mapped per request type
// by the API's extractors.

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SubmitAnswerRequest {
    pub room_id: Uuid,
    pub question_id: Uuid,
    pub body: String,
    pub self_rating: i64,
    pub importance: i64,
    #[serde(default)]
    pub is_anonymous: bool,
    pub answer_data: Option<AnswerData>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SecretResponse {
    pub secret: ProjectedSecret,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswersQuery {
    pub room_id: Uuid,
}

// -- Unlock --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UnlockRequest {
    pub question_id: Uuid,
    pub body: String,
    pub self_rating: i64,
    pub importance: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UnlockResponse {
    pub message: String,
    pub secret: ProjectedSecret,
}

// -- Rating --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RateRequest {
    pub rating: i64,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateResponse {
    pub message: String,
    pub avg_rating: f64,
}

// -- Errors --

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}
