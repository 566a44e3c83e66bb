use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use spill_core::SpillError;
use spill_types::api::ErrorBody;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Core(#[from] SpillError),

    #[error("internal server error")]
    Internal,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Core(err) => status_for(err),
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn status_for(err: &SpillError) -> StatusCode {
    match err {
        SpillError::InvalidAnswer(_)
        | SpillError::InvalidRating(_)
        | SpillError::InsufficientRating { .. }
        | SpillError::SelfUnlockForbidden
        | SpillError::AlreadyUnlocked
        | SpillError::SelfRatingForbidden => StatusCode::BAD_REQUEST,
        SpillError::NotAMember
        | SpillError::NotUnlocked
        | SpillError::MustAnswerFirst
        | SpillError::NotAuthor => StatusCode::FORBIDDEN,
        SpillError::NotFound(_) => StatusCode::NOT_FOUND,
        SpillError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            Self::Core(SpillError::Storage(e)) => {
                error!("Storage failure: {:#}", e);
                internal_body()
            }
            Self::Core(err) => ErrorBody {
                error: err.kind().to_string(),
                message: err.to_string(),
            },
            Self::Internal => internal_body(),
        };
        (status, Json(body)).into_response()
    }
}

fn internal_body() -> ErrorBody {
    ErrorBody {
        error: "Internal".to_string(),
        message: "internal server error".to_string(),
    }
}
