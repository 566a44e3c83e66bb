use axum::{
    Json, Router, middleware,
    response::IntoResponse,
    routing::{get, post},
};

use crate::middleware::require_auth;
use crate::state::AppState;
use crate::{questions, rooms, secrets};

pub fn router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/secrets", post(secrets::submit_answer))
        .route(
            "/secrets/{secret_id}",
            get(secrets::get_secret).delete(secrets::hide_secret),
        )
        .route("/secrets/{secret_id}/unlock", post(secrets::unlock_secret))
        .route("/secrets/{secret_id}/rate", post(secrets::rate_secret))
        .route("/rooms/{room_id}/secrets", get(rooms::list_secrets))
        .route("/questions/{question_id}/answers", get(questions::list_answers))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .with_state(state);

    Router::new()
        .route("/health", get(health))
        .merge(protected_routes)
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}
