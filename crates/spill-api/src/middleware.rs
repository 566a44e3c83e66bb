use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
    typed_header::TypedHeaderRejection,
};
use jsonwebtoken::{DecodingKey, Validation, decode};
use spill_types::api::Claims;
use tracing::debug;

use crate::state::AppState;

/// Validates the bearer JWT and stores its claims in request extensions.
/// Tokens are minted by the identity service with the shared secret.
pub async fn require_auth(
    State(state): State<AppState>,
    bearer: Result<TypedHeader<Authorization<Bearer>>, TypedHeaderRejection>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let TypedHeader(Authorization(bearer)) = bearer.map_err(|_| StatusCode::UNAUTHORIZED)?;

    let token_data = decode::<Claims>(
        bearer.token(),
        &DecodingKey::from_secret(state.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| {
        debug!("Rejected bearer token: {}", e);
        StatusCode::UNAUTHORIZED
    })?;

    req.extensions_mut().insert(token_data.claims);
    Ok(next.run(req).await)
}
