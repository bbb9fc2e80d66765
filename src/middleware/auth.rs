//! Authentication middleware.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::ApiError;
use crate::AppState;

/// Verifies the bearer token and stores the resulting [`crate::models::Session`]
/// in request extensions. Handlers downstream receive the session as an
/// explicit value; there is no ambient current-user lookup anywhere.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, Response> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| {
            ApiError::unauthorized("Missing authorization header", "MISSING_AUTH_HEADER")
                .into_response()
        })?;

    let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
        ApiError::unauthorized("Invalid authorization header format", "INVALID_AUTH_FORMAT")
            .into_response()
    })?;

    let session = state.verifier.verify(token).map_err(|_| {
        ApiError::unauthorized("Invalid or expired session token", "INVALID_TOKEN").into_response()
    })?;

    req.extensions_mut().insert(session);
    Ok(next.run(req).await)
}
