//! Shared helper functions for handlers.

use axum::{http::StatusCode, Json};
use tracing::error;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::{ScopeDecision, Session};
use crate::scope::ScopeResolver;
use crate::store::StoreError;

/// Resolves the branch a read surface is allowed to query, or the 403 envelope.
pub fn read_branch(
    session: &Session,
    requested: Option<Uuid>,
) -> Result<Option<Uuid>, (StatusCode, Json<ApiError>)> {
    match ScopeResolver::read_scope(session, requested) {
        ScopeDecision::Allowed { branch_id } => Ok(branch_id),
        ScopeDecision::Denied { reason } => Err(ApiError::forbidden(reason, "SCOPE_DENIED")),
    }
}

pub fn store_read_error(e: StoreError) -> (StatusCode, Json<ApiError>) {
    error!(error = %e, "Store read failed");
    ApiError::internal("Store error", "STORE_ERROR")
}
