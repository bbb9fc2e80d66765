//! Audit trail read surface.
//!
//! Read-only: entries are appended by the pipeline and never modified here.
//! The same branch rules as mutations apply, so a branch admin can only read
//! their own branch's trail.

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::{ApiError, ApiResult},
    helpers::{read_branch, store_read_error},
    models::{AuditEntry, Session},
    pagination::{PaginationMeta, PaginationParams},
    AppState,
};

use super::BranchQuery;

#[derive(Debug, Serialize, ToSchema)]
pub struct AuditListResponse {
    pub success: bool,
    pub data: Vec<AuditEntry>,
    pub pagination: PaginationMeta,
}

#[utoipa::path(
    get,
    path = "/audit",
    tag = "Audit",
    params(BranchQuery, PaginationParams),
    responses(
        (status = 200, description = "Paginated audit trail of the scoped branch, newest first", body = AuditListResponse),
        (status = 403, description = "Scope denied", body = ApiError),
        (status = 500, description = "Store error", body = ApiError)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_audit_entries(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Query(filter): Query<BranchQuery>,
    Query(pagination): Query<PaginationParams>,
) -> ApiResult<Json<AuditListResponse>> {
    let branch = read_branch(&session, filter.branch_id)?;

    let entries = state
        .stores
        .audit
        .list(branch)
        .await
        .map_err(store_read_error)?;

    Ok(Json(AuditListResponse {
        success: true,
        data: pagination.slice(&entries),
        pagination: pagination.into_metadata(entries.len()),
    }))
}
