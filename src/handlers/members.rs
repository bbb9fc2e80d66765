//! Member management handlers.

use axum::{
    extract::{ConnectInfo, Path, Query, State},
    Extension, Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    helpers::{read_branch, store_read_error},
    models::{Member, MemberPatch, MutationAction, Session},
    pagination::{PaginationMeta, PaginationParams},
    pipeline::{Mutated, MutationOutcome, MutationRequest},
    store::StoreError,
    AppState,
};

use super::BranchQuery;

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreateMemberRequest {
    #[schema(example = "Mira Petrov")]
    pub full_name: String,
    #[schema(example = "mira@example.com")]
    pub email: String,
    pub phone: Option<String>,
    /// Required for callers without a home branch; must match the caller's
    /// home branch otherwise.
    pub branch_id: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MemberListResponse {
    pub success: bool,
    pub data: Vec<Member>,
    pub pagination: PaginationMeta,
}

#[utoipa::path(
    post,
    path = "/members",
    tag = "Members",
    request_body = CreateMemberRequest,
    responses(
        (status = 201, description = "Member created", body = crate::error::MemberEnvelope),
        (status = 400, description = "Invalid payload", body = ApiError),
        (status = 403, description = "Scope denied", body = ApiError),
        (status = 500, description = "Mutation failed", body = ApiError)
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_member(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(payload): Json<CreateMemberRequest>,
) -> ApiResult<MutationOutcome<Member>> {
    if payload.full_name.trim().len() < 2 {
        return Err(ApiError::bad_request(
            "Member name must be at least 2 characters",
            "NAME_TOO_SHORT",
        ));
    }
    if !payload.email.contains('@') {
        return Err(ApiError::bad_request(
            "Invalid email address",
            "INVALID_EMAIL",
        ));
    }
    if payload.branch_id.is_none() && session.branch_id.is_none() {
        return Err(ApiError::bad_request(
            "branch_id is required",
            "BRANCH_REQUIRED",
        ));
    }

    let request = MutationRequest {
        action: MutationAction::CreateMember,
        requested_branch: payload.branch_id,
        caller_addr: Some(addr.ip()),
    };
    let details = serde_json::json!({
        "full_name": payload.full_name,
        "email": payload.email,
        "phone": payload.phone,
    });

    let members = state.stores.members.clone();
    let outcome = state
        .orchestrator
        .execute(&session, request, move |branch| async move {
            let Some(branch_id) = branch else {
                return Err(StoreError::Conflict("member requires a branch".to_string()));
            };
            let created = members
                .create(Member {
                    id: Uuid::new_v4(),
                    branch_id,
                    full_name: payload.full_name,
                    email: payload.email,
                    phone: payload.phone,
                    joined_at: Utc::now(),
                })
                .await?;
            Ok(Mutated {
                resource_id: created.id,
                branch_id: Some(created.branch_id),
                resource_name: created.full_name.clone(),
                details,
                resource: created,
            })
        })
        .await;

    Ok(outcome)
}

#[utoipa::path(
    put,
    path = "/members/{id}",
    tag = "Members",
    request_body = MemberPatch,
    responses(
        (status = 200, description = "Member updated", body = crate::error::MemberEnvelope),
        (status = 403, description = "Scope denied", body = ApiError),
        (status = 404, description = "Member not found", body = ApiError),
        (status = 500, description = "Mutation failed", body = ApiError)
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_member(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Path(id): Path<Uuid>,
    Json(patch): Json<MemberPatch>,
) -> ApiResult<MutationOutcome<Member>> {
    // Scope is checked against the branch the member actually belongs to.
    let current = state
        .stores
        .members
        .find(id)
        .await
        .map_err(|_| ApiError::not_found("Member not found", "NOT_FOUND"))?;

    let request = MutationRequest {
        action: MutationAction::UpdateMember,
        requested_branch: Some(current.branch_id),
        caller_addr: Some(addr.ip()),
    };
    let details = serde_json::to_value(&patch).unwrap_or_default();

    let members = state.stores.members.clone();
    let outcome = state
        .orchestrator
        .execute(&session, request, move |_branch| async move {
            let updated = members.update(id, patch).await?;
            Ok(Mutated {
                resource_id: updated.id,
                branch_id: Some(updated.branch_id),
                resource_name: updated.full_name.clone(),
                details,
                resource: updated,
            })
        })
        .await;

    Ok(outcome)
}

#[utoipa::path(
    delete,
    path = "/members/{id}",
    tag = "Members",
    responses(
        (status = 200, description = "Member deleted", body = crate::error::MemberEnvelope),
        (status = 403, description = "Scope denied", body = ApiError),
        (status = 404, description = "Member not found", body = ApiError),
        (status = 500, description = "Mutation failed", body = ApiError)
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_member(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Path(id): Path<Uuid>,
) -> ApiResult<MutationOutcome<Member>> {
    let current = state
        .stores
        .members
        .find(id)
        .await
        .map_err(|_| ApiError::not_found("Member not found", "NOT_FOUND"))?;

    let request = MutationRequest {
        action: MutationAction::DeleteMember,
        requested_branch: Some(current.branch_id),
        caller_addr: Some(addr.ip()),
    };
    // Audit the state captured at lookup time; after the delete nothing is left
    // to re-read.
    let snapshot = serde_json::to_value(&current).unwrap_or_default();

    let members = state.stores.members.clone();
    let outcome = state
        .orchestrator
        .execute(&session, request, move |_branch| async move {
            let deleted = members.delete(id).await?;
            Ok(Mutated {
                resource_id: deleted.id,
                branch_id: Some(deleted.branch_id),
                resource_name: deleted.full_name.clone(),
                details: snapshot,
                resource: deleted,
            })
        })
        .await;

    Ok(outcome)
}

#[utoipa::path(
    get,
    path = "/members",
    tag = "Members",
    params(BranchQuery, PaginationParams),
    responses(
        (status = 200, description = "Paginated members of the scoped branch", body = MemberListResponse),
        (status = 403, description = "Scope denied", body = ApiError),
        (status = 500, description = "Store error", body = ApiError)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_members(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Query(filter): Query<BranchQuery>,
    Query(pagination): Query<PaginationParams>,
) -> ApiResult<Json<MemberListResponse>> {
    let branch = read_branch(&session, filter.branch_id)?;

    let members = state
        .stores
        .members
        .list(branch)
        .await
        .map_err(store_read_error)?;

    Ok(Json(MemberListResponse {
        success: true,
        data: pagination.slice(&members),
        pagination: pagination.into_metadata(members.len()),
    }))
}
