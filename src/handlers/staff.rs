//! Staff management handlers.

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
    models::{MutationAction, Session, Staff, StaffPatch},
    pagination::{PaginationMeta, PaginationParams},
    pipeline::{Mutated, MutationOutcome, MutationRequest},
    store::StoreError,
    AppState,
};

use super::BranchQuery;

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreateStaffRequest {
    #[schema(example = "Dana Ilic")]
    pub full_name: String,
    #[schema(example = "dana@example.com")]
    pub email: String,
    #[schema(example = "trainer")]
    pub position: String,
    pub branch_id: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StaffListResponse {
    pub success: bool,
    pub data: Vec<Staff>,
    pub pagination: PaginationMeta,
}

#[utoipa::path(
    post,
    path = "/staff",
    tag = "Staff",
    request_body = CreateStaffRequest,
    responses(
        (status = 201, description = "Staff created", body = crate::error::StaffEnvelope),
        (status = 400, description = "Invalid payload", body = ApiError),
        (status = 403, description = "Scope denied", body = ApiError),
        (status = 500, description = "Mutation failed", body = ApiError)
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_staff(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(payload): Json<CreateStaffRequest>,
) -> ApiResult<MutationOutcome<Staff>> {
    if payload.full_name.trim().len() < 2 {
        return Err(ApiError::bad_request(
            "Staff name must be at least 2 characters",
            "NAME_TOO_SHORT",
        ));
    }
    if !payload.email.contains('@') {
        return Err(ApiError::bad_request(
            "Invalid email address",
            "INVALID_EMAIL",
        ));
    }
    if payload.position.trim().is_empty() {
        return Err(ApiError::bad_request(
            "Staff position is required",
            "POSITION_REQUIRED",
        ));
    }
    if payload.branch_id.is_none() && session.branch_id.is_none() {
        return Err(ApiError::bad_request(
            "branch_id is required",
            "BRANCH_REQUIRED",
        ));
    }

    let request = MutationRequest {
        action: MutationAction::CreateStaff,
        requested_branch: payload.branch_id,
        caller_addr: Some(addr.ip()),
    };
    let details = serde_json::json!({
        "full_name": payload.full_name,
        "email": payload.email,
        "position": payload.position,
    });

    let staff = state.stores.staff.clone();
    let outcome = state
        .orchestrator
        .execute(&session, request, move |branch| async move {
            let Some(branch_id) = branch else {
                return Err(StoreError::Conflict("staff requires a branch".to_string()));
            };
            let created = staff
                .create(Staff {
                    id: Uuid::new_v4(),
                    branch_id,
                    full_name: payload.full_name,
                    email: payload.email,
                    position: payload.position,
                    active: true,
                    hired_at: Utc::now(),
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
    path = "/staff/{id}",
    tag = "Staff",
    request_body = StaffPatch,
    responses(
        (status = 200, description = "Staff updated", body = crate::error::StaffEnvelope),
        (status = 403, description = "Scope denied", body = ApiError),
        (status = 404, description = "Staff not found", body = ApiError),
        (status = 500, description = "Mutation failed", body = ApiError)
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_staff(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Path(id): Path<Uuid>,
    Json(patch): Json<StaffPatch>,
) -> ApiResult<MutationOutcome<Staff>> {
    let current = state
        .stores
        .staff
        .find(id)
        .await
        .map_err(|_| ApiError::not_found("Staff not found", "NOT_FOUND"))?;

    let request = MutationRequest {
        action: MutationAction::UpdateStaff,
        requested_branch: Some(current.branch_id),
        caller_addr: Some(addr.ip()),
    };
    let details = serde_json::to_value(&patch).unwrap_or_default();

    let staff = state.stores.staff.clone();
    let outcome = state
        .orchestrator
        .execute(&session, request, move |_branch| async move {
            let updated = staff.update(id, patch).await?;
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
    path = "/staff/{id}",
    tag = "Staff",
    responses(
        (status = 200, description = "Staff deleted", body = crate::error::StaffEnvelope),
        (status = 403, description = "Scope denied", body = ApiError),
        (status = 404, description = "Staff not found", body = ApiError),
        (status = 500, description = "Mutation failed", body = ApiError)
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_staff(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Path(id): Path<Uuid>,
) -> ApiResult<MutationOutcome<Staff>> {
    let current = state
        .stores
        .staff
        .find(id)
        .await
        .map_err(|_| ApiError::not_found("Staff not found", "NOT_FOUND"))?;

    let request = MutationRequest {
        action: MutationAction::DeleteStaff,
        requested_branch: Some(current.branch_id),
        caller_addr: Some(addr.ip()),
    };
    let snapshot = serde_json::to_value(&current).unwrap_or_default();

    let staff = state.stores.staff.clone();
    let outcome = state
        .orchestrator
        .execute(&session, request, move |_branch| async move {
            let deleted = staff.delete(id).await?;
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
    path = "/staff",
    tag = "Staff",
    params(BranchQuery, PaginationParams),
    responses(
        (status = 200, description = "Paginated staff of the scoped branch", body = StaffListResponse),
        (status = 403, description = "Scope denied", body = ApiError),
        (status = 500, description = "Store error", body = ApiError)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_staff(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Query(filter): Query<BranchQuery>,
    Query(pagination): Query<PaginationParams>,
) -> ApiResult<Json<StaffListResponse>> {
    let branch = read_branch(&session, filter.branch_id)?;

    let staff = state
        .stores
        .staff
        .list(branch)
        .await
        .map_err(store_read_error)?;

    Ok(Json(StaffListResponse {
        success: true,
        data: pagination.slice(&staff),
        pagination: pagination.into_metadata(staff.len()),
    }))
}
