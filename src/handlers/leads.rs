//! Lead management handlers.

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
    models::{Lead, LeadPatch, LeadStatus, MutationAction, Session},
    pagination::{PaginationMeta, PaginationParams},
    pipeline::{Mutated, MutationOutcome, MutationRequest},
    store::StoreError,
    AppState,
};

use super::BranchQuery;

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreateLeadRequest {
    #[schema(example = "Jon Aker")]
    pub full_name: String,
    #[schema(example = "+385911111111")]
    pub phone: String,
    #[schema(example = "walk_in")]
    pub source: Option<String>,
    pub branch_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct AssignLeadRequest {
    /// Staff member taking over follow-up.
    pub staff_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LeadListResponse {
    pub success: bool,
    pub data: Vec<Lead>,
    pub pagination: PaginationMeta,
}

#[utoipa::path(
    post,
    path = "/leads",
    tag = "Leads",
    request_body = CreateLeadRequest,
    responses(
        (status = 201, description = "Lead created", body = crate::error::LeadEnvelope),
        (status = 400, description = "Invalid payload", body = ApiError),
        (status = 403, description = "Scope denied", body = ApiError),
        (status = 500, description = "Mutation failed", body = ApiError)
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_lead(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(payload): Json<CreateLeadRequest>,
) -> ApiResult<MutationOutcome<Lead>> {
    if payload.full_name.trim().len() < 2 {
        return Err(ApiError::bad_request(
            "Lead name must be at least 2 characters",
            "NAME_TOO_SHORT",
        ));
    }
    if payload.phone.trim().is_empty() {
        return Err(ApiError::bad_request(
            "Lead phone is required",
            "PHONE_REQUIRED",
        ));
    }
    if payload.branch_id.is_none() && session.branch_id.is_none() {
        return Err(ApiError::bad_request(
            "branch_id is required",
            "BRANCH_REQUIRED",
        ));
    }

    let request = MutationRequest {
        action: MutationAction::CreateLead,
        requested_branch: payload.branch_id,
        caller_addr: Some(addr.ip()),
    };
    let details = serde_json::json!({
        "full_name": payload.full_name,
        "phone": payload.phone,
        "source": payload.source,
    });

    let leads = state.stores.leads.clone();
    let outcome = state
        .orchestrator
        .execute(&session, request, move |branch| async move {
            let Some(branch_id) = branch else {
                return Err(StoreError::Conflict("lead requires a branch".to_string()));
            };
            let created = leads
                .create(Lead {
                    id: Uuid::new_v4(),
                    branch_id,
                    full_name: payload.full_name,
                    phone: payload.phone,
                    source: payload.source,
                    status: LeadStatus::New,
                    assigned_to: None,
                    created_at: Utc::now(),
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
    path = "/leads/{id}",
    tag = "Leads",
    request_body = LeadPatch,
    responses(
        (status = 200, description = "Lead updated", body = crate::error::LeadEnvelope),
        (status = 403, description = "Scope denied", body = ApiError),
        (status = 404, description = "Lead not found", body = ApiError),
        (status = 500, description = "Mutation failed", body = ApiError)
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_lead(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Path(id): Path<Uuid>,
    Json(patch): Json<LeadPatch>,
) -> ApiResult<MutationOutcome<Lead>> {
    let current = state
        .stores
        .leads
        .find(id)
        .await
        .map_err(|_| ApiError::not_found("Lead not found", "NOT_FOUND"))?;

    let request = MutationRequest {
        action: MutationAction::UpdateLead,
        requested_branch: Some(current.branch_id),
        caller_addr: Some(addr.ip()),
    };
    let details = serde_json::to_value(&patch).unwrap_or_default();

    let leads = state.stores.leads.clone();
    let outcome = state
        .orchestrator
        .execute(&session, request, move |_branch| async move {
            let updated = leads.update(id, patch).await?;
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
    put,
    path = "/leads/{id}/assign",
    tag = "Leads",
    request_body = AssignLeadRequest,
    responses(
        (status = 200, description = "Lead assigned", body = crate::error::LeadEnvelope),
        (status = 403, description = "Scope denied", body = ApiError),
        (status = 404, description = "Lead not found", body = ApiError),
        (status = 500, description = "Mutation failed", body = ApiError)
    ),
    security(("bearer_auth" = []))
)]
pub async fn assign_lead(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AssignLeadRequest>,
) -> ApiResult<MutationOutcome<Lead>> {
    let current = state
        .stores
        .leads
        .find(id)
        .await
        .map_err(|_| ApiError::not_found("Lead not found", "NOT_FOUND"))?;

    let request = MutationRequest {
        action: MutationAction::AssignLead,
        requested_branch: Some(current.branch_id),
        caller_addr: Some(addr.ip()),
    };
    let details = serde_json::json!({ "assigned_to": payload.staff_id });

    let leads = state.stores.leads.clone();
    let outcome = state
        .orchestrator
        .execute(&session, request, move |_branch| async move {
            let updated = leads
                .update(
                    id,
                    LeadPatch {
                        assigned_to: Some(payload.staff_id),
                        status: Some(LeadStatus::Contacted),
                        ..Default::default()
                    },
                )
                .await?;
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
    path = "/leads/{id}",
    tag = "Leads",
    responses(
        (status = 200, description = "Lead deleted", body = crate::error::LeadEnvelope),
        (status = 403, description = "Scope denied", body = ApiError),
        (status = 404, description = "Lead not found", body = ApiError),
        (status = 500, description = "Mutation failed", body = ApiError)
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_lead(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Path(id): Path<Uuid>,
) -> ApiResult<MutationOutcome<Lead>> {
    let current = state
        .stores
        .leads
        .find(id)
        .await
        .map_err(|_| ApiError::not_found("Lead not found", "NOT_FOUND"))?;

    let request = MutationRequest {
        action: MutationAction::DeleteLead,
        requested_branch: Some(current.branch_id),
        caller_addr: Some(addr.ip()),
    };
    let snapshot = serde_json::to_value(&current).unwrap_or_default();

    let leads = state.stores.leads.clone();
    let outcome = state
        .orchestrator
        .execute(&session, request, move |_branch| async move {
            let deleted = leads.delete(id).await?;
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
    path = "/leads",
    tag = "Leads",
    params(BranchQuery, PaginationParams),
    responses(
        (status = 200, description = "Paginated leads of the scoped branch", body = LeadListResponse),
        (status = 403, description = "Scope denied", body = ApiError),
        (status = 500, description = "Store error", body = ApiError)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_leads(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Query(filter): Query<BranchQuery>,
    Query(pagination): Query<PaginationParams>,
) -> ApiResult<Json<LeadListResponse>> {
    let branch = read_branch(&session, filter.branch_id)?;

    let leads = state
        .stores
        .leads
        .list(branch)
        .await
        .map_err(store_read_error)?;

    Ok(Json(LeadListResponse {
        success: true,
        data: pagination.slice(&leads),
        pagination: pagination.into_metadata(leads.len()),
    }))
}
