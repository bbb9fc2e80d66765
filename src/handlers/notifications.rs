//! Notification inbox read surface.
//!
//! A caller only ever sees their own inbox. Read/unread toggling belongs to
//! the recipient-facing application, not this service.

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::{ApiError, ApiResult},
    helpers::store_read_error,
    models::Session,
    notify::Notification,
    pagination::{PaginationMeta, PaginationParams},
    AppState,
};

#[derive(Debug, Serialize, ToSchema)]
pub struct NotificationListResponse {
    pub success: bool,
    pub data: Vec<Notification>,
    pub pagination: PaginationMeta,
}

#[utoipa::path(
    get,
    path = "/notifications",
    tag = "Notifications",
    params(PaginationParams),
    responses(
        (status = 200, description = "The caller's notifications, newest first", body = NotificationListResponse),
        (status = 401, description = "Missing or invalid session", body = ApiError),
        (status = 500, description = "Store error", body = ApiError)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_notifications(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Query(pagination): Query<PaginationParams>,
) -> ApiResult<Json<NotificationListResponse>> {
    let inbox = state
        .stores
        .notifications
        .list_for(session.user_id)
        .await
        .map_err(store_read_error)?;

    Ok(Json(NotificationListResponse {
        success: true,
        data: pagination.slice(&inbox),
        pagination: pagination.into_metadata(inbox.len()),
    }))
}
