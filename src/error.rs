//! The uniform response envelope.
//!
//! Every outcome crosses the wire as `{ success, data?, message?, error?, code? }`.

use axum::{http::StatusCode, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::models::{Lead, Member, Staff};

/// Failure envelope: `success` is always `false`.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiError {
    pub success: bool,
    pub error: String,
    pub code: String,
}

impl ApiError {
    pub fn new(error: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            code: code.into(),
        }
    }

    pub fn bad_request(
        error: impl Into<String>,
        code: impl Into<String>,
    ) -> (StatusCode, Json<Self>) {
        (StatusCode::BAD_REQUEST, Json(Self::new(error, code)))
    }

    pub fn unauthorized(
        error: impl Into<String>,
        code: impl Into<String>,
    ) -> (StatusCode, Json<Self>) {
        (StatusCode::UNAUTHORIZED, Json(Self::new(error, code)))
    }

    pub fn forbidden(
        error: impl Into<String>,
        code: impl Into<String>,
    ) -> (StatusCode, Json<Self>) {
        (StatusCode::FORBIDDEN, Json(Self::new(error, code)))
    }

    pub fn not_found(
        error: impl Into<String>,
        code: impl Into<String>,
    ) -> (StatusCode, Json<Self>) {
        (StatusCode::NOT_FOUND, Json(Self::new(error, code)))
    }

    pub fn internal(error: impl Into<String>, code: impl Into<String>) -> (StatusCode, Json<Self>) {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(Self::new(error, code)),
        )
    }
}

pub type ApiResult<T> = Result<T, (StatusCode, Json<ApiError>)>;

/// Success envelope: `success` is always `true`.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiSuccess<T> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

pub type MemberEnvelope = ApiSuccess<Member>;
pub type LeadEnvelope = ApiSuccess<Lead>;
pub type StaffEnvelope = ApiSuccess<Staff>;

impl<T: Serialize> ApiSuccess<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
            message: None,
        }
    }

    pub fn with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data,
            message: Some(message.into()),
        }
    }
}
