//! OpenAPI documentation configuration.
//!
//! Generates the OpenAPI specification with `utoipa` and serves it via
//! Swagger UI at `/swagger-ui`.

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::error::{ApiError, LeadEnvelope, MemberEnvelope, StaffEnvelope};
use crate::pagination::PaginationMeta;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Turnstile API",
        version = "1.0.0",
        description = "Branch-scoped mutation pipeline for a multi-branch gym platform.\n\n\
        ## Write pipeline\n\
        Every mutating endpoint runs the same three stages:\n\
        1. Scope resolution - the caller's role and home branch decide whether the\n\
           target branch may be touched; cross-branch requests are rejected with 403.\n\
        2. Mutation - the store applies the change; 404 and store failures end the\n\
           request with no side effects.\n\
        3. Audit and fan-out - on success an immutable audit entry is appended and\n\
           the branch's administrators are notified, best-effort, off the request path.\n\n\
        ## Authentication\n\
        Sessions are issued by the external auth service. Include the bearer token\n\
        in requests: `Authorization: Bearer <token>`. Super admins act on any\n\
        branch; branch admins only on their own.",
        contact(
            name = "Turnstile API Support"
        ),
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "/", description = "Current server")
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Members", description = "Branch member management"),
        (name = "Leads", description = "Lead management and assignment"),
        (name = "Staff", description = "Branch staff management"),
        (name = "Audit", description = "Branch-scoped audit trail"),
        (name = "Notifications", description = "The caller's notification inbox")
    ),
    paths(
        crate::handlers::health::health_check_simple,
        crate::handlers::health::health_check,
        crate::handlers::health::ready_check,
        crate::handlers::health::live_check,

        crate::handlers::members::create_member,
        crate::handlers::members::update_member,
        crate::handlers::members::delete_member,
        crate::handlers::members::list_members,

        crate::handlers::leads::create_lead,
        crate::handlers::leads::update_lead,
        crate::handlers::leads::assign_lead,
        crate::handlers::leads::delete_lead,
        crate::handlers::leads::list_leads,

        crate::handlers::staff::create_staff,
        crate::handlers::staff::update_staff,
        crate::handlers::staff::delete_staff,
        crate::handlers::staff::list_staff,

        crate::handlers::audit_log::list_audit_entries,
        crate::handlers::notifications::list_notifications,
    ),
    components(
        schemas(
            ApiError,
            MemberEnvelope,
            LeadEnvelope,
            StaffEnvelope,
            PaginationMeta,

            crate::models::Role,
            crate::models::ResourceType,
            crate::models::MutationAction,
            crate::models::AuditEntry,

            crate::models::Member,
            crate::models::MemberPatch,
            crate::handlers::members::CreateMemberRequest,
            crate::handlers::members::MemberListResponse,

            crate::models::Lead,
            crate::models::LeadPatch,
            crate::models::LeadStatus,
            crate::handlers::leads::CreateLeadRequest,
            crate::handlers::leads::AssignLeadRequest,
            crate::handlers::leads::LeadListResponse,

            crate::models::Staff,
            crate::models::StaffPatch,
            crate::handlers::staff::CreateStaffRequest,
            crate::handlers::staff::StaffListResponse,

            crate::notify::Notification,
            crate::notify::NotificationKind,
            crate::notify::NotificationPriority,
            crate::handlers::audit_log::AuditListResponse,
            crate::handlers::notifications::NotificationListResponse,

            crate::handlers::health::HealthResponse,
            crate::handlers::health::ReadinessResponse,
            crate::handlers::health::ReadinessChecks,
            crate::handlers::health::ComponentStatus,
        )
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some(
                            "Session token issued by the external auth service.\n\
                            Include in requests as: `Authorization: Bearer <token>`",
                        ))
                        .build(),
                ),
            );
        }

        openapi.security = Some(vec![]);
    }
}

pub fn swagger_router() -> Router {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .into()
}
