//! The mutation orchestrator.
//!
//! Sequences every tenant-scoped write the same way: resolve scope, apply the
//! mutation through the store collaborator, then hand audit and fan-out to the
//! side-effect queue. The response is final as soon as the store answers;
//! nothing after the mutation can change it.

use axum::{http::StatusCode, response::IntoResponse, response::Response, Json};
use serde::Serialize;
use std::future::Future;
use std::net::IpAddr;
use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::audit::Actor;
use crate::effects::{SideEffectJob, SideEffectQueue};
use crate::error::{ApiError, ApiSuccess};
use crate::models::{MutationAction, ResourceType, ScopeDecision, Session};
use crate::scope::ScopeResolver;
use crate::store::StoreError;
use crate::telemetry::record_mutation;

/// One mutation as seen by the orchestrator, independent of entity schema.
#[derive(Debug, Clone)]
pub struct MutationRequest {
    pub action: MutationAction,
    /// Branch the caller asked to act on, straight from the request. The scope
    /// resolver decides what becomes effective; this value is never trusted
    /// past that point.
    pub requested_branch: Option<Uuid>,
    pub caller_addr: Option<IpAddr>,
}

/// What the mutate closure reports back on success. `branch_id` is the
/// resource's branch as echoed by the store, not the raw request input.
#[derive(Debug)]
pub struct Mutated<T> {
    pub resource: T,
    pub resource_id: Uuid,
    pub branch_id: Option<Uuid>,
    /// Display name used in notification summaries; for deletions this is the
    /// pre-deletion name.
    pub resource_name: String,
    /// The payload actually applied: the diff for updates, the snapshot for
    /// deletions.
    pub details: serde_json::Value,
}

/// Terminal pipeline states.
#[derive(Debug)]
pub enum MutationOutcome<T> {
    Denied {
        reason: &'static str,
    },
    NotFound,
    Failed,
    Success {
        resource: T,
        message: String,
        created: bool,
    },
}

#[derive(Clone)]
pub struct MutationOrchestrator {
    effects: SideEffectQueue,
}

impl MutationOrchestrator {
    pub fn new(effects: SideEffectQueue) -> Self {
        Self { effects }
    }

    /// Runs one mutation through the pipeline. `mutate` is the store operation
    /// supplied by the endpoint handler; it receives the effective branch id
    /// and must substitute it wherever the entity schema carries a branch.
    #[instrument(
        skip(self, session, request, mutate),
        fields(action = %request.action, user_id = %session.user_id)
    )]
    pub async fn execute<T, F, Fut>(
        &self,
        session: &Session,
        request: MutationRequest,
        mutate: F,
    ) -> MutationOutcome<T>
    where
        F: FnOnce(Option<Uuid>) -> Fut,
        Fut: Future<Output = Result<Mutated<T>, StoreError>>,
    {
        let action = request.action;

        // Fail fast: no side effects of any kind before scope approval.
        let effective_branch =
            match ScopeResolver::resolve(session, action, request.requested_branch) {
                ScopeDecision::Denied { reason } => {
                    info!(reason, "Mutation denied by scope resolver");
                    record_mutation(action.as_str(), "denied");
                    return MutationOutcome::Denied { reason };
                }
                ScopeDecision::Allowed { branch_id } => branch_id,
            };

        let mutated = match mutate(effective_branch).await {
            Ok(mutated) => mutated,
            Err(StoreError::NotFound) => {
                record_mutation(action.as_str(), "not_found");
                return MutationOutcome::NotFound;
            }
            Err(e) => {
                // Reported as a generic failure; store internals stay in the logs.
                error!(error = %e, "Store mutation failed");
                record_mutation(action.as_str(), "failed");
                return MutationOutcome::Failed;
            }
        };

        // The response below is already decided; audit and fan-out only need
        // to be initiated before it goes out.
        self.effects.enqueue(SideEffectJob {
            actor: Actor {
                user_id: session.user_id,
                display_name: session.display_name.clone(),
            },
            action,
            resource_type: action.resource_type(),
            resource_id: mutated.resource_id,
            resource_name: mutated.resource_name,
            branch_id: mutated.branch_id,
            details: mutated.details,
            caller_addr: request.caller_addr,
        });

        record_mutation(action.as_str(), "success");

        let noun = match action.resource_type() {
            ResourceType::Member => "Member",
            ResourceType::Lead => "Lead",
            ResourceType::Staff => "Staff",
        };

        MutationOutcome::Success {
            resource: mutated.resource,
            message: format!("{} {}", noun, action.verb()),
            created: action.verb() == "created",
        }
    }
}

impl<T: Serialize> IntoResponse for MutationOutcome<T> {
    fn into_response(self) -> Response {
        match self {
            MutationOutcome::Denied { reason } => {
                ApiError::forbidden(reason, "SCOPE_DENIED").into_response()
            }
            MutationOutcome::NotFound => {
                ApiError::not_found("Resource not found", "NOT_FOUND").into_response()
            }
            MutationOutcome::Failed => {
                ApiError::internal("Mutation failed", "MUTATION_FAILED").into_response()
            }
            MutationOutcome::Success {
                resource,
                message,
                created,
            } => {
                let status = if created {
                    StatusCode::CREATED
                } else {
                    StatusCode::OK
                };
                (status, Json(ApiSuccess::with_message(resource, message))).into_response()
            }
        }
    }
}
