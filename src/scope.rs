//! Branch-scoped authorization.
//!
//! Every mutation passes through [`ScopeResolver::resolve`] before anything
//! else runs. Denial is a typed outcome, not an error: the orchestrator turns
//! it into a 403 envelope with zero side effects.

use tracing::debug;
use uuid::Uuid;

use crate::models::{MutationAction, Role, ScopeDecision, Session};

pub const DENY_ROLE: &str = "forbidden - role may not perform this action";
pub const DENY_CROSS_BRANCH: &str = "forbidden - cross-branch access";
pub const DENY_NO_HOME_BRANCH: &str = "forbidden - caller has no home branch";

#[derive(Debug, Clone, Copy)]
pub struct ScopeResolver;

impl ScopeResolver {
    /// Decides whether `session` may perform `action` against
    /// `requested_branch`, and which branch id the mutation must be recorded
    /// against.
    ///
    /// A `branch_admin` never gets a branch silently substituted: a
    /// caller-supplied branch that differs from the home branch is rejected
    /// explicitly, and only an absent branch (resource creation) defaults to
    /// the home branch.
    pub fn resolve(
        session: &Session,
        action: MutationAction,
        requested_branch: Option<Uuid>,
    ) -> ScopeDecision {
        if !action.allowed_roles().contains(&session.role) {
            debug!(user_id = %session.user_id, role = %session.role, action = %action, "Scope denied: role not allowed");
            return ScopeDecision::Denied { reason: DENY_ROLE };
        }

        match session.role {
            Role::SuperAdmin => ScopeDecision::Allowed {
                branch_id: requested_branch,
            },
            Role::BranchAdmin => {
                let Some(home) = session.branch_id else {
                    return ScopeDecision::Denied {
                        reason: DENY_NO_HOME_BRANCH,
                    };
                };
                match requested_branch {
                    Some(requested) if requested != home => {
                        debug!(
                            user_id = %session.user_id,
                            home_branch = %home,
                            requested_branch = %requested,
                            "Scope denied: cross-branch request"
                        );
                        ScopeDecision::Denied {
                            reason: DENY_CROSS_BRANCH,
                        }
                    }
                    _ => ScopeDecision::Allowed {
                        branch_id: Some(home),
                    },
                }
            }
            Role::Member => ScopeDecision::Denied { reason: DENY_ROLE },
        }
    }

    /// Branch scoping for read surfaces (audit trail, entity lists). Same
    /// branch rules as mutations; members have no admin read surface.
    pub fn read_scope(session: &Session, requested_branch: Option<Uuid>) -> ScopeDecision {
        match session.role {
            Role::SuperAdmin => ScopeDecision::Allowed {
                branch_id: requested_branch,
            },
            Role::BranchAdmin => match (session.branch_id, requested_branch) {
                (None, _) => ScopeDecision::Denied {
                    reason: DENY_NO_HOME_BRANCH,
                },
                (Some(home), Some(requested)) if requested != home => ScopeDecision::Denied {
                    reason: DENY_CROSS_BRANCH,
                },
                (Some(home), _) => ScopeDecision::Allowed {
                    branch_id: Some(home),
                },
            },
            Role::Member => ScopeDecision::Denied { reason: DENY_ROLE },
        }
    }
}
