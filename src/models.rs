//! Domain model: caller identity, scope decisions, audit entries, and branch resources.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    SuperAdmin,
    BranchAdmin,
    Member,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "super_admin",
            Role::BranchAdmin => "branch_admin",
            Role::Member => "member",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Caller identity for one request. Produced by the external session provider,
/// verified and consumed here; immutable for the lifetime of the request.
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: Uuid,
    pub display_name: String,
    pub role: Role,
    /// Home branch. Present for `branch_admin` and `member`, absent for `super_admin`.
    pub branch_id: Option<Uuid>,
}

/// Outcome of authorization. Created once per request, never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeDecision {
    /// Approved. `branch_id` is the branch the mutation must be persisted and
    /// audited against; absent only for global resources touched by a super admin.
    Allowed { branch_id: Option<Uuid> },
    Denied { reason: &'static str },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    Member,
    Lead,
    Staff,
}

impl ResourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Member => "member",
            ResourceType::Lead => "lead",
            ResourceType::Staff => "staff",
        }
    }
}

impl std::fmt::Display for ResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Closed set of mutating operations that run through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MutationAction {
    CreateMember,
    UpdateMember,
    DeleteMember,
    CreateLead,
    UpdateLead,
    DeleteLead,
    AssignLead,
    CreateStaff,
    UpdateStaff,
    DeleteStaff,
}

impl MutationAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            MutationAction::CreateMember => "create_member",
            MutationAction::UpdateMember => "update_member",
            MutationAction::DeleteMember => "delete_member",
            MutationAction::CreateLead => "create_lead",
            MutationAction::UpdateLead => "update_lead",
            MutationAction::DeleteLead => "delete_lead",
            MutationAction::AssignLead => "assign_lead",
            MutationAction::CreateStaff => "create_staff",
            MutationAction::UpdateStaff => "update_staff",
            MutationAction::DeleteStaff => "delete_staff",
        }
    }

    pub fn resource_type(&self) -> ResourceType {
        match self {
            MutationAction::CreateMember
            | MutationAction::UpdateMember
            | MutationAction::DeleteMember => ResourceType::Member,
            MutationAction::CreateLead
            | MutationAction::UpdateLead
            | MutationAction::DeleteLead
            | MutationAction::AssignLead => ResourceType::Lead,
            MutationAction::CreateStaff
            | MutationAction::UpdateStaff
            | MutationAction::DeleteStaff => ResourceType::Staff,
        }
    }

    /// Roles permitted to perform this action. Enforced in one place by the
    /// scope resolver rather than per handler.
    pub fn allowed_roles(&self) -> &'static [Role] {
        &[Role::SuperAdmin, Role::BranchAdmin]
    }

    /// Past-tense verb for human-readable summaries.
    pub fn verb(&self) -> &'static str {
        match self {
            MutationAction::CreateMember
            | MutationAction::CreateLead
            | MutationAction::CreateStaff => "created",
            MutationAction::UpdateMember
            | MutationAction::UpdateLead
            | MutationAction::UpdateStaff => "updated",
            MutationAction::DeleteMember
            | MutationAction::DeleteLead
            | MutationAction::DeleteStaff => "deleted",
            MutationAction::AssignLead => "assigned",
        }
    }

    pub fn is_delete(&self) -> bool {
        matches!(
            self,
            MutationAction::DeleteMember | MutationAction::DeleteLead | MutationAction::DeleteStaff
        )
    }
}

impl std::fmt::Display for MutationAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One immutable audit fact. Append-only; the recorder assigns `recorded_at`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AuditEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub display_name: String,
    pub action: MutationAction,
    pub resource_type: ResourceType,
    pub resource_id: Uuid,
    /// Opaque payload describing the change: the applied diff for updates, the
    /// pre-deletion snapshot for deletes.
    #[schema(value_type = Object)]
    pub details: serde_json::Value,
    #[schema(value_type = Option<String>)]
    pub caller_addr: Option<IpAddr>,
    pub branch_id: Option<Uuid>,
    pub recorded_at: DateTime<Utc>,
}

/// A user as seen by the branch directory collaborator.
#[derive(Debug, Clone)]
pub struct DirectoryUser {
    pub id: Uuid,
    pub display_name: String,
    pub role: Role,
    pub branch_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Member {
    pub id: Uuid,
    pub branch_id: Uuid,
    #[schema(example = "Mira Petrov")]
    pub full_name: String,
    #[schema(example = "mira@example.com")]
    pub email: String,
    pub phone: Option<String>,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct MemberPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum LeadStatus {
    New,
    Contacted,
    Converted,
    Lost,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Lead {
    pub id: Uuid,
    pub branch_id: Uuid,
    #[schema(example = "Jon Aker")]
    pub full_name: String,
    pub phone: String,
    #[schema(example = "walk_in")]
    pub source: Option<String>,
    pub status: LeadStatus,
    /// Staff member currently responsible for follow-up.
    pub assigned_to: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct LeadPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<LeadStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Staff {
    pub id: Uuid,
    pub branch_id: Uuid,
    #[schema(example = "Dana Ilic")]
    pub full_name: String,
    pub email: String,
    #[schema(example = "trainer")]
    pub position: String,
    pub active: bool,
    pub hired_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct StaffPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_as_str() {
        assert_eq!(Role::SuperAdmin.as_str(), "super_admin");
        assert_eq!(Role::BranchAdmin.as_str(), "branch_admin");
        assert_eq!(Role::Member.as_str(), "member");
    }

    #[test]
    fn test_action_as_str() {
        assert_eq!(MutationAction::CreateMember.as_str(), "create_member");
        assert_eq!(MutationAction::UpdateLead.as_str(), "update_lead");
        assert_eq!(MutationAction::AssignLead.as_str(), "assign_lead");
        assert_eq!(MutationAction::DeleteStaff.as_str(), "delete_staff");
    }

    #[test]
    fn test_action_resource_type() {
        assert_eq!(
            MutationAction::UpdateMember.resource_type(),
            ResourceType::Member
        );
        assert_eq!(
            MutationAction::AssignLead.resource_type(),
            ResourceType::Lead
        );
        assert_eq!(
            MutationAction::CreateStaff.resource_type(),
            ResourceType::Staff
        );
    }

    #[test]
    fn test_action_verbs() {
        assert_eq!(MutationAction::CreateLead.verb(), "created");
        assert_eq!(MutationAction::UpdateStaff.verb(), "updated");
        assert_eq!(MutationAction::DeleteMember.verb(), "deleted");
        assert_eq!(MutationAction::AssignLead.verb(), "assigned");
    }

    #[test]
    fn test_delete_actions() {
        assert!(MutationAction::DeleteMember.is_delete());
        assert!(MutationAction::DeleteLead.is_delete());
        assert!(!MutationAction::AssignLead.is_delete());
        assert!(!MutationAction::CreateMember.is_delete());
    }

    #[test]
    fn test_member_role_never_mutates() {
        for action in [
            MutationAction::CreateMember,
            MutationAction::UpdateLead,
            MutationAction::DeleteStaff,
        ] {
            assert!(!action.allowed_roles().contains(&Role::Member));
        }
    }

    #[test]
    fn test_role_serde_snake_case() {
        assert_eq!(
            serde_json::to_string(&Role::BranchAdmin).unwrap(),
            "\"branch_admin\""
        );
        assert_eq!(
            serde_json::to_string(&MutationAction::UpdateMember).unwrap(),
            "\"update_member\""
        );
    }

    #[test]
    fn test_patch_serializes_only_set_fields() {
        let patch = MemberPatch {
            full_name: Some("New Name".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_value(&patch).unwrap();
        assert_eq!(json, serde_json::json!({"full_name": "New Name"}));
    }
}
