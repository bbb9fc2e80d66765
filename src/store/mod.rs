//! Interface boundary to the external store collaborators.
//!
//! The pipeline never talks to a database directly; it goes through these
//! traits. The in-memory reference implementation in [`memory`] backs the
//! standalone server and the test suite; deployments substitute their own.

pub mod memory;

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{
    AuditEntry, DirectoryUser, Lead, LeadPatch, Member, MemberPatch, Staff, StaffPatch,
};
use crate::notify::Notification;

pub use memory::MemoryStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("resource not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait MemberStore: Send + Sync {
    async fn find(&self, id: Uuid) -> StoreResult<Member>;
    async fn list(&self, branch_id: Option<Uuid>) -> StoreResult<Vec<Member>>;
    async fn create(&self, member: Member) -> StoreResult<Member>;
    async fn update(&self, id: Uuid, patch: MemberPatch) -> StoreResult<Member>;
    /// Removes the record and returns its last state.
    async fn delete(&self, id: Uuid) -> StoreResult<Member>;
}

#[async_trait]
pub trait LeadStore: Send + Sync {
    async fn find(&self, id: Uuid) -> StoreResult<Lead>;
    async fn list(&self, branch_id: Option<Uuid>) -> StoreResult<Vec<Lead>>;
    async fn create(&self, lead: Lead) -> StoreResult<Lead>;
    async fn update(&self, id: Uuid, patch: LeadPatch) -> StoreResult<Lead>;
    async fn delete(&self, id: Uuid) -> StoreResult<Lead>;
}

#[async_trait]
pub trait StaffStore: Send + Sync {
    async fn find(&self, id: Uuid) -> StoreResult<Staff>;
    async fn list(&self, branch_id: Option<Uuid>) -> StoreResult<Vec<Staff>>;
    async fn create(&self, staff: Staff) -> StoreResult<Staff>;
    async fn update(&self, id: Uuid, patch: StaffPatch) -> StoreResult<Staff>;
    async fn delete(&self, id: Uuid) -> StoreResult<Staff>;
}

/// User/branch-admin lookup. The fan-out filters the result by role; the
/// directory itself returns every user affiliated with the branch.
#[async_trait]
pub trait AdminDirectory: Send + Sync {
    async fn users_in_branch(&self, branch_id: Uuid) -> StoreResult<Vec<DirectoryUser>>;
}

#[async_trait]
pub trait AuditStore: Send + Sync {
    async fn append(&self, entry: AuditEntry) -> StoreResult<()>;
    /// Entries for one branch (or the global trail), newest first.
    async fn list(&self, branch_id: Option<Uuid>) -> StoreResult<Vec<AuditEntry>>;
}

#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn insert(&self, notification: Notification) -> StoreResult<()>;
    /// A recipient's inbox, newest first.
    async fn list_for(&self, recipient_id: Uuid) -> StoreResult<Vec<Notification>>;
}
