//! In-memory reference implementation of the store collaborators.
//!
//! Backs the standalone server (with optional demo seed data) and the
//! integration tests. Every write is a single independent insert or update, so
//! a `tokio::sync::RwLock` per collection is all the locking required.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use crate::models::{
    AuditEntry, DirectoryUser, Lead, LeadPatch, LeadStatus, Member, MemberPatch, Role, Staff,
    StaffPatch,
};
use crate::notify::Notification;

use super::{
    AdminDirectory, AuditStore, LeadStore, MemberStore, NotificationStore, StaffStore, StoreError,
    StoreResult,
};

#[derive(Default)]
struct Collections {
    members: HashMap<Uuid, Member>,
    leads: HashMap<Uuid, Lead>,
    staff: HashMap<Uuid, Staff>,
    users: Vec<DirectoryUser>,
    audit: Vec<AuditEntry>,
    notifications: Vec<Notification>,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Collections>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_directory_user(&self, user: DirectoryUser) {
        self.inner.write().await.users.push(user);
    }

    /// Seeds two branches with admins, members, leads, and staff so a fresh
    /// server is explorable without any external data source.
    pub async fn seed_demo(&self) -> (Uuid, Uuid) {
        let downtown = Uuid::new_v4();
        let riverside = Uuid::new_v4();

        let mut inner = self.inner.write().await;

        for (name, branch) in [
            ("Ana Kovac", downtown),
            ("Luka Novak", downtown),
            ("Iva Horvat", riverside),
        ] {
            inner.users.push(DirectoryUser {
                id: Uuid::new_v4(),
                display_name: name.to_string(),
                role: Role::BranchAdmin,
                branch_id: Some(branch),
            });
        }

        for (name, email, branch) in [
            ("Mira Petrov", "mira@example.com", downtown),
            ("Tomas Rado", "tomas@example.com", downtown),
            ("Elena Simic", "elena@example.com", riverside),
        ] {
            let member = Member {
                id: Uuid::new_v4(),
                branch_id: branch,
                full_name: name.to_string(),
                email: email.to_string(),
                phone: None,
                joined_at: Utc::now(),
            };
            inner.members.insert(member.id, member);
        }

        for (name, phone, branch) in [
            ("Jon Aker", "+385911111111", downtown),
            ("Sara Malik", "+385922222222", riverside),
        ] {
            let lead = Lead {
                id: Uuid::new_v4(),
                branch_id: branch,
                full_name: name.to_string(),
                phone: phone.to_string(),
                source: Some("walk_in".to_string()),
                status: LeadStatus::New,
                assigned_to: None,
                created_at: Utc::now(),
            };
            inner.leads.insert(lead.id, lead);
        }

        let trainer = Staff {
            id: Uuid::new_v4(),
            branch_id: downtown,
            full_name: "Dana Ilic".to_string(),
            email: "dana@example.com".to_string(),
            position: "trainer".to_string(),
            active: true,
            hired_at: Utc::now(),
        };
        inner.staff.insert(trainer.id, trainer);

        info!(
            members = inner.members.len(),
            leads = inner.leads.len(),
            staff = inner.staff.len(),
            admins = inner.users.len(),
            "Seeded demo data"
        );

        (downtown, riverside)
    }
}

#[async_trait]
impl MemberStore for MemoryStore {
    async fn find(&self, id: Uuid) -> StoreResult<Member> {
        self.inner
            .read()
            .await
            .members
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn list(&self, branch_id: Option<Uuid>) -> StoreResult<Vec<Member>> {
        let inner = self.inner.read().await;
        let mut members: Vec<Member> = inner
            .members
            .values()
            .filter(|m| branch_id.is_none_or(|b| m.branch_id == b))
            .cloned()
            .collect();
        members.sort_by(|a, b| a.full_name.cmp(&b.full_name));
        Ok(members)
    }

    async fn create(&self, member: Member) -> StoreResult<Member> {
        let mut inner = self.inner.write().await;
        if inner.members.values().any(|m| m.email == member.email) {
            return Err(StoreError::Conflict(format!(
                "member email {} already exists",
                member.email
            )));
        }
        inner.members.insert(member.id, member.clone());
        Ok(member)
    }

    async fn update(&self, id: Uuid, patch: MemberPatch) -> StoreResult<Member> {
        let mut inner = self.inner.write().await;
        let member = inner.members.get_mut(&id).ok_or(StoreError::NotFound)?;
        if let Some(full_name) = patch.full_name {
            member.full_name = full_name;
        }
        if let Some(email) = patch.email {
            member.email = email;
        }
        if let Some(phone) = patch.phone {
            member.phone = Some(phone);
        }
        Ok(member.clone())
    }

    async fn delete(&self, id: Uuid) -> StoreResult<Member> {
        self.inner
            .write()
            .await
            .members
            .remove(&id)
            .ok_or(StoreError::NotFound)
    }
}

#[async_trait]
impl LeadStore for MemoryStore {
    async fn find(&self, id: Uuid) -> StoreResult<Lead> {
        self.inner
            .read()
            .await
            .leads
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn list(&self, branch_id: Option<Uuid>) -> StoreResult<Vec<Lead>> {
        let inner = self.inner.read().await;
        let mut leads: Vec<Lead> = inner
            .leads
            .values()
            .filter(|l| branch_id.is_none_or(|b| l.branch_id == b))
            .cloned()
            .collect();
        leads.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(leads)
    }

    async fn create(&self, lead: Lead) -> StoreResult<Lead> {
        self.inner.write().await.leads.insert(lead.id, lead.clone());
        Ok(lead)
    }

    async fn update(&self, id: Uuid, patch: LeadPatch) -> StoreResult<Lead> {
        let mut inner = self.inner.write().await;
        let lead = inner.leads.get_mut(&id).ok_or(StoreError::NotFound)?;
        if let Some(full_name) = patch.full_name {
            lead.full_name = full_name;
        }
        if let Some(phone) = patch.phone {
            lead.phone = phone;
        }
        if let Some(source) = patch.source {
            lead.source = Some(source);
        }
        if let Some(status) = patch.status {
            lead.status = status;
        }
        if let Some(assigned_to) = patch.assigned_to {
            lead.assigned_to = Some(assigned_to);
        }
        Ok(lead.clone())
    }

    async fn delete(&self, id: Uuid) -> StoreResult<Lead> {
        self.inner
            .write()
            .await
            .leads
            .remove(&id)
            .ok_or(StoreError::NotFound)
    }
}

#[async_trait]
impl StaffStore for MemoryStore {
    async fn find(&self, id: Uuid) -> StoreResult<Staff> {
        self.inner
            .read()
            .await
            .staff
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn list(&self, branch_id: Option<Uuid>) -> StoreResult<Vec<Staff>> {
        let inner = self.inner.read().await;
        let mut staff: Vec<Staff> = inner
            .staff
            .values()
            .filter(|s| branch_id.is_none_or(|b| s.branch_id == b))
            .cloned()
            .collect();
        staff.sort_by(|a, b| a.full_name.cmp(&b.full_name));
        Ok(staff)
    }

    async fn create(&self, staff: Staff) -> StoreResult<Staff> {
        self.inner
            .write()
            .await
            .staff
            .insert(staff.id, staff.clone());
        Ok(staff)
    }

    async fn update(&self, id: Uuid, patch: StaffPatch) -> StoreResult<Staff> {
        let mut inner = self.inner.write().await;
        let staff = inner.staff.get_mut(&id).ok_or(StoreError::NotFound)?;
        if let Some(full_name) = patch.full_name {
            staff.full_name = full_name;
        }
        if let Some(email) = patch.email {
            staff.email = email;
        }
        if let Some(position) = patch.position {
            staff.position = position;
        }
        if let Some(active) = patch.active {
            staff.active = active;
        }
        Ok(staff.clone())
    }

    async fn delete(&self, id: Uuid) -> StoreResult<Staff> {
        self.inner
            .write()
            .await
            .staff
            .remove(&id)
            .ok_or(StoreError::NotFound)
    }
}

#[async_trait]
impl AdminDirectory for MemoryStore {
    async fn users_in_branch(&self, branch_id: Uuid) -> StoreResult<Vec<DirectoryUser>> {
        Ok(self
            .inner
            .read()
            .await
            .users
            .iter()
            .filter(|u| u.branch_id == Some(branch_id))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl AuditStore for MemoryStore {
    async fn append(&self, entry: AuditEntry) -> StoreResult<()> {
        self.inner.write().await.audit.push(entry);
        Ok(())
    }

    async fn list(&self, branch_id: Option<Uuid>) -> StoreResult<Vec<AuditEntry>> {
        let inner = self.inner.read().await;
        let mut entries: Vec<AuditEntry> = inner
            .audit
            .iter()
            .filter(|e| branch_id.is_none() || e.branch_id == branch_id)
            .cloned()
            .collect();
        entries.reverse();
        Ok(entries)
    }
}

#[async_trait]
impl NotificationStore for MemoryStore {
    async fn insert(&self, notification: Notification) -> StoreResult<()> {
        self.inner.write().await.notifications.push(notification);
        Ok(())
    }

    async fn list_for(&self, recipient_id: Uuid) -> StoreResult<Vec<Notification>> {
        let inner = self.inner.read().await;
        let mut inbox: Vec<Notification> = inner
            .notifications
            .iter()
            .filter(|n| n.recipient_id == recipient_id)
            .cloned()
            .collect();
        inbox.reverse();
        Ok(inbox)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(branch_id: Uuid, name: &str, email: &str) -> Member {
        Member {
            id: Uuid::new_v4(),
            branch_id,
            full_name: name.to_string(),
            email: email.to_string(),
            phone: None,
            joined_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_member_crud_round() {
        let store = MemoryStore::new();
        let branch = Uuid::new_v4();

        let created = MemberStore::create(&store, member(branch, "Mira Petrov", "mira@example.com"))
            .await
            .unwrap();

        let found = MemberStore::find(&store, created.id).await.unwrap();
        assert_eq!(found.full_name, "Mira Petrov");

        let updated = MemberStore::update(
            &store,
            created.id,
            MemberPatch {
                phone: Some("+385911234567".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.phone.as_deref(), Some("+385911234567"));
        assert_eq!(updated.full_name, "Mira Petrov");

        let removed = MemberStore::delete(&store, created.id).await.unwrap();
        assert_eq!(removed.id, created.id);
        assert!(matches!(
            MemberStore::find(&store, created.id).await,
            Err(StoreError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_member_duplicate_email_conflicts() {
        let store = MemoryStore::new();
        let branch = Uuid::new_v4();

        MemberStore::create(&store, member(branch, "A", "same@example.com"))
            .await
            .unwrap();
        let err = MemberStore::create(&store, member(branch, "B", "same@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_list_filters_by_branch() {
        let store = MemoryStore::new();
        let b1 = Uuid::new_v4();
        let b2 = Uuid::new_v4();

        MemberStore::create(&store, member(b1, "A", "a@example.com")).await.unwrap();
        MemberStore::create(&store, member(b2, "B", "b@example.com")).await.unwrap();

        assert_eq!(MemberStore::list(&store, Some(b1)).await.unwrap().len(), 1);
        assert_eq!(MemberStore::list(&store, None).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_directory_filters_by_branch() {
        let store = MemoryStore::new();
        let b1 = Uuid::new_v4();

        store
            .add_directory_user(DirectoryUser {
                id: Uuid::new_v4(),
                display_name: "Ana".to_string(),
                role: Role::BranchAdmin,
                branch_id: Some(b1),
            })
            .await;
        store
            .add_directory_user(DirectoryUser {
                id: Uuid::new_v4(),
                display_name: "Root".to_string(),
                role: Role::SuperAdmin,
                branch_id: None,
            })
            .await;

        let users = store.users_in_branch(b1).await.unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].display_name, "Ana");
    }

    #[tokio::test]
    async fn test_audit_list_newest_first() {
        let store = MemoryStore::new();
        let branch = Uuid::new_v4();

        for action in [
            crate::models::MutationAction::CreateMember,
            crate::models::MutationAction::UpdateMember,
        ] {
            store
                .append(AuditEntry {
                    id: Uuid::new_v4(),
                    user_id: Uuid::new_v4(),
                    display_name: "Ana".to_string(),
                    action,
                    resource_type: action.resource_type(),
                    resource_id: Uuid::new_v4(),
                    details: serde_json::json!({}),
                    caller_addr: None,
                    branch_id: Some(branch),
                    recorded_at: Utc::now(),
                })
                .await
                .unwrap();
        }

        let entries = AuditStore::list(&store, Some(branch)).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(
            entries[0].action,
            crate::models::MutationAction::UpdateMember
        );
    }

    #[tokio::test]
    async fn test_seed_demo_populates_collections() {
        let store = MemoryStore::new();
        let (downtown, riverside) = store.seed_demo().await;

        assert_eq!(store.users_in_branch(downtown).await.unwrap().len(), 2);
        assert_eq!(store.users_in_branch(riverside).await.unwrap().len(), 1);
        assert!(!MemberStore::list(&store, Some(downtown))
            .await
            .unwrap()
            .is_empty());
    }
}
