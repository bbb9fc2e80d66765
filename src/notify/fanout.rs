//! Best-effort broadcast to a branch's administrators.

use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::models::Role;
use crate::store::{AdminDirectory, NotificationStore, StoreError};
use crate::telemetry::{record_fanout_failure, record_notification_created};

use super::types::{Notification, NotificationKind, NotificationPriority};

/// Result of one per-recipient dispatch attempt.
#[derive(Debug)]
pub struct DispatchOutcome {
    pub recipient_id: Uuid,
    pub result: Result<Uuid, StoreError>,
}

impl DispatchOutcome {
    pub fn delivered(&self) -> bool {
        self.result.is_ok()
    }
}

#[derive(Clone)]
pub struct NotificationFanout {
    directory: Arc<dyn AdminDirectory>,
    store: Arc<dyn NotificationStore>,
}

impl NotificationFanout {
    pub fn new(directory: Arc<dyn AdminDirectory>, store: Arc<dyn NotificationStore>) -> Self {
        Self { directory, store }
    }

    /// Discovers the branch's admins and creates one notification per
    /// recipient. Each dispatch is independent: a failed insert is logged,
    /// counted, and skipped without touching the others. Nothing here can fail
    /// the mutation that triggered it.
    #[instrument(skip(self, title, message, data), fields(branch_id = %branch_id, kind = %kind))]
    pub async fn fanout(
        &self,
        branch_id: Uuid,
        kind: NotificationKind,
        title: &str,
        message: &str,
        priority: NotificationPriority,
        data: serde_json::Value,
    ) -> Vec<DispatchOutcome> {
        let users = match self.directory.users_in_branch(branch_id).await {
            Ok(users) => users,
            Err(e) => {
                warn!(error = %e, "Recipient lookup failed, skipping fan-out");
                record_fanout_failure("lookup");
                return Vec::new();
            }
        };

        let recipients: Vec<_> = users
            .into_iter()
            .filter(|u| u.role == Role::BranchAdmin)
            .collect();

        debug!(recipients = recipients.len(), "Dispatching notifications");

        let mut outcomes = Vec::with_capacity(recipients.len());
        for recipient in recipients {
            let notification = Notification {
                id: Uuid::new_v4(),
                recipient_id: recipient.id,
                kind,
                title: title.to_string(),
                message: message.to_string(),
                priority,
                read: false,
                data: data.clone(),
                branch_id,
                created_at: Utc::now(),
            };
            let notification_id = notification.id;

            let result = match self.store.insert(notification).await {
                Ok(()) => {
                    record_notification_created();
                    Ok(notification_id)
                }
                Err(e) => {
                    warn!(
                        recipient_id = %recipient.id,
                        error = %e,
                        "Notification dispatch failed, continuing with remaining recipients"
                    );
                    record_fanout_failure("dispatch");
                    Err(e)
                }
            };

            outcomes.push(DispatchOutcome {
                recipient_id: recipient.id,
                result,
            });
        }

        outcomes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DirectoryUser;
    use crate::store::{MemoryStore, StoreResult};
    use async_trait::async_trait;

    async fn branch_with_admins(store: &MemoryStore, count: usize) -> (Uuid, Vec<Uuid>) {
        let branch = Uuid::new_v4();
        let mut ids = Vec::new();
        for i in 0..count {
            let id = Uuid::new_v4();
            store
                .add_directory_user(DirectoryUser {
                    id,
                    display_name: format!("Admin {i}"),
                    role: Role::BranchAdmin,
                    branch_id: Some(branch),
                })
                .await;
            ids.push(id);
        }
        (branch, ids)
    }

    #[tokio::test]
    async fn test_one_notification_per_admin() {
        let store = Arc::new(MemoryStore::new());
        let (branch, admins) = branch_with_admins(&store, 3).await;

        let fanout = NotificationFanout::new(store.clone(), store.clone());
        let outcomes = fanout
            .fanout(
                branch,
                NotificationKind::BranchUpdate,
                "Member updated",
                "Ana updated member Mira Petrov",
                NotificationPriority::Medium,
                serde_json::json!({}),
            )
            .await;

        assert_eq!(outcomes.len(), 3);
        assert!(outcomes.iter().all(|o| o.delivered()));
        for admin in admins {
            let inbox = store.list_for(admin).await.unwrap();
            assert_eq!(inbox.len(), 1);
            assert_eq!(inbox[0].branch_id, branch);
        }
    }

    #[tokio::test]
    async fn test_non_admin_users_excluded() {
        let store = Arc::new(MemoryStore::new());
        let (branch, _) = branch_with_admins(&store, 1).await;

        let member_id = Uuid::new_v4();
        store
            .add_directory_user(DirectoryUser {
                id: member_id,
                display_name: "Just A Member".to_string(),
                role: Role::Member,
                branch_id: Some(branch),
            })
            .await;

        let fanout = NotificationFanout::new(store.clone(), store.clone());
        let outcomes = fanout
            .fanout(
                branch,
                NotificationKind::BranchUpdate,
                "t",
                "m",
                NotificationPriority::Low,
                serde_json::json!({}),
            )
            .await;

        assert_eq!(outcomes.len(), 1);
        assert!(store.list_for(member_id).await.unwrap().is_empty());
    }

    struct FailingDirectory;

    #[async_trait]
    impl AdminDirectory for FailingDirectory {
        async fn users_in_branch(&self, _branch_id: Uuid) -> StoreResult<Vec<DirectoryUser>> {
            Err(StoreError::Unavailable("directory offline".to_string()))
        }
    }

    #[tokio::test]
    async fn test_lookup_failure_yields_empty_outcomes() {
        let store = Arc::new(MemoryStore::new());
        let fanout = NotificationFanout::new(Arc::new(FailingDirectory), store.clone());

        let outcomes = fanout
            .fanout(
                Uuid::new_v4(),
                NotificationKind::BranchUpdate,
                "t",
                "m",
                NotificationPriority::Low,
                serde_json::json!({}),
            )
            .await;

        assert!(outcomes.is_empty());
    }

    /// Notification store that fails inserts for one poisoned recipient.
    struct FlakyStore {
        inner: Arc<MemoryStore>,
        poisoned: Uuid,
    }

    #[async_trait]
    impl NotificationStore for FlakyStore {
        async fn insert(&self, notification: Notification) -> StoreResult<()> {
            if notification.recipient_id == self.poisoned {
                return Err(StoreError::Unavailable("insert refused".to_string()));
            }
            self.inner.insert(notification).await
        }

        async fn list_for(&self, recipient_id: Uuid) -> StoreResult<Vec<Notification>> {
            self.inner.list_for(recipient_id).await
        }
    }

    #[tokio::test]
    async fn test_single_failure_does_not_block_others() {
        let store = Arc::new(MemoryStore::new());
        let (branch, admins) = branch_with_admins(&store, 3).await;

        let flaky = Arc::new(FlakyStore {
            inner: store.clone(),
            poisoned: admins[1],
        });

        let fanout = NotificationFanout::new(store.clone(), flaky);
        let outcomes = fanout
            .fanout(
                branch,
                NotificationKind::BranchUpdate,
                "t",
                "m",
                NotificationPriority::High,
                serde_json::json!({}),
            )
            .await;

        assert_eq!(outcomes.len(), 3);
        assert_eq!(outcomes.iter().filter(|o| o.delivered()).count(), 2);
        assert_eq!(store.list_for(admins[0]).await.unwrap().len(), 1);
        assert!(store.list_for(admins[1]).await.unwrap().is_empty());
        assert_eq!(store.list_for(admins[2]).await.unwrap().len(), 1);
    }
}
