//! Append-only audit recording.

use chrono::Utc;
use std::net::IpAddr;
use std::sync::Arc;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::models::{AuditEntry, MutationAction, ResourceType};
use crate::store::{AuditStore, StoreError};

/// Who performed a mutation, copied out of the session at enqueue time.
#[derive(Debug, Clone)]
pub struct Actor {
    pub user_id: Uuid,
    pub display_name: String,
}

#[derive(Clone)]
pub struct AuditRecorder {
    store: Arc<dyn AuditStore>,
}

impl AuditRecorder {
    pub fn new(store: Arc<dyn AuditStore>) -> Self {
        Self { store }
    }

    /// Appends one immutable entry. The timestamp is assigned here, never by
    /// the caller, so audit ordering stays trustworthy under clock skew.
    /// Never rejects on business grounds; only store unavailability fails.
    #[allow(clippy::too_many_arguments)]
    #[instrument(skip(self, details), fields(action = %action, resource_id = %resource_id))]
    pub async fn record(
        &self,
        actor: &Actor,
        action: MutationAction,
        resource_type: ResourceType,
        resource_id: Uuid,
        details: serde_json::Value,
        caller_addr: Option<IpAddr>,
        branch_id: Option<Uuid>,
    ) -> Result<AuditEntry, StoreError> {
        let entry = AuditEntry {
            id: Uuid::new_v4(),
            user_id: actor.user_id,
            display_name: actor.display_name.clone(),
            action,
            resource_type,
            resource_id,
            details,
            caller_addr,
            branch_id,
            recorded_at: Utc::now(),
        };

        self.store.append(entry.clone()).await?;
        debug!(entry_id = %entry.id, "Audit entry appended");
        Ok(entry)
    }
}
