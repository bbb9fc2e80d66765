//! Background side-effect queue.
//!
//! Audit recording and notification fan-out run after a mutation's response is
//! already decided. Handing them to a bounded queue drained by one worker task
//! makes that explicit: the request path blocks only on enqueueing, and a
//! failure on the worker is logged and counted, never surfaced to the caller.

use std::net::IpAddr;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::audit::{Actor, AuditRecorder};
use crate::models::{MutationAction, ResourceType};
use crate::notify::{NotificationFanout, NotificationKind, NotificationPriority};
use crate::telemetry::{record_audit_failure, record_effect_job_dropped};

pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// Everything the worker needs to audit and fan out one successful mutation,
/// copied out of the request before the response is returned.
#[derive(Debug, Clone)]
pub struct SideEffectJob {
    pub actor: Actor,
    pub action: MutationAction,
    pub resource_type: ResourceType,
    pub resource_id: Uuid,
    /// Display name of the mutated resource; for deletions, captured before
    /// the delete.
    pub resource_name: String,
    /// Effective branch id from the scope decision, echoed by the store.
    pub branch_id: Option<Uuid>,
    pub details: serde_json::Value,
    pub caller_addr: Option<IpAddr>,
}

impl SideEffectJob {
    fn notification_kind(&self) -> NotificationKind {
        match self.action {
            MutationAction::AssignLead => NotificationKind::LeadAssigned,
            _ => NotificationKind::BranchUpdate,
        }
    }

    fn notification_priority(&self) -> NotificationPriority {
        if self.action.is_delete() {
            NotificationPriority::High
        } else {
            NotificationPriority::Medium
        }
    }

    fn title(&self) -> String {
        let noun = match self.resource_type {
            ResourceType::Member => "Member",
            ResourceType::Lead => "Lead",
            ResourceType::Staff => "Staff",
        };
        format!("{} {}", noun, self.action.verb())
    }

    fn message(&self) -> String {
        format!(
            "{} {} {} {}",
            self.actor.display_name,
            self.action.verb(),
            self.resource_type,
            self.resource_name
        )
    }
}

/// Cheap handle held by the request path. Enqueueing never waits: a full or
/// closed queue drops the job with a warning and a counter increment.
#[derive(Clone)]
pub struct SideEffectQueue {
    tx: mpsc::Sender<SideEffectJob>,
}

impl SideEffectQueue {
    pub fn enqueue(&self, job: SideEffectJob) {
        match self.tx.try_send(job) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(job)) => {
                warn!(action = %job.action, resource_id = %job.resource_id, "Side-effect queue full, dropping job");
                record_effect_job_dropped();
            }
            Err(mpsc::error::TrySendError::Closed(job)) => {
                warn!(action = %job.action, resource_id = %job.resource_id, "Side-effect queue closed, dropping job");
                record_effect_job_dropped();
            }
        }
    }
}

/// Shutdown handle for the worker task. `shutdown()` stops intake, drains what
/// is already queued, and joins; dropping the handle signals the worker to stop
/// without joining.
pub struct SideEffectHandle {
    shutdown_tx: watch::Sender<bool>,
    join: tokio::task::JoinHandle<()>,
}

impl SideEffectHandle {
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        if let Err(e) = self.join.await {
            error!(error = %e, "Side-effect worker task failed");
        }
    }
}

pub struct SideEffectWorker {
    audit: AuditRecorder,
    fanout: NotificationFanout,
    rx: mpsc::Receiver<SideEffectJob>,
}

impl SideEffectWorker {
    pub fn spawn(
        audit: AuditRecorder,
        fanout: NotificationFanout,
        queue_capacity: usize,
    ) -> (SideEffectQueue, SideEffectHandle) {
        let (tx, rx) = mpsc::channel(queue_capacity);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let worker = Self { audit, fanout, rx };
        let join = tokio::spawn(async move {
            worker.run(shutdown_rx).await;
        });

        (
            SideEffectQueue { tx },
            SideEffectHandle { shutdown_tx, join },
        )
    }

    #[instrument(skip(self, shutdown_rx), name = "side_effect_worker")]
    async fn run(mut self, mut shutdown_rx: watch::Receiver<bool>) {
        info!("Side-effect worker started");

        loop {
            tokio::select! {
                job = self.rx.recv() => match job {
                    Some(job) => self.process(job).await,
                    None => break,
                },
                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        info!("Side-effect worker received shutdown signal");
                        break;
                    }
                }
            }
        }

        // Drain whatever was enqueued before shutdown.
        let mut drained = 0usize;
        while let Ok(job) = self.rx.try_recv() {
            self.process(job).await;
            drained += 1;
        }
        if drained > 0 {
            debug!(count = drained, "Drained side-effect jobs on shutdown");
        }

        info!("Side-effect worker stopped");
    }

    #[instrument(skip(self, job), fields(action = %job.action, resource_id = %job.resource_id))]
    async fn process(&self, job: SideEffectJob) {
        if let Err(e) = self
            .audit
            .record(
                &job.actor,
                job.action,
                job.resource_type,
                job.resource_id,
                job.details.clone(),
                job.caller_addr,
                job.branch_id,
            )
            .await
        {
            error!(error = %e, "Audit append failed after successful mutation");
            record_audit_failure();
        }

        // Fan-out runs regardless of the audit outcome. Without an effective
        // branch there is no recipient set.
        let Some(branch_id) = job.branch_id else {
            debug!("No effective branch, skipping fan-out");
            return;
        };

        let data = serde_json::json!({
            "action": job.action,
            "resource_type": job.resource_type,
            "resource_id": job.resource_id,
        });

        let outcomes = self
            .fanout
            .fanout(
                branch_id,
                job.notification_kind(),
                &job.title(),
                &job.message(),
                job.notification_priority(),
                data,
            )
            .await;

        debug!(
            attempted = outcomes.len(),
            delivered = outcomes.iter().filter(|o| o.delivered()).count(),
            "Fan-out complete"
        );
    }
}
