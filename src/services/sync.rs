//! Background reconciliation of the in-memory store with its collaborators.
//!
//! Lifecycle and registry operations apply their change to the entity store
//! first, then enqueue a [`SyncJob`] describing what must reach the database
//! and which notification to send. The queue never blocks the caller. A single
//! [`SyncWorker`] drains jobs in order, retrying each database write with
//! exponential backoff. Final failures are logged and dropped: the in-memory
//! view is never rolled back.

use std::{sync::Arc, time::Duration};
use tokio::sync::mpsc;

use crate::{
    error::AppResult,
    models::{Equipment, RepairRequest},
    repository::Persistence,
    services::notifications::Notifier,
};

/// Retry behavior for database writes
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts (including the initial one).
    pub max_attempts: u32,
    /// Initial delay before the first retry.
    pub base_delay: Duration,
    /// Maximum delay between retries (backoff is capped here).
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(5),
        }
    }
}

impl RetryConfig {
    /// Single attempt, no waiting
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Delay before retry number `attempt` (1-based)
    fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

/// One write against the durable store
#[derive(Debug, Clone, PartialEq)]
pub enum PersistOp {
    InsertRequest(RepairRequest),
    UpdateRequest(RepairRequest),
    InsertEquipment(Equipment),
    UpdateEquipment(Equipment),
    DeleteEquipment(String),
}

impl PersistOp {
    fn describe(&self) -> String {
        match self {
            PersistOp::InsertRequest(r) => format!("insert request {}", r.id),
            PersistOp::UpdateRequest(r) => format!("update request {}", r.id),
            PersistOp::InsertEquipment(e) => format!("insert equipment {}", e.id),
            PersistOp::UpdateEquipment(e) => format!("update equipment {}", e.id),
            PersistOp::DeleteEquipment(id) => format!("delete equipment {}", id),
        }
    }

    async fn apply(&self, persistence: &dyn Persistence) -> AppResult<()> {
        match self {
            PersistOp::InsertRequest(r) => persistence.insert_request(r).await,
            PersistOp::UpdateRequest(r) => persistence.update_request(r).await,
            PersistOp::InsertEquipment(e) => persistence.insert_equipment(e).await,
            PersistOp::UpdateEquipment(e) => persistence.update_equipment(e).await,
            PersistOp::DeleteEquipment(id) => persistence.delete_equipment(id).await,
        }
    }
}

/// Writes to reconcile plus an optional notification, sent only once every
/// write succeeded
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SyncJob {
    pub ops: Vec<PersistOp>,
    pub notification: Option<String>,
}

impl SyncJob {
    pub fn new(ops: Vec<PersistOp>) -> Self {
        Self {
            ops,
            notification: None,
        }
    }

    pub fn with_notification(mut self, message: String) -> Self {
        self.notification = Some(message);
        self
    }
}

/// Sending side of the reconciliation queue
#[derive(Clone)]
pub struct SyncQueue {
    tx: mpsc::UnboundedSender<SyncJob>,
}

impl SyncQueue {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<SyncJob>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Never blocks; a closed queue only loses durability
    pub fn enqueue(&self, job: SyncJob) {
        if job.ops.is_empty() && job.notification.is_none() {
            return;
        }
        if let Err(e) = self.tx.send(job) {
            tracing::error!("Sync queue closed, dropping job: {:?}", e.0.ops);
        }
    }
}

/// Drains the queue and talks to the database and the notifier
pub struct SyncWorker {
    rx: mpsc::UnboundedReceiver<SyncJob>,
    persistence: Arc<dyn Persistence>,
    notifier: Arc<dyn Notifier>,
    retry: RetryConfig,
}

impl SyncWorker {
    pub fn new(
        rx: mpsc::UnboundedReceiver<SyncJob>,
        persistence: Arc<dyn Persistence>,
        notifier: Arc<dyn Notifier>,
        retry: RetryConfig,
    ) -> Self {
        Self {
            rx,
            persistence,
            notifier,
            retry,
        }
    }

    /// Run until every queue sender is dropped
    pub async fn run(mut self) {
        tracing::info!("Sync worker started");
        while let Some(job) = self.rx.recv().await {
            self.process(job).await;
        }
        tracing::info!("Sync worker stopped");
    }

    pub fn spawn(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Returns whether every write of the job succeeded
    pub async fn process(&self, job: SyncJob) -> bool {
        let mut persisted = true;
        for op in &job.ops {
            if !self.apply_with_retry(op).await {
                // later writes of the job depend on this one
                persisted = false;
                break;
            }
        }

        if let Some(message) = job.notification {
            if persisted {
                if let Err(e) = self.notifier.send(&message).await {
                    tracing::error!("Notification failed: {}", e);
                }
            } else {
                tracing::warn!("Skipping notification, changes were not persisted");
            }
        }
        persisted
    }

    async fn apply_with_retry(&self, op: &PersistOp) -> bool {
        let mut attempt = 1;
        loop {
            match op.apply(self.persistence.as_ref()).await {
                Ok(()) => {
                    tracing::debug!("Persisted: {}", op.describe());
                    return true;
                }
                Err(e) if attempt < self.retry.max_attempts => {
                    let delay = self.retry.delay_for(attempt);
                    tracing::warn!(
                        attempt,
                        ?delay,
                        "Persistence failed ({}), retrying: {}",
                        op.describe(),
                        e
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    tracing::error!(
                        attempt,
                        "Persistence failed ({}), giving up: {}",
                        op.describe(),
                        e
                    );
                    return false;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::AppError,
        models::{EquipmentStatus, RepairStatus},
        repository::MockPersistence,
        services::notifications::MockNotifier,
    };
    use chrono::{NaiveDate, Utc};

    fn equipment() -> Equipment {
        Equipment {
            id: "EQ1".to_string(),
            clinic_id: "CN_A".to_string(),
            name: "Dental chair".to_string(),
            model: String::new(),
            serial_number: String::new(),
            install_date: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
            status: EquipmentStatus::Maintenance,
        }
    }

    fn request() -> RepairRequest {
        RepairRequest {
            id: "REQ-1".to_string(),
            create_date: Utc::now(),
            requester_username: "cn_a".to_string(),
            clinic_id: "CN_A".to_string(),
            equipment_id: "EQ1".to_string(),
            equipment_name: "Dental chair".to_string(),
            issue_description: "Broken".to_string(),
            images_before: vec![],
            status: RepairStatus::Approved,
            approver_username: Some("admin".to_string()),
            estimated_cost: None,
            repair_cost: None,
            warranty_months: None,
            completion_date: None,
            technician_notes: None,
            images_after: vec![],
        }
    }

    fn worker(persistence: MockPersistence, notifier: MockNotifier, retry: RetryConfig) -> SyncWorker {
        let (_queue, rx) = SyncQueue::channel();
        SyncWorker::new(rx, Arc::new(persistence), Arc::new(notifier), retry)
    }

    #[test]
    fn test_backoff_is_capped() {
        let retry = RetryConfig {
            max_attempts: 10,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(350),
        };
        assert_eq!(retry.delay_for(1), Duration::from_millis(100));
        assert_eq!(retry.delay_for(2), Duration::from_millis(200));
        assert_eq!(retry.delay_for(3), Duration::from_millis(350));
        assert_eq!(retry.delay_for(30), Duration::from_millis(350));
    }

    #[tokio::test]
    async fn test_notifies_after_all_writes() {
        let mut persistence = MockPersistence::new();
        persistence.expect_update_request().times(1).returning(|_| Ok(()));
        persistence.expect_update_equipment().times(1).returning(|_| Ok(()));
        let mut notifier = MockNotifier::new();
        notifier
            .expect_send()
            .withf(|m| m.contains("REQ-1"))
            .times(1)
            .returning(|_| Ok(()));

        let job = SyncJob::new(vec![
            PersistOp::UpdateRequest(request()),
            PersistOp::UpdateEquipment(equipment()),
        ])
        .with_notification("REQ-1 approved".to_string());

        assert!(worker(persistence, notifier, RetryConfig::none()).process(job).await);
    }

    #[tokio::test]
    async fn test_retries_then_succeeds() {
        let mut persistence = MockPersistence::new();
        let mut calls = 0;
        persistence.expect_insert_request().times(2).returning(move |_| {
            calls += 1;
            if calls == 1 {
                Err(AppError::Internal("connection reset".to_string()))
            } else {
                Ok(())
            }
        });
        let notifier = MockNotifier::new();
        let retry = RetryConfig {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(1),
        };

        let job = SyncJob::new(vec![PersistOp::InsertRequest(request())]);
        assert!(worker(persistence, notifier, retry).process(job).await);
    }

    #[tokio::test]
    async fn test_failure_is_swallowed_and_skips_notification() {
        let mut persistence = MockPersistence::new();
        persistence
            .expect_update_request()
            .times(1)
            .returning(|_| Err(AppError::Internal("down".to_string())));
        // neither the equipment write nor the notification may happen
        persistence.expect_update_equipment().times(0);
        let mut notifier = MockNotifier::new();
        notifier.expect_send().times(0);

        let job = SyncJob::new(vec![
            PersistOp::UpdateRequest(request()),
            PersistOp::UpdateEquipment(equipment()),
        ])
        .with_notification("status changed".to_string());

        assert!(!worker(persistence, notifier, RetryConfig::none()).process(job).await);
    }

    #[tokio::test]
    async fn test_notification_failure_does_not_fail_job() {
        let mut persistence = MockPersistence::new();
        persistence.expect_delete_equipment().times(1).returning(|_| Ok(()));
        let mut notifier = MockNotifier::new();
        notifier
            .expect_send()
            .times(1)
            .returning(|_| Err(AppError::Internal("telegram down".to_string())));

        let job = SyncJob::new(vec![PersistOp::DeleteEquipment("EQ1".to_string())])
            .with_notification("deleted".to_string());
        assert!(worker(persistence, notifier, RetryConfig::none()).process(job).await);
    }

    #[tokio::test]
    async fn test_empty_jobs_are_not_queued() {
        let (queue, mut rx) = SyncQueue::channel();
        queue.enqueue(SyncJob::default());
        assert!(rx.try_recv().is_err());
    }
}
