//! Offline synchronization engine.
//!
//! Propagates local mutations to the remote task service, retries
//! failures, and reconciles after connectivity returns. Callers never wait
//! on the network: mutations land locally and the engine catches the
//! remote up in the background.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::db::TaskStore;
use crate::models::{SyncStatus, Task, TaskId};
use crate::net::Connectivity;
use crate::remote::RemoteStore;
use crate::sync::queue::{RetryAction, RetryEntry, RetryQueue};
use crate::Result;

/// Diagnostics snapshot of the engine's pending work
#[derive(Debug, Clone, Serialize)]
pub struct QueueStatus {
    pub count: usize,
    pub is_syncing: bool,
    pub entries: Vec<RetryEntry>,
}

/// Outcome of a [`SyncEngine::pull`] reconciliation pass
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct PullReport {
    /// Records returned by the remote listing
    pub fetched: usize,
    /// Records imported because they were missing locally
    pub added: usize,
    /// Local records overwritten by a newer remote copy
    pub refreshed: usize,
}

struct EngineInner {
    store: TaskStore,
    remote: Arc<dyn RemoteStore>,
    connectivity: Arc<dyn Connectivity>,
    queue: RetryQueue,
    busy: AtomicBool,
    status: watch::Sender<SyncStatus>,
    auto_sync: Mutex<Option<JoinHandle<()>>>,
    listener: Mutex<Option<JoinHandle<()>>>,
}

/// The synchronization engine. Cheap to clone; clones share all state.
///
/// All mutable state (busy flag, retry queue, timer handles, status
/// channel) lives behind one inner allocation, so isolated instances can
/// be constructed freely in tests.
#[derive(Clone)]
pub struct SyncEngine {
    inner: Arc<EngineInner>,
}

/// Clears the busy flag when a sync pass ends, however it ends.
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl SyncEngine {
    pub fn new(
        store: TaskStore,
        remote: Arc<dyn RemoteStore>,
        connectivity: Arc<dyn Connectivity>,
    ) -> Self {
        let (status, _rx) = watch::channel(SyncStatus::Idle);
        Self {
            inner: Arc::new(EngineInner {
                store,
                remote,
                connectivity,
                queue: RetryQueue::default(),
                busy: AtomicBool::new(false),
                status,
                auto_sync: Mutex::new(None),
                listener: Mutex::new(None),
            }),
        }
    }

    /// Current aggregate sync state
    #[must_use]
    pub fn status(&self) -> SyncStatus {
        *self.inner.status.borrow()
    }

    /// Subscribe to sync state transitions
    pub fn subscribe_status(&self) -> watch::Receiver<SyncStatus> {
        self.inner.status.subscribe()
    }

    /// Diagnostics: retry backlog and whether a pass is in flight
    #[must_use]
    pub fn queue_status(&self) -> QueueStatus {
        QueueStatus {
            count: self.inner.queue.len(),
            is_syncing: self.inner.busy.load(Ordering::Acquire),
            entries: self.inner.queue.entries(),
        }
    }

    /// Push every unsynced local task for `owner_id` to the remote store.
    ///
    /// A call arriving while another pass is in flight is dropped, not
    /// queued; the timer or the next mutation triggers a later pass. Tasks
    /// are handled independently: a failed push lands in the retry queue
    /// and the pass carries on. The only error surfaced to the caller is a
    /// failure to read the local store.
    pub async fn sync_now(&self, owner_id: &str) -> Result<()> {
        let Some(_busy) = self.try_begin() else {
            tracing::debug!("sync already in flight; skipping");
            return Ok(());
        };
        self.set_status(SyncStatus::Syncing);

        let unsynced = match self.inner.store.unsynced_tasks(owner_id).await {
            Ok(tasks) => tasks,
            Err(error) => {
                tracing::error!(%error, "failed to read unsynced tasks");
                self.set_status(SyncStatus::Error);
                return Err(error);
            }
        };

        if unsynced.is_empty() {
            self.set_status(SyncStatus::Synced);
            return Ok(());
        }

        tracing::debug!(count = unsynced.len(), "propagating unsynced tasks");
        for task in &unsynced {
            self.push_or_enqueue(&task.id).await;
        }

        self.set_status(SyncStatus::Synced);
        Ok(())
    }

    /// Propagate one task's current local state to the remote store.
    ///
    /// Offline, this does nothing: the task's cleared synced flag already
    /// guarantees the next `sync_now` pass picks it up, so no queue entry
    /// is needed. Online, a failed push is queued for retry. Never fails
    /// the caller.
    pub async fn propagate_task(&self, task: &Task) {
        if !self.inner.connectivity.is_online() {
            tracing::debug!(task_id = %task.id, "offline; task left for the next sync pass");
            return;
        }
        self.push_or_enqueue(&task.id).await;
    }

    /// Propagate a local deletion to the remote store.
    ///
    /// The local row is already gone, so unlike upserts there is no synced
    /// flag left to cover the intent: offline or failed deletions must be
    /// queued. Never fails the caller.
    pub async fn propagate_deletion(&self, id: TaskId) {
        if !self.inner.connectivity.is_online() {
            self.inner.queue.enqueue(id, RetryAction::Delete);
            return;
        }
        if let Err(error) = self.inner.remote.delete(&id).await {
            tracing::warn!(task_id = %id, %error, "remote deletion failed; queued for retry");
            self.inner.queue.enqueue(id, RetryAction::Delete);
        }
    }

    /// Replay queued propagation failures.
    ///
    /// No-op while offline or while a sync pass is in flight. The queue is
    /// drained atomically and each entry attempted once; failures re-enter
    /// the queue through the usual replace-on-id rule, so an entry is
    /// never attempted twice concurrently and never dropped.
    pub async fn process_retry_queue(&self) {
        if !self.inner.connectivity.is_online() {
            return;
        }
        let Some(_busy) = self.try_begin() else {
            return;
        };

        let entries = self.inner.queue.drain_all();
        if entries.is_empty() {
            return;
        }
        tracing::debug!(count = entries.len(), "replaying retry queue");

        for entry in entries {
            match entry.action {
                RetryAction::Delete => {
                    if let Err(error) = self.inner.remote.delete(&entry.task_id).await {
                        tracing::warn!(task_id = %entry.task_id, %error, "retried deletion failed");
                        self.inner.queue.enqueue(entry.task_id, entry.action);
                    }
                }
                RetryAction::CreateOrUpdate => {
                    if let Err(error) = self.push_task(&entry.task_id).await {
                        tracing::warn!(task_id = %entry.task_id, %error, "retried push failed");
                        self.inner.queue.enqueue(entry.task_id, entry.action);
                    }
                }
            }
        }
    }

    /// Import the owner's remote records into the local store.
    ///
    /// Records missing locally are added (already confirmed, so stored
    /// synced); local records are overwritten only when they carry no
    /// unsynced edits and the remote copy is strictly newer. Local edits
    /// always win until they have been pushed.
    pub async fn pull(&self, owner_id: &str) -> Result<PullReport> {
        let remote_tasks = self.inner.remote.list_by_owner(owner_id).await?;
        let mut report = PullReport {
            fetched: remote_tasks.len(),
            ..PullReport::default()
        };

        for task in remote_tasks {
            match self.inner.store.get_task(&task.id).await? {
                None => {
                    self.inner.store.create_task(&task).await?;
                    report.added += 1;
                }
                Some(local) if local.synced && task.updated_at > local.updated_at => {
                    self.inner.store.replace_task(&task).await?;
                    report.refreshed += 1;
                }
                Some(_) => {}
            }
        }

        tracing::debug!(
            fetched = report.fetched,
            added = report.added,
            refreshed = report.refreshed,
            "pull complete"
        );
        Ok(report)
    }

    /// Begin a recurring sync for `owner_id`.
    ///
    /// Idempotent: calling again replaces the previous timer rather than
    /// stacking a second one. Passes where the network is down are skipped
    /// without touching the remote.
    pub fn start_auto_sync(&self, owner_id: &str, interval: Duration) {
        let engine = self.clone();
        let owner = owner_id.to_string();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            // The first tick completes immediately; consume it so the
            // first pass happens a full interval after start.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if !engine.inner.connectivity.is_online() {
                    continue;
                }
                if let Err(error) = engine.sync_now(&owner).await {
                    tracing::warn!(%error, "scheduled sync failed");
                }
            }
        });
        Self::replace_handle(&self.inner.auto_sync, Some(handle));
    }

    /// Cancel the recurring sync; safe to call when none is running.
    pub fn stop_auto_sync(&self) {
        Self::replace_handle(&self.inner.auto_sync, None);
    }

    /// Wire connectivity transitions to the engine for `owner_id`.
    ///
    /// Going online drains the retry queue and then runs a full sync pass,
    /// in that order (queued point-fixes before reconciliation). Going
    /// offline resets the status to idle without touching the remote.
    /// Idempotent like `start_auto_sync`.
    pub fn setup_network_listener(&self, owner_id: &str) {
        let engine = self.clone();
        let owner = owner_id.to_string();
        let mut transitions = self.inner.connectivity.subscribe();
        let handle = tokio::spawn(async move {
            while transitions.changed().await.is_ok() {
                let online = *transitions.borrow_and_update();
                if online {
                    engine.on_connectivity_restored(&owner).await;
                } else {
                    engine.on_connectivity_lost();
                }
            }
        });
        Self::replace_handle(&self.inner.listener, Some(handle));
    }

    /// Detach the connectivity listener; safe to call when none is wired.
    pub fn stop_network_listener(&self) {
        Self::replace_handle(&self.inner.listener, None);
    }

    /// Stop the timer and the listener. Queued retries die with the
    /// engine; unsynced rows survive in the store and flush next start.
    pub fn shutdown(&self) {
        self.stop_auto_sync();
        self.stop_network_listener();
    }

    /// React to the network coming back.
    pub async fn on_connectivity_restored(&self, owner_id: &str) {
        tracing::info!("connectivity restored; draining retries, then syncing");
        self.process_retry_queue().await;
        if let Err(error) = self.sync_now(owner_id).await {
            tracing::warn!(%error, "post-reconnect sync failed");
        }
    }

    /// React to the network going away.
    pub fn on_connectivity_lost(&self) {
        tracing::info!("connectivity lost");
        self.set_status(SyncStatus::Idle);
    }

    /// Claim the single in-flight slot, or `None` when a pass is running.
    fn try_begin(&self) -> Option<BusyGuard<'_>> {
        self.inner
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
            .then(|| BusyGuard(&self.inner.busy))
    }

    fn set_status(&self, status: SyncStatus) {
        self.inner.status.send_if_modified(|current| {
            if *current == status {
                false
            } else {
                *current = status;
                true
            }
        });
    }

    async fn push_or_enqueue(&self, id: &TaskId) {
        if let Err(error) = self.push_task(id).await {
            tracing::warn!(task_id = %id, %error, "propagation failed; queued for retry");
            self.inner.queue.enqueue(*id, RetryAction::CreateOrUpdate);
        }
    }

    /// Existence-check then create-or-update, then confirm locally.
    ///
    /// Reads the freshest local state instead of trusting the caller's
    /// snapshot: a rapid follow-up mutation must never be overwritten by a
    /// stale in-flight push. A retried create degrades to an update when
    /// the record appeared remotely in the meantime, which is what makes
    /// double propagation safe.
    async fn push_task(&self, id: &TaskId) -> Result<()> {
        let Some(task) = self.inner.store.get_task(id).await? else {
            tracing::debug!(task_id = %id, "task deleted locally; nothing to push");
            return Ok(());
        };

        if self.inner.remote.get(id).await?.is_some() {
            self.inner.remote.update(&task).await?;
        } else {
            self.inner.remote.create(&task).await?;
        }

        self.inner.store.mark_synced(id).await?;
        Ok(())
    }

    fn replace_handle(slot: &Mutex<Option<JoinHandle<()>>>, new: Option<JoinHandle<()>>) {
        let mut slot = slot.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(old) = std::mem::replace(&mut *slot, new) {
            old.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewTask, TaskPatch};
    use crate::net::ManualConnectivity;
    use crate::testing::MemoryRemote;
    use pretty_assertions::assert_eq;

    const OWNER: &str = "user-1";

    struct Harness {
        engine: SyncEngine,
        store: TaskStore,
        remote: Arc<MemoryRemote>,
        net: Arc<ManualConnectivity>,
    }

    async fn harness(online: bool) -> Harness {
        let store = TaskStore::open_in_memory().await.unwrap();
        let remote = Arc::new(MemoryRemote::default());
        let net = Arc::new(ManualConnectivity::new(online));
        let engine = SyncEngine::new(store.clone(), remote.clone(), net.clone());
        Harness {
            engine,
            store,
            remote,
            net,
        }
    }

    fn draft(title: &str) -> NewTask {
        NewTask {
            title: title.to_string(),
            ..NewTask::default()
        }
    }

    async fn seed_local(store: &TaskStore, title: &str) -> Task {
        let task = Task::new(OWNER, draft(title));
        store.create_task(&task).await.unwrap();
        task
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn sync_now_with_nothing_pending_reports_synced() {
        let h = harness(true).await;

        h.engine.sync_now(OWNER).await.unwrap();

        assert_eq!(h.engine.status(), SyncStatus::Synced);
        assert_eq!(h.remote.len(), 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn sync_now_flushes_offline_creates() {
        let h = harness(true).await;
        for i in 0..3 {
            seed_local(&h.store, &format!("task {i}")).await;
        }

        h.engine.sync_now(OWNER).await.unwrap();

        assert_eq!(h.remote.len(), 3);
        assert_eq!(h.remote.create_calls(), 3);
        let local = h.store.list_tasks(OWNER).await.unwrap();
        assert!(local.iter().all(|t| t.synced));
        assert_eq!(h.engine.status(), SyncStatus::Synced);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn propagation_degrades_create_to_update_when_remote_has_id() {
        let h = harness(true).await;
        let task = seed_local(&h.store, "original").await;
        h.remote.seed(task.clone());

        let edited = h
            .store
            .update_task(
                &task.id,
                &TaskPatch {
                    title: Some("edited".to_string()),
                    ..TaskPatch::default()
                },
            )
            .await
            .unwrap();
        h.engine.propagate_task(&edited).await;

        assert_eq!(h.remote.create_calls(), 0);
        assert_eq!(h.remote.update_calls(), 1);
        assert_eq!(h.remote.task(&task.id).unwrap().title, "edited");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn double_propagation_yields_one_remote_record() {
        let h = harness(true).await;
        let task = seed_local(&h.store, "only once").await;

        h.engine.propagate_task(&task).await;
        h.engine.propagate_task(&task).await;

        assert_eq!(h.remote.len(), 1);
        assert_eq!(h.remote.create_calls(), 1);
        assert_eq!(h.remote.update_calls(), 1);
        assert_eq!(h.remote.task(&task.id).unwrap().title, "only once");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn offline_propagation_leaves_no_queue_entry() {
        let h = harness(false).await;
        let task = seed_local(&h.store, "offline create").await;

        h.engine.propagate_task(&task).await;

        // Covered by the unsynced flag, not the queue
        assert!(h.engine.queue_status().entries.is_empty());
        assert_eq!(h.remote.len(), 0);
        let local = h.store.get_task(&task.id).await.unwrap().unwrap();
        assert!(!local.synced);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn failed_propagation_is_queued_and_retried() {
        let h = harness(true).await;
        let task = seed_local(&h.store, "flaky network").await;

        h.remote.set_failing(true);
        h.engine.propagate_task(&task).await;

        let status = h.engine.queue_status();
        assert_eq!(status.count, 1);
        assert_eq!(status.entries[0].action, RetryAction::CreateOrUpdate);

        h.remote.set_failing(false);
        h.engine.process_retry_queue().await;

        assert!(h.engine.queue_status().entries.is_empty());
        assert_eq!(h.remote.task(&task.id).unwrap().title, "flaky network");
        let local = h.store.get_task(&task.id).await.unwrap().unwrap();
        assert!(local.synced);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn queue_collapses_to_latest_intent_per_id() {
        let h = harness(true).await;
        let task = seed_local(&h.store, "update then delete").await;

        h.remote.set_failing(true);
        h.engine.propagate_task(&task).await;
        h.net.set_online(false);
        h.engine.propagate_deletion(task.id).await;

        let entries = h.engine.queue_status().entries;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].task_id, task.id);
        assert_eq!(entries[0].action, RetryAction::Delete);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn offline_deletion_is_local_immediately_and_queued_for_remote() {
        let h = harness(true).await;
        let task = seed_local(&h.store, "doomed").await;
        h.engine.sync_now(OWNER).await.unwrap();
        assert_eq!(h.remote.len(), 1);

        h.net.set_online(false);
        assert!(h.store.delete_task(&task.id).await.unwrap());
        h.engine.propagate_deletion(task.id).await;

        assert!(h.store.get_task(&task.id).await.unwrap().is_none());
        let entries = h.engine.queue_status().entries;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action, RetryAction::Delete);
        // Remote still has it until connectivity returns
        assert_eq!(h.remote.len(), 1);

        h.net.set_online(true);
        h.engine.process_retry_queue().await;
        assert_eq!(h.remote.len(), 0);
        assert!(h.engine.queue_status().entries.is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn retry_for_locally_deleted_task_is_dropped() {
        let h = harness(true).await;
        let ghost = TaskId::new();
        h.engine
            .inner
            .queue
            .enqueue(ghost, RetryAction::CreateOrUpdate);

        h.engine.process_retry_queue().await;

        assert!(h.engine.queue_status().entries.is_empty());
        assert_eq!(h.remote.create_calls(), 0);
        assert_eq!(h.remote.update_calls(), 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn retry_queue_is_untouched_while_offline() {
        let h = harness(false).await;
        h.engine
            .inner
            .queue
            .enqueue(TaskId::new(), RetryAction::Delete);

        h.engine.process_retry_queue().await;

        assert_eq!(h.engine.queue_status().count, 1);
        assert_eq!(h.remote.delete_calls(), 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn overlapping_sync_passes_do_not_duplicate_writes() {
        let h = harness(true).await;
        seed_local(&h.store, "contended").await;
        h.remote.set_latency(Duration::from_millis(50));

        let first = h.engine.clone();
        let second = h.engine.clone();
        let (a, b) = tokio::join!(first.sync_now(OWNER), second.sync_now(OWNER));
        a.unwrap();
        b.unwrap();

        assert_eq!(h.remote.create_calls(), 1);
        assert_eq!(h.remote.update_calls(), 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn reconnect_converges_offline_work() {
        let h = harness(false).await;
        for i in 0..4 {
            seed_local(&h.store, &format!("offline {i}")).await;
        }

        h.net.set_online(true);
        h.engine.on_connectivity_restored(OWNER).await;

        assert_eq!(h.remote.len(), 4);
        let local = h.store.list_tasks(OWNER).await.unwrap();
        assert_eq!(local.len(), 4);
        assert!(local.iter().all(|t| t.synced));
        for task in &local {
            assert_eq!(h.remote.task(&task.id).unwrap().title, task.title);
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn rapid_double_update_converges_to_latest_state() {
        let h = harness(true).await;
        let task = seed_local(&h.store, "Buy milk").await;
        h.engine.sync_now(OWNER).await.unwrap();

        // Both mutations land locally before either propagation runs
        h.store
            .update_task(
                &task.id,
                &TaskPatch {
                    title: Some("Buy milk and eggs".to_string()),
                    ..TaskPatch::default()
                },
            )
            .await
            .unwrap();
        let latest = h
            .store
            .update_task(
                &task.id,
                &TaskPatch {
                    title: Some("Buy milk, eggs, bread".to_string()),
                    ..TaskPatch::default()
                },
            )
            .await
            .unwrap();

        h.engine.propagate_task(&task).await;
        h.engine.propagate_task(&latest).await;

        assert_eq!(h.remote.task(&task.id).unwrap().title, "Buy milk, eggs, bread");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn connectivity_lost_resets_status_without_remote_calls() {
        let h = harness(true).await;
        h.engine.sync_now(OWNER).await.unwrap();
        assert_eq!(h.engine.status(), SyncStatus::Synced);

        h.engine.on_connectivity_lost();

        assert_eq!(h.engine.status(), SyncStatus::Idle);
        assert_eq!(h.remote.create_calls(), 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn network_listener_drains_queue_then_syncs() {
        let h = harness(true).await;
        let deleted = seed_local(&h.store, "deleted offline").await;
        h.engine.sync_now(OWNER).await.unwrap();

        h.net.set_online(false);
        h.engine.setup_network_listener(OWNER);

        h.store.delete_task(&deleted.id).await.unwrap();
        h.engine.propagate_deletion(deleted.id).await;
        let pending = seed_local(&h.store, "created offline").await;

        h.net.set_online(true);
        for _ in 0..100 {
            let queue_empty = h.engine.queue_status().entries.is_empty();
            let synced = h
                .store
                .get_task(&pending.id)
                .await
                .unwrap()
                .is_some_and(|t| t.synced);
            if queue_empty && synced {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        assert!(h.remote.task(&deleted.id).is_none());
        assert_eq!(h.remote.task(&pending.id).unwrap().title, "created offline");
        h.engine.shutdown();
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn auto_sync_timer_flushes_pending_work() {
        let h = harness(true).await;
        let task = seed_local(&h.store, "timed").await;

        h.engine.start_auto_sync(OWNER, Duration::from_millis(20));
        // Restarting must replace the timer, not stack a second one
        h.engine.start_auto_sync(OWNER, Duration::from_millis(20));

        for _ in 0..100 {
            if h
                .store
                .get_task(&task.id)
                .await
                .unwrap()
                .is_some_and(|t| t.synced)
            {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        assert_eq!(h.remote.len(), 1);
        h.engine.stop_auto_sync();
        h.engine.stop_auto_sync(); // safe when already stopped
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn stop_auto_sync_before_start_is_safe() {
        let h = harness(true).await;
        h.engine.stop_auto_sync();
        h.engine.shutdown();
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn pull_imports_missing_and_refreshes_stale_records() {
        let h = harness(true).await;

        // Remote-only record
        let mut remote_only = Task::new(OWNER, draft("remote only"));
        remote_only.synced = true;
        h.remote.seed(remote_only.clone());

        // Local record with a newer remote copy and no pending edits
        let stale = seed_local(&h.store, "stale local").await;
        h.engine.sync_now(OWNER).await.unwrap();
        let mut newer = h.store.get_task(&stale.id).await.unwrap().unwrap();
        newer.title = "refreshed remotely".to_string();
        newer.updated_at += 1_000;
        h.remote.seed(newer);

        // Local record with unsynced edits; remote copy is newer but must lose
        let edited = seed_local(&h.store, "local edit wins").await;
        let mut remote_conflict = edited.clone();
        remote_conflict.title = "remote edit loses".to_string();
        remote_conflict.updated_at += 1_000;
        h.remote.seed(remote_conflict);

        let report = h.engine.pull(OWNER).await.unwrap();

        assert_eq!(report.fetched, 3);
        assert_eq!(report.added, 1);
        assert_eq!(report.refreshed, 1);

        let imported = h.store.get_task(&remote_only.id).await.unwrap().unwrap();
        assert!(imported.synced);
        assert_eq!(imported.title, "remote only");

        let refreshed = h.store.get_task(&stale.id).await.unwrap().unwrap();
        assert_eq!(refreshed.title, "refreshed remotely");

        let kept = h.store.get_task(&edited.id).await.unwrap().unwrap();
        assert_eq!(kept.title, "local edit wins");
        assert!(!kept.synced);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn pull_surfaces_remote_errors() {
        let h = harness(true).await;
        h.remote.set_failing(true);

        assert!(h.engine.pull(OWNER).await.is_err());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn status_subscription_sees_transitions() {
        let h = harness(true).await;
        let mut rx = h.engine.subscribe_status();

        h.engine.sync_now(OWNER).await.unwrap();

        rx.changed().await.unwrap();
        // Syncing may already have been replaced by Synced; the final
        // settled value is what matters
        let mut last = *rx.borrow_and_update();
        while rx.has_changed().unwrap() {
            rx.changed().await.unwrap();
            last = *rx.borrow_and_update();
        }
        assert_eq!(last, SyncStatus::Synced);
    }
}
