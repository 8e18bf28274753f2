//! The sync engine: optimistic-apply-then-reconcile.
//!
//! Every store mutation flows through here. Create and update apply a
//! locally-built record immediately so the calendar reflects the change
//! with no perceptible latency; when the remote call resolves the entry is
//! replaced with the server's canonical record (which may carry the durable
//! id or a normalized date). Delete removes immediately. On any failure the
//! optimistic mutation is reverted, so the store never silently diverges
//! from the remote source of truth.
//!
//! One attempt per user action — the error is surfaced and the user retries
//! manually. There is no cancel-in-flight: a pending call always runs to
//! completion and its effect lands in the store even if the user has
//! navigated away, because the store, not a view, is authoritative.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{NaiveDate, Utc};
use parking_lot::Mutex;
use tracing::{debug, info, instrument, warn};

use fortnight_core::store::TaskStore;
use fortnight_core::task::{Task, TaskDraft, TaskId};

use crate::cache::SessionCache;
use crate::client::RemoteStore;
use crate::error::{Result, SyncError};
use crate::wire::{TaskPayload, TaskRecord};

pub struct SyncEngine {
    store: Mutex<TaskStore>,
    remote: Arc<dyn RemoteStore>,
    in_flight: Mutex<HashSet<TaskId>>,
    provisional: Mutex<ProvisionalIds>,
    cache: Option<SessionCache>,
    hydrated: AtomicBool,
}

impl SyncEngine {
    pub fn new(remote: Arc<dyn RemoteStore>) -> Self {
        Self {
            store: Mutex::new(TaskStore::new()),
            remote,
            in_flight: Mutex::new(HashSet::new()),
            provisional: Mutex::new(ProvisionalIds::new()),
            cache: None,
            hydrated: AtomicBool::new(false),
        }
    }

    pub fn with_cache(mut self, cache: SessionCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Read access for the view composers. Lock scope is bounded by the
    /// closure; never hold it across an await point.
    pub fn with_store<R>(&self, read: impl FnOnce(&TaskStore) -> R) -> R {
        read(&self.store.lock())
    }

    pub fn tasks_on(&self, date: NaiveDate) -> Vec<Task> {
        self.store.lock().tasks_on(date)
    }

    /// Full fetch scoped to the authenticated user; the one wholesale
    /// `replace_all` of a session.
    #[instrument(skip(self))]
    pub async fn hydrate(&self) -> Result<usize> {
        let records = self.remote.list(None).await?;
        let tasks = records
            .into_iter()
            .map(TaskRecord::into_task)
            .collect::<Result<Vec<Task>>>()?;
        let count = tasks.len();

        self.store.lock().replace_all(tasks);
        self.hydrated.store(true, Ordering::SeqCst);
        self.write_cache();
        info!(count, "store hydrated from remote");
        Ok(count)
    }

    /// Seed the store from the session cache while the first fetch is still
    /// outstanding. Does nothing once `hydrate` has succeeded — the cache
    /// is a fallback, never an authority.
    #[instrument(skip(self))]
    pub fn seed_from_cache(&self) -> usize {
        if self.hydrated.load(Ordering::SeqCst) {
            return 0;
        }
        let Some(cache) = &self.cache else {
            return 0;
        };

        let tasks: Vec<Task> = cache
            .load()
            .into_iter()
            .filter_map(|record| match record.into_task() {
                Ok(task) => Some(task),
                Err(err) => {
                    warn!(error = %err, "skipping malformed cached record");
                    None
                }
            })
            .collect();

        let count = tasks.len();
        if count > 0 {
            self.store.lock().replace_all(tasks);
            info!(count, "store seeded from session cache");
        }
        count
    }

    #[instrument(skip(self, draft), fields(date = %date, title = %draft.title))]
    pub async fn create(&self, date: NaiveDate, draft: TaskDraft) -> Result<Task> {
        let provisional_id = self.provisional.lock().allocate();
        let _guard = self.mark_in_flight(provisional_id)?;

        self.store
            .lock()
            .upsert(Task::from_draft(provisional_id, date, draft.clone()));
        debug!(id = %provisional_id, "optimistic create applied");

        let payload = TaskPayload::new(date, &draft);
        let outcome = match self.remote.create(&payload).await {
            Ok(record) => record.into_task(),
            Err(err) => Err(err),
        };

        match outcome {
            Ok(task) => {
                {
                    let mut store = self.store.lock();
                    store.remove(provisional_id);
                    store.upsert(task.clone());
                }
                self.write_cache();
                info!(id = %task.id, "create reconciled with canonical record");
                Ok(task)
            }
            Err(err) => {
                self.store.lock().remove(provisional_id);
                warn!(error = %err, "create failed; optimistic record removed");
                Err(err)
            }
        }
    }

    #[instrument(skip(self, draft), fields(id = %id, title = %draft.title))]
    pub async fn update(&self, id: TaskId, draft: TaskDraft) -> Result<Task> {
        let _guard = self.mark_in_flight(id)?;

        let prior = self
            .store
            .lock()
            .get(id)
            .cloned()
            .ok_or(SyncError::NotFound(id))?;

        self.store
            .lock()
            .upsert(Task::from_draft(id, prior.date, draft.clone()));
        debug!("optimistic update applied");

        let payload = TaskPayload::new(prior.date, &draft);
        let outcome = match self.remote.update(id, &payload).await {
            Ok(record) => record.into_task(),
            Err(err) => Err(err),
        };

        match outcome {
            Ok(task) => {
                self.store.lock().upsert(task.clone());
                self.write_cache();
                info!("update reconciled with canonical record");
                Ok(task)
            }
            Err(err) => {
                self.store.lock().upsert(prior);
                warn!(error = %err, "update failed; prior record restored");
                Err(err)
            }
        }
    }

    #[instrument(skip(self), fields(id = %id))]
    pub async fn delete(&self, id: TaskId) -> Result<()> {
        let _guard = self.mark_in_flight(id)?;

        let prior = self.store.lock().remove(id).ok_or(SyncError::NotFound(id))?;
        debug!("optimistic delete applied");

        match self.remote.delete(id).await {
            Ok(()) => {
                self.write_cache();
                info!("delete confirmed by remote");
                Ok(())
            }
            Err(err) => {
                self.store.lock().upsert(prior);
                warn!(error = %err, "delete failed; prior record restored");
                Err(err)
            }
        }
    }

    /// Per-id serialization: a second mutation while one is outstanding for
    /// the same id is rejected rather than reordered. The guard releases on
    /// both completion paths.
    fn mark_in_flight(&self, id: TaskId) -> Result<InFlightGuard<'_>> {
        let mut in_flight = self.in_flight.lock();
        if !in_flight.insert(id) {
            warn!(id = %id, "rejecting mutation; one already outstanding");
            return Err(SyncError::MutationInFlight(id));
        }
        Ok(InFlightGuard {
            set: &self.in_flight,
            id,
        })
    }

    /// Keep the fallback seed fresh. Best-effort: cache trouble never fails
    /// a mutation that the remote already accepted.
    fn write_cache(&self) {
        let Some(cache) = &self.cache else {
            return;
        };
        let records: Vec<TaskRecord> = {
            let store = self.store.lock();
            store.all().map(TaskRecord::from_task).collect()
        };
        if let Err(err) = cache.store(&records) {
            warn!(error = %err, "failed writing session cache");
        }
    }
}

struct InFlightGuard<'a> {
    set: &'a Mutex<HashSet<TaskId>>,
    id: TaskId,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.set.lock().remove(&self.id);
    }
}

/// Provisional-id allocator: epoch-millis seeded, monotonic. The historical
/// client used a raw timestamp, which collides when two creates land in the
/// same millisecond; the counter cannot. Durable server ids are small
/// sequence integers, far below this range, and reconciliation retires
/// every provisional id anyway.
#[derive(Debug)]
struct ProvisionalIds {
    next: u64,
}

impl ProvisionalIds {
    fn new() -> Self {
        Self {
            next: Utc::now().timestamp_millis().max(0) as u64,
        }
    }

    fn allocate(&mut self) -> TaskId {
        let id = TaskId(self.next);
        self.next += 1;
        id
    }
}
