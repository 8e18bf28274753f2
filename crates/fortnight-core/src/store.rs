//! The authoritative in-memory task collection for a session.
//!
//! One store exists per authenticated session and both calendar views read
//! through it. Mutations arrive only from the sync engine — optimistically
//! before a remote call resolves, or with the server's canonical record
//! afterwards.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::debug;

use crate::task::{Task, TaskId};

#[derive(Debug, Default)]
pub struct TaskStore {
    by_id: BTreeMap<TaskId, Task>,
    by_date: BTreeMap<NaiveDate, Vec<TaskId>>,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.by_id.get(&id)
    }

    pub fn all(&self) -> impl Iterator<Item = &Task> {
        self.by_id.values()
    }

    /// Tasks whose `date` field equals `date` exactly, in display order:
    /// untimed tasks first, then by time, ties broken by title.
    ///
    /// Dates are opaque calendar-day keys; there is no timezone shifting
    /// anywhere on this path.
    pub fn tasks_on(&self, date: NaiveDate) -> Vec<Task> {
        let mut tasks: Vec<Task> = self
            .by_date
            .get(&date)
            .into_iter()
            .flatten()
            .filter_map(|id| self.by_id.get(id))
            .cloned()
            .collect();
        tasks.sort_by(display_order);
        tasks
    }

    /// Hydrate the store wholesale. Duplicate ids in the input collapse to
    /// the last record, so replaying the same set is idempotent.
    #[tracing::instrument(skip(self, tasks))]
    pub fn replace_all(&mut self, tasks: Vec<Task>) {
        self.by_id.clear();
        self.by_date.clear();
        for task in tasks {
            self.upsert(task);
        }
        debug!(count = self.by_id.len(), "store hydrated");
    }

    /// Insert or replace by id, returning the replaced record if any. A
    /// task that moved between dates is re-bucketed in the date index.
    #[tracing::instrument(skip(self, task), fields(id = %task.id, date = %task.date))]
    pub fn upsert(&mut self, task: Task) -> Option<Task> {
        let prior = self.by_id.insert(task.id, task.clone());

        if let Some(prior) = &prior
            && prior.date != task.date
        {
            self.unindex(prior.date, task.id);
        }

        let bucket = self.by_date.entry(task.date).or_default();
        if !bucket.contains(&task.id) {
            bucket.push(task.id);
        }

        prior
    }

    /// Remove by id, returning the prior record so a failed remote call can
    /// be rolled back by re-inserting it.
    #[tracing::instrument(skip(self), fields(id = %id))]
    pub fn remove(&mut self, id: TaskId) -> Option<Task> {
        let removed = self.by_id.remove(&id)?;
        self.unindex(removed.date, id);
        Some(removed)
    }

    fn unindex(&mut self, date: NaiveDate, id: TaskId) {
        if let Some(bucket) = self.by_date.get_mut(&date) {
            bucket.retain(|entry| *entry != id);
            if bucket.is_empty() {
                self.by_date.remove(&date);
            }
        }
    }
}

fn display_order(a: &Task, b: &Task) -> Ordering {
    match (a.time, b.time) {
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (left, right) => left
            .cmp(&right)
            .then_with(|| a.title.cmp(&b.title))
            .then_with(|| a.id.cmp(&b.id)),
    }
}
