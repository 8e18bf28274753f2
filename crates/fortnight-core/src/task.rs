use std::fmt;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// Identifier for a task.
///
/// Durable ids are assigned by the remote store when a create resolves and
/// are immutable afterwards. Between the optimistic insert and the server
/// response, the sync engine keys the record with a provisional id;
/// reconciliation retires every provisional id, so none survives a
/// successful create.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TaskId(pub u64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

/// A dated, prioritized work item. The sole entity of the planner.
///
/// `date` is a plain calendar day with no time-of-day or timezone attached;
/// it is the partition key for every grid lookup. `time` is advisory and
/// only influences the display sort within a day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub id: TaskId,
    pub date: NaiveDate,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub time: Option<NaiveTime>,
}

impl Task {
    pub fn from_draft(id: TaskId, date: NaiveDate, draft: TaskDraft) -> Self {
        Self {
            id,
            date,
            title: draft.title,
            description: draft.description,
            priority: draft.priority,
            time: draft.time,
        }
    }
}

/// The editor's single form payload. Validation (non-empty title) lives in
/// the editor, not here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub time: Option<NaiveTime>,
}

impl TaskDraft {
    pub fn of_task(task: &Task) -> Self {
        Self {
            title: task.title.clone(),
            description: task.description.clone(),
            priority: task.priority,
            time: task.time,
        }
    }
}
