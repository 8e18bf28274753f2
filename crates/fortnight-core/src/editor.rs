//! Selection and editor state machine.
//!
//! Both calendar views share one editor: one active date, one form buffer,
//! at most one task being edited at any instant. Entering a new selection
//! overwrites the buffer — last selection wins, discarding any unsaved
//! draft. Saving emits an intent for the sync engine rather than mutating
//! the store; the editor itself never performs I/O.

use chrono::NaiveDate;
use tracing::debug;

use crate::task::{Task, TaskDraft, TaskId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    Idle,
    /// An empty date cell is active; the form would create a new task.
    DateSelected(NaiveDate),
    /// An existing task is loaded into the form for edit.
    TaskSelected(TaskId),
    /// A destructive delete awaits confirmation.
    PendingDelete(TaskId),
}

/// What a valid save asks the sync engine to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveIntent {
    Create { date: NaiveDate, draft: TaskDraft },
    Update { id: TaskId, draft: TaskDraft },
}

#[derive(Debug, Default)]
pub struct Editor {
    selection: Selection,
    active_date: Option<NaiveDate>,
    draft: TaskDraft,
}

impl Editor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn active_date(&self) -> Option<NaiveDate> {
        self.active_date
    }

    pub fn draft(&self) -> &TaskDraft {
        &self.draft
    }

    /// Form field edits write through here.
    pub fn draft_mut(&mut self) -> &mut TaskDraft {
        &mut self.draft
    }

    /// Click on a date cell. Re-clicking the already-active date leaves the
    /// open form alone; any other date starts a fresh create draft.
    pub fn select_date(&mut self, date: NaiveDate) {
        let same_active = self.active_date == Some(date);
        if same_active
            && matches!(
                self.selection,
                Selection::DateSelected(_) | Selection::TaskSelected(_)
            )
        {
            return;
        }
        if !same_active {
            self.draft = TaskDraft::default();
        }
        debug!(date = %date, "date selected");
        self.selection = Selection::DateSelected(date);
        self.active_date = Some(date);
    }

    /// Click on an existing task: load its fields into the form buffer and
    /// make its date the active one.
    pub fn select_task(&mut self, task: &Task) {
        debug!(id = %task.id, date = %task.date, "task selected for edit");
        self.selection = Selection::TaskSelected(task.id);
        self.active_date = Some(task.date);
        self.draft = TaskDraft::of_task(task);
    }

    /// Save the form. Returns `None` without changing state when the draft
    /// is not saveable (blank title, or nothing selected) — a silent no-op,
    /// not an error.
    pub fn save(&mut self) -> Option<SaveIntent> {
        if self.draft.title.trim().is_empty() {
            return None;
        }

        let intent = match self.selection {
            Selection::DateSelected(date) => SaveIntent::Create {
                date,
                draft: self.draft.clone(),
            },
            Selection::TaskSelected(id) => SaveIntent::Update {
                id,
                draft: self.draft.clone(),
            },
            Selection::Idle | Selection::PendingDelete(_) => return None,
        };

        self.reset();
        Some(intent)
    }

    /// Explicit cancel or a click outside the editor.
    pub fn dismiss(&mut self) {
        self.reset();
    }

    pub fn request_delete(&mut self, id: TaskId) {
        debug!(id = %id, "delete requested, awaiting confirmation");
        self.selection = Selection::PendingDelete(id);
    }

    /// Confirm the pending delete, handing the id to the sync engine. A
    /// no-op in every other state.
    pub fn confirm_delete(&mut self) -> Option<TaskId> {
        let Selection::PendingDelete(id) = self.selection else {
            return None;
        };
        self.reset();
        Some(id)
    }

    pub fn cancel_delete(&mut self) {
        if matches!(self.selection, Selection::PendingDelete(_)) {
            self.reset();
        }
    }

    fn reset(&mut self) {
        self.selection = Selection::Idle;
        self.active_date = None;
        self.draft = TaskDraft::default();
    }
}
