//! Wire representation of tasks.
//!
//! The remote service speaks strings: ISO `YYYY-MM-DD` dates and `HH:MM`
//! times. Every conversion between those strings and the domain's typed
//! calendar values happens here and nowhere else, so the rest of the
//! codebase never constructs a date by hand.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use fortnight_core::task::{Priority, Task, TaskDraft, TaskId};

use crate::error::{Result, SyncError};

pub const WIRE_DATE_FORMAT: &str = "%Y-%m-%d";
pub const WIRE_TIME_FORMAT: &str = "%H:%M";

/// A task as the service returns it. `id` is the durable identifier the
/// service owns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: u64,
    pub date: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
}

/// The create/update request body. The service assigns or already knows the
/// id, so the payload never carries one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskPayload {
    pub date: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub priority: Priority,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
}

impl TaskRecord {
    pub fn from_task(task: &Task) -> Self {
        Self {
            id: task.id.0,
            date: task.date.format(WIRE_DATE_FORMAT).to_string(),
            title: task.title.clone(),
            description: if task.description.is_empty() {
                None
            } else {
                Some(task.description.clone())
            },
            priority: task.priority,
            time: task.time.map(|t| t.format(WIRE_TIME_FORMAT).to_string()),
        }
    }

    pub fn into_task(self) -> Result<Task> {
        let date = NaiveDate::parse_from_str(&self.date, WIRE_DATE_FORMAT)
            .map_err(|err| SyncError::Wire(format!("bad date {:?}: {err}", self.date)))?;
        let time = self
            .time
            .as_deref()
            .map(|raw| {
                NaiveTime::parse_from_str(raw, WIRE_TIME_FORMAT)
                    .map_err(|err| SyncError::Wire(format!("bad time {raw:?}: {err}")))
            })
            .transpose()?;

        Ok(Task {
            id: TaskId(self.id),
            date,
            title: self.title,
            description: self.description.unwrap_or_default(),
            priority: self.priority,
            time,
        })
    }
}

impl TaskPayload {
    pub fn new(date: NaiveDate, draft: &TaskDraft) -> Self {
        Self {
            date: date.format(WIRE_DATE_FORMAT).to_string(),
            title: draft.title.clone(),
            description: if draft.description.is_empty() {
                None
            } else {
                Some(draft.description.clone())
            },
            priority: draft.priority,
            time: draft.time.map(|t| t.format(WIRE_TIME_FORMAT).to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> TaskRecord {
        TaskRecord {
            id: 42,
            date: "2025-09-08".to_string(),
            title: "Submit assignment".to_string(),
            description: Some("upload the PDF".to_string()),
            priority: Priority::High,
            time: Some("14:30".to_string()),
        }
    }

    #[test]
    fn record_converts_to_a_typed_task() {
        let task = record().into_task().expect("well-formed record");
        assert_eq!(task.id, TaskId(42));
        assert_eq!(
            task.date,
            NaiveDate::from_ymd_opt(2025, 9, 8).expect("valid date")
        );
        assert_eq!(
            task.time,
            Some(NaiveTime::from_hms_opt(14, 30, 0).expect("valid time"))
        );
        assert_eq!(task.priority, Priority::High);
    }

    #[test]
    fn record_task_round_trip_is_lossless() {
        let original = record();
        let task = original.clone().into_task().expect("well-formed record");
        assert_eq!(TaskRecord::from_task(&task), original);
    }

    #[test]
    fn malformed_date_is_a_wire_error() {
        let mut bad = record();
        bad.date = "09/08/2025".to_string();
        let err = bad.into_task().expect_err("US-style date must not parse");
        assert!(matches!(err, SyncError::Wire(_)), "got {err:?}");
    }

    #[test]
    fn malformed_time_is_a_wire_error() {
        let mut bad = record();
        bad.time = Some("2pm".to_string());
        assert!(matches!(
            bad.into_task().expect_err("bad time must not parse"),
            SyncError::Wire(_)
        ));
    }

    #[test]
    fn missing_optionals_default_cleanly() {
        let json = r#"{"id": 7, "date": "2025-01-02", "title": "minimal"}"#;
        let record: TaskRecord = serde_json::from_str(json).expect("minimal record parses");
        let task = record.into_task().expect("minimal record converts");
        assert_eq!(task.priority, Priority::Medium);
        assert!(task.description.is_empty());
        assert_eq!(task.time, None);
    }

    #[test]
    fn empty_description_stays_off_the_wire() {
        let draft = TaskDraft {
            title: "no notes".to_string(),
            ..TaskDraft::default()
        };
        let payload = TaskPayload::new(
            NaiveDate::from_ymd_opt(2025, 9, 8).expect("valid date"),
            &draft,
        );
        let json = serde_json::to_string(&payload).expect("payload serializes");
        assert!(!json.contains("description"));
        assert!(!json.contains("time"));
        assert!(json.contains("\"priority\":\"medium\""));
    }
}
