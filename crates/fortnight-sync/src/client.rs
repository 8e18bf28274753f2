//! Remote persistence client.
//!
//! `RemoteStore` is the seam the engine talks through; `HttpRemoteStore` is
//! the production implementation against the planner service's REST API.
//! The bearer credential is an opaque string supplied by the identity
//! collaborator — attached to every request, never refreshed here.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::StatusCode;
use tracing::{debug, instrument, warn};

use fortnight_core::task::TaskId;

use crate::error::{Result, SyncError};
use crate::wire::{TaskPayload, TaskRecord, WIRE_DATE_FORMAT};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const TASKS_PATH: &str = "/api/tasks/";

#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// List the authenticated user's tasks, optionally bounded to a
    /// closed date range.
    async fn list(&self, range: Option<(NaiveDate, NaiveDate)>) -> Result<Vec<TaskRecord>>;

    async fn create(&self, payload: &TaskPayload) -> Result<TaskRecord>;

    async fn update(&self, id: TaskId, payload: &TaskPayload) -> Result<TaskRecord>;

    async fn delete(&self, id: TaskId) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct HttpRemoteStore {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl HttpRemoteStore {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|err| SyncError::Transport(format!("failed building http client: {err}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    fn tasks_url(&self) -> String {
        format!("{}{TASKS_PATH}", self.base_url)
    }

    fn task_url(&self, id: TaskId) -> String {
        format!("{}{TASKS_PATH}{id}/", self.base_url)
    }
}

#[async_trait]
impl RemoteStore for HttpRemoteStore {
    #[instrument(skip(self))]
    async fn list(&self, range: Option<(NaiveDate, NaiveDate)>) -> Result<Vec<TaskRecord>> {
        let mut request = self
            .client
            .get(self.tasks_url())
            .bearer_auth(&self.token);
        if let Some((from, to)) = range {
            request = request.query(&[
                ("from", from.format(WIRE_DATE_FORMAT).to_string()),
                ("to", to.format(WIRE_DATE_FORMAT).to_string()),
            ]);
        }

        let response = request.send().await.map_err(transport)?;
        let response = check_status(response, None).await?;
        let records = response
            .json::<Vec<TaskRecord>>()
            .await
            .map_err(|err| SyncError::Wire(format!("bad task list body: {err}")))?;
        debug!(count = records.len(), "listed remote tasks");
        Ok(records)
    }

    #[instrument(skip(self, payload), fields(date = %payload.date, title = %payload.title))]
    async fn create(&self, payload: &TaskPayload) -> Result<TaskRecord> {
        let response = self
            .client
            .post(self.tasks_url())
            .bearer_auth(&self.token)
            .json(payload)
            .send()
            .await
            .map_err(transport)?;
        let response = check_status(response, None).await?;
        response
            .json::<TaskRecord>()
            .await
            .map_err(|err| SyncError::Wire(format!("bad created-task body: {err}")))
    }

    #[instrument(skip(self, payload), fields(id = %id))]
    async fn update(&self, id: TaskId, payload: &TaskPayload) -> Result<TaskRecord> {
        let response = self
            .client
            .put(self.task_url(id))
            .bearer_auth(&self.token)
            .json(payload)
            .send()
            .await
            .map_err(transport)?;
        let response = check_status(response, Some(id)).await?;
        response
            .json::<TaskRecord>()
            .await
            .map_err(|err| SyncError::Wire(format!("bad updated-task body: {err}")))
    }

    #[instrument(skip(self), fields(id = %id))]
    async fn delete(&self, id: TaskId) -> Result<()> {
        let response = self
            .client
            .delete(self.task_url(id))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(transport)?;
        check_status(response, Some(id)).await?;
        Ok(())
    }
}

fn transport(err: reqwest::Error) -> SyncError {
    SyncError::Transport(err.to_string())
}

/// Pass a successful response through; turn anything else into the typed
/// rejection, decoding the service's structured reason when there is one.
async fn check_status(response: reqwest::Response, id: Option<TaskId>) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    if status == StatusCode::NOT_FOUND
        && let Some(id) = id
    {
        warn!(id = %id, "remote does not know this task");
        return Err(SyncError::NotFound(id));
    }

    let body = response.text().await.unwrap_or_default();
    let reason = rejection_reason(&body, status);
    warn!(status = %status, reason = %reason, "remote rejected request");
    Err(SyncError::Rejected {
        status: status.as_u16(),
        reason,
    })
}

/// The service reports failures under a `detail`, `message`, or `error`
/// key; older deployments return plain text.
fn rejection_reason(body: &str, status: StatusCode) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["detail", "message", "error"] {
            if let Some(reason) = value.get(key).and_then(|v| v.as_str()) {
                return reason.to_string();
            }
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        format!("HTTP {status}")
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_reason_prefers_structured_keys() {
        let status = StatusCode::BAD_REQUEST;
        assert_eq!(
            rejection_reason(r#"{"detail": "title required"}"#, status),
            "title required"
        );
        assert_eq!(
            rejection_reason(r#"{"message": "too many tasks"}"#, status),
            "too many tasks"
        );
        assert_eq!(
            rejection_reason(r#"{"error": "nope"}"#, status),
            "nope"
        );
    }

    #[test]
    fn rejection_reason_falls_back_to_body_then_status() {
        let status = StatusCode::BAD_GATEWAY;
        assert_eq!(rejection_reason("upstream exploded", status), "upstream exploded");
        assert_eq!(rejection_reason("", status), "HTTP 502 Bad Gateway");
        assert_eq!(
            rejection_reason(r#"{"unexpected": true}"#, status),
            r#"{"unexpected": true}"#
        );
    }

    #[test]
    fn urls_are_django_style_with_trailing_slash() {
        let store =
            HttpRemoteStore::new("https://planner.example.com/", "tok").expect("client builds");
        assert_eq!(store.tasks_url(), "https://planner.example.com/api/tasks/");
        assert_eq!(
            store.task_url(TaskId(42)),
            "https://planner.example.com/api/tasks/42/"
        );
    }
}
