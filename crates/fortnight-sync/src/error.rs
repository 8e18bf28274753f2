//! Error taxonomy for remote synchronization.
//!
//! Validation never reaches this module: the editor refuses unsaveable
//! drafts locally and no remote call is made. Every variant here leaves the
//! task store rolled back to the last known-good remote state, so none is
//! fatal to the session.

use fortnight_core::task::TaskId;

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// The request never completed: network unreachable, DNS failure,
    /// transport timeout.
    #[error("transport error: {0}")]
    Transport(String),

    /// The service answered with a non-success status. `reason` carries the
    /// server's own wording, surfaced verbatim to the user.
    #[error("remote rejected request ({status}): {reason}")]
    Rejected { status: u16, reason: String },

    /// The record to update or delete does not exist — locally or on the
    /// remote (HTTP 404). Treated like any other failure: rolled back.
    #[error("task {0} not found")]
    NotFound(TaskId),

    /// The service returned a record this client cannot interpret
    /// (unparseable date or time).
    #[error("malformed record from remote: {0}")]
    Wire(String),

    /// A mutation for this task id is already outstanding; retry once it
    /// resolves.
    #[error("mutation already in flight for task {0}")]
    MutationInFlight(TaskId),
}

pub type Result<T> = std::result::Result<T, SyncError>;
