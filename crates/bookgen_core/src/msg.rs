use std::path::PathBuf;

use chrono::{DateTime, Utc};

use crate::{GenerationRequest, HistoryEntry, JobEvent, JobHandle, SubmissionId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User asked to generate a book from a validated request.
    SubmitClicked(GenerationRequest),
    /// The backend accepted the submission and issued a handle.
    Submitted {
        submission: SubmissionId,
        handle: JobHandle,
    },
    /// The submission call failed; no job exists server-side as far as we know.
    SubmissionFailed {
        submission: SubmissionId,
        message: String,
    },
    /// One event from the tracked job's stream, stamped on arrival.
    JobEvent {
        handle: JobHandle,
        event: JobEvent,
        received_at: DateTime<Utc>,
    },
    /// User clicked "Create New Book".
    ResetClicked,
    /// Restore the history ledger read from durable storage at startup.
    HistoryRestored(Vec<HistoryEntry>),
    /// User deleted a history entry.
    HistoryDeleteClicked { id: JobHandle },
    /// User asked to download the current result.
    DownloadClicked,
    /// User asked to download a result listed in history.
    HistoryDownloadClicked { id: JobHandle },
    /// Artifact written to disk.
    ArtifactSaved { path: PathBuf },
    /// Artifact download failed.
    ArtifactFailed { message: String },
}
