use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

/// Identifier the backend issues for an accepted submission.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobHandle(String);

impl JobHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Client-local tag for one submit call, used to drop responses that arrive
/// after the submission was abandoned by a reset.
pub type SubmissionId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Submitting,
    Running,
    Completed,
    Failed,
}

impl Phase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Completed | Phase::Failed)
    }
}

/// Observable status of the tracked job.
///
/// `result_location` is `Some` exactly when `phase` is `Completed`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct JobStatus {
    pub phase: Phase,
    pub progress: u8,
    pub message: String,
    pub result_location: Option<Url>,
}

/// One decoded event from a job's status stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobEvent {
    /// Missing fields leave the current value untouched.
    Progress {
        percent: Option<u8>,
        message: Option<String>,
    },
    Completed {
        result_location: Url,
        title: Option<String>,
        percent: Option<u8>,
        message: Option<String>,
    },
    Failed {
        message: String,
    },
    /// The live connection broke before a terminal event arrived.
    StreamError {
        detail: String,
    },
}

impl JobEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobEvent::Progress { .. })
    }
}
