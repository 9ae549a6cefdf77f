use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use bookgen_core::{JobEvent, JobHandle, SubmissionId};
use url::Url;

#[derive(Debug, Clone)]
pub struct ChannelSettings {
    /// Backend origin, e.g. `http://localhost:8000`.
    pub origin: Url,
    pub connect_timeout: Duration,
    /// Applies to the submit call and artifact downloads, never to the stream.
    pub request_timeout: Duration,
}

impl ChannelSettings {
    pub fn new(origin: Url) -> Self {
        Self {
            origin,
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(60),
        }
    }
}

/// Messages the engine thread reports back to the dispatch loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    Submitted {
        submission: SubmissionId,
        handle: JobHandle,
    },
    SubmissionFailed {
        submission: SubmissionId,
        error: ChannelError,
    },
    Job {
        handle: JobHandle,
        event: JobEvent,
    },
    ArtifactSaved {
        path: PathBuf,
    },
    ArtifactFailed {
        error: ChannelError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct ChannelError {
    pub kind: FailureKind,
    pub message: String,
}

impl ChannelError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    /// The source document could not be read.
    Document,
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    Network,
    /// The backend answered with something we could not decode.
    InvalidResponse,
    /// Writing the artifact to disk failed.
    Persist,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Document => write!(f, "document unreadable"),
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::InvalidResponse => write!(f, "invalid response"),
            FailureKind::Persist => write!(f, "could not save file"),
        }
    }
}

/// The engine thread is gone; no further events will arrive.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("engine stopped: event channel disconnected")]
pub struct EngineStopped;
