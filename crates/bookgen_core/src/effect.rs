use url::Url;

use crate::{GenerationRequest, HistoryEntry, JobHandle, SubmissionId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Submit {
        submission: SubmissionId,
        request: GenerationRequest,
    },
    Subscribe { handle: JobHandle },
    /// Stops local delivery only; server-side work keeps running.
    CloseChannel { handle: JobHandle },
    /// Write the full ledger through to durable storage.
    PersistHistory { entries: Vec<HistoryEntry> },
    DownloadArtifact { location: Url },
}
