//! Bookgen core: payload validation, the job state machine and the history
//! ledger. Everything here is pure; IO lives in `bookgen_engine`.
mod effect;
mod history;
mod job;
mod msg;
mod request;
mod state;
mod update;
mod view_model;

pub use effect::Effect;
pub use history::{
    load_ledger, HistoryEntry, HistoryLedger, HistoryStore, MemoryHistoryStore,
    PersistenceError, HISTORY_CAPACITY,
};
pub use job::{JobEvent, JobHandle, JobStatus, Phase, SubmissionId};
pub use msg::Msg;
pub use request::{
    build_request, AgeGroup, BookSpecs, GenerationRequest, HumorLevel, SectionDescriptor,
    Segmentation, SourceDocument, StyleDescriptor, UnknownAgeGroup, ValidationError,
};
pub use state::{AppState, DownloadState};
pub use update::update;
pub use view_model::{AppViewModel, DownloadView, ARTIFACT_FILE_NAME};
