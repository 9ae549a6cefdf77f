//! Bookgen engine: the HTTP job channel and effect execution.
mod channel;
mod engine;
mod persist;
mod sse;
mod types;

pub use channel::{JobChannel, JobEventStream, ReqwestJobChannel};
pub use engine::EngineHandle;
pub use persist::{
    ensure_dir, AtomicFileWriter, JsonFileHistoryStore, PersistError, HISTORY_FILENAME,
};
pub use sse::{decode_event, resolve_against_origin, SseDecoder};
pub use types::{ChannelError, ChannelSettings, EngineEvent, EngineStopped, FailureKind};
