use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use bookgen_core::{Effect, HistoryStore, Msg};
use bookgen_engine::{EngineEvent, EngineHandle, EngineStopped, JobChannel};
use bookgen_logging::bookgen_info;
use chrono::Utc;

use super::persistence;

pub struct EffectRunner {
    engine: EngineHandle,
    store: Arc<dyn HistoryStore>,
    download_dir: PathBuf,
}

impl EffectRunner {
    pub fn new(
        channel: Arc<dyn JobChannel>,
        store: Arc<dyn HistoryStore>,
        download_dir: PathBuf,
    ) -> std::io::Result<Self> {
        Ok(Self {
            engine: EngineHandle::new(channel)?,
            store,
            download_dir,
        })
    }

    pub fn store(&self) -> &dyn HistoryStore {
        self.store.as_ref()
    }

    pub fn run(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Submit {
                    submission,
                    request,
                } => {
                    bookgen_info!(
                        "Submit #{} file={} theme={:?} age={}",
                        submission,
                        request.document.file_name,
                        request.style.theme,
                        request.style.age_group
                    );
                    self.engine.submit(submission, request);
                }
                Effect::Subscribe { handle } => self.engine.subscribe(handle),
                Effect::CloseChannel { handle } => self.engine.close(handle),
                Effect::PersistHistory { entries } => {
                    persistence::save_history(self.store.as_ref(), &entries);
                }
                Effect::DownloadArtifact { location } => {
                    self.engine.download(location, self.download_dir.clone());
                }
            }
        }
    }

    /// Waits up to `timeout` for the next engine report, already translated
    /// into a message for the state machine.
    pub fn next_msg(&self, timeout: Duration) -> Result<Option<Msg>, EngineStopped> {
        Ok(self.engine.recv_timeout(timeout)?.map(map_event))
    }
}

fn map_event(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::Submitted { submission, handle } => Msg::Submitted { submission, handle },
        EngineEvent::SubmissionFailed { submission, error } => Msg::SubmissionFailed {
            submission,
            message: error.to_string(),
        },
        EngineEvent::Job { handle, event } => Msg::JobEvent {
            handle,
            event,
            received_at: Utc::now(),
        },
        EngineEvent::ArtifactSaved { path } => Msg::ArtifactSaved { path },
        EngineEvent::ArtifactFailed { error } => Msg::ArtifactFailed {
            message: error.to_string(),
        },
    }
}
