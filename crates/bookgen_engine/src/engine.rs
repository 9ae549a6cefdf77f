use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use bookgen_core::{GenerationRequest, JobHandle, SubmissionId};
use bookgen_logging::{bookgen_debug, bookgen_info, bookgen_warn};
use futures_util::StreamExt;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::{EngineEvent, EngineStopped, JobChannel};

enum EngineCommand {
    Submit {
        submission: SubmissionId,
        request: GenerationRequest,
    },
    Subscribe {
        handle: JobHandle,
    },
    Close {
        handle: JobHandle,
    },
    Download {
        location: Url,
        dest_dir: PathBuf,
    },
}

/// Runs channel IO on a background tokio runtime. Commands go in from the
/// dispatch loop; results come back as [`EngineEvent`]s in the order the
/// engine produced them.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    pub fn new(channel: Arc<dyn JobChannel>) -> std::io::Result<Self> {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let runtime = tokio::runtime::Runtime::new()?;

        thread::spawn(move || {
            let mut subscriptions: HashMap<JobHandle, CancellationToken> = HashMap::new();
            while let Ok(command) = cmd_rx.recv() {
                handle_command(
                    &runtime,
                    &channel,
                    &mut subscriptions,
                    command,
                    event_tx.clone(),
                );
            }
            for token in subscriptions.into_values() {
                token.cancel();
            }
        });

        Ok(Self { cmd_tx, event_rx })
    }

    pub fn submit(&self, submission: SubmissionId, request: GenerationRequest) {
        let _ = self.cmd_tx.send(EngineCommand::Submit {
            submission,
            request,
        });
    }

    pub fn subscribe(&self, handle: JobHandle) {
        let _ = self.cmd_tx.send(EngineCommand::Subscribe { handle });
    }

    /// Stops local delivery for `handle`. The backend is not told.
    pub fn close(&self, handle: JobHandle) {
        let _ = self.cmd_tx.send(EngineCommand::Close { handle });
    }

    pub fn download(&self, location: Url, dest_dir: PathBuf) {
        let _ = self.cmd_tx.send(EngineCommand::Download { location, dest_dir });
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    /// `Ok(None)` on timeout; `Err` once the engine thread has gone away.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Option<EngineEvent>, EngineStopped> {
        match self.event_rx.recv_timeout(timeout) {
            Ok(event) => Ok(Some(event)),
            Err(mpsc::RecvTimeoutError::Timeout) => Ok(None),
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(EngineStopped),
        }
    }
}

fn handle_command(
    runtime: &tokio::runtime::Runtime,
    channel: &Arc<dyn JobChannel>,
    subscriptions: &mut HashMap<JobHandle, CancellationToken>,
    command: EngineCommand,
    event_tx: mpsc::Sender<EngineEvent>,
) {
    match command {
        EngineCommand::Submit {
            submission,
            request,
        } => {
            let channel = channel.clone();
            runtime.spawn(async move {
                let event = match channel.submit(&request).await {
                    Ok(handle) => {
                        bookgen_info!("Submission {} accepted as job {}", submission, handle);
                        EngineEvent::Submitted { submission, handle }
                    }
                    Err(error) => EngineEvent::SubmissionFailed { submission, error },
                };
                let _ = event_tx.send(event);
            });
        }
        EngineCommand::Subscribe { handle } => {
            let token = CancellationToken::new();
            if let Some(previous) = subscriptions.insert(handle.clone(), token.clone()) {
                previous.cancel();
            }
            let channel = channel.clone();
            runtime.spawn(forward_events(channel, handle, token, event_tx));
        }
        EngineCommand::Close { handle } => {
            if let Some(token) = subscriptions.remove(&handle) {
                bookgen_debug!("Closing event stream for {}", handle);
                token.cancel();
            }
        }
        EngineCommand::Download { location, dest_dir } => {
            let channel = channel.clone();
            runtime.spawn(async move {
                let event = match channel.fetch_artifact(&location, &dest_dir).await {
                    Ok(path) => EngineEvent::ArtifactSaved { path },
                    Err(error) => {
                        bookgen_warn!("Download of {} failed: {}", location, error);
                        EngineEvent::ArtifactFailed { error }
                    }
                };
                let _ = event_tx.send(event);
            });
        }
    }
}

/// Single task per subscription, so events reach the dispatch loop in
/// arrival order.
async fn forward_events(
    channel: Arc<dyn JobChannel>,
    handle: JobHandle,
    token: CancellationToken,
    event_tx: mpsc::Sender<EngineEvent>,
) {
    let opened = token.run_until_cancelled(channel.subscribe(&handle)).await;
    let mut stream = match opened {
        None => return,
        Some(Ok(stream)) => stream,
        Some(Err(error)) => {
            let event = bookgen_core::JobEvent::StreamError {
                detail: error.to_string(),
            };
            let _ = event_tx.send(EngineEvent::Job { handle, event });
            return;
        }
    };

    while let Some(Some(event)) = token.run_until_cancelled(stream.next()).await {
        let terminal = event.is_terminal();
        if event_tx
            .send(EngineEvent::Job {
                handle: handle.clone(),
                event,
            })
            .is_err()
            || terminal
        {
            break;
        }
    }
}
