use crate::state::{DownloadState, EventOutcome};
use crate::{AppState, Effect, Msg, Phase};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::SubmitClicked(request) => {
            // At most one tracked job; the view disables the trigger otherwise.
            if state.status().phase != Phase::Idle {
                return (state, Vec::new());
            }
            let submission = state.begin_submission(request.document.base_name());
            vec![Effect::Submit {
                submission,
                request,
            }]
        }
        Msg::Submitted { submission, handle } => {
            if state.accept_handle(submission, handle.clone()) {
                vec![Effect::Subscribe { handle }]
            } else {
                Vec::new()
            }
        }
        Msg::SubmissionFailed {
            submission,
            message,
        } => {
            state.fail_submission(submission, &message);
            Vec::new()
        }
        Msg::JobEvent {
            handle,
            event,
            received_at,
        } => match state.apply_event(&handle, event, received_at) {
            EventOutcome::Ignored | EventOutcome::Updated => Vec::new(),
            EventOutcome::Completed => vec![
                Effect::CloseChannel { handle },
                Effect::PersistHistory {
                    entries: state.history().list().to_vec(),
                },
            ],
            EventOutcome::Failed => vec![Effect::CloseChannel { handle }],
        },
        Msg::ResetClicked => match state.reset() {
            Some(handle) => vec![Effect::CloseChannel { handle }],
            None => Vec::new(),
        },
        Msg::HistoryRestored(entries) => {
            state.restore_history(entries);
            Vec::new()
        }
        Msg::HistoryDeleteClicked { id } => {
            if state.remove_history(&id) {
                vec![Effect::PersistHistory {
                    entries: state.history().list().to_vec(),
                }]
            } else {
                Vec::new()
            }
        }
        Msg::DownloadClicked => match state.status().result_location.clone() {
            Some(location) => {
                state.set_download(DownloadState::InProgress);
                vec![Effect::DownloadArtifact { location }]
            }
            None => Vec::new(),
        },
        Msg::HistoryDownloadClicked { id } => match state.history_location(&id) {
            Some(location) => {
                state.set_download(DownloadState::InProgress);
                vec![Effect::DownloadArtifact { location }]
            }
            None => Vec::new(),
        },
        Msg::ArtifactSaved { path } => {
            state.set_download(DownloadState::Saved(path));
            Vec::new()
        }
        Msg::ArtifactFailed { message } => {
            state.set_download(DownloadState::Failed(message));
            Vec::new()
        }
    };

    (state, effects)
}
