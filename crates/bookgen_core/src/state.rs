use std::path::PathBuf;

use bookgen_logging::{bookgen_debug, bookgen_info, bookgen_warn};
use chrono::{DateTime, Utc};
use url::Url;

use crate::view_model::{AppViewModel, DownloadView};
use crate::{
    HistoryEntry, HistoryLedger, JobEvent, JobHandle, JobStatus, Phase, SubmissionId,
};

pub(crate) const STARTING_MESSAGE: &str = "Starting...";
pub(crate) const STREAM_ERROR_MESSAGE: &str = "Lost connection to the generation service";

#[derive(Debug, Clone, PartialEq, Eq)]
struct TrackedJob {
    submission: SubmissionId,
    handle: Option<JobHandle>,
    /// Title used when the completed event carries none.
    fallback_title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DownloadState {
    #[default]
    None,
    InProgress,
    Saved(PathBuf),
    Failed(String),
}

/// What a stream event did to the tracked job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum EventOutcome {
    Ignored,
    Updated,
    Completed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    status: JobStatus,
    tracked: Option<TrackedJob>,
    last_submission: SubmissionId,
    history: HistoryLedger,
    download: DownloadState,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> &JobStatus {
        &self.status
    }

    pub fn history(&self) -> &HistoryLedger {
        &self.history
    }

    /// Handle of the job being tracked, once the backend has issued one.
    pub fn tracked_handle(&self) -> Option<&JobHandle> {
        self.tracked.as_ref().and_then(|job| job.handle.as_ref())
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel {
            phase: self.status.phase,
            progress: self.status.progress,
            message: self.status.message.clone(),
            result_location: self.status.result_location.clone(),
            job_handle: self.tracked_handle().cloned(),
            can_submit: self.status.phase == Phase::Idle,
            history: self.history.list().to_vec(),
            download: match &self.download {
                DownloadState::None => None,
                DownloadState::InProgress => Some(DownloadView::InProgress),
                DownloadState::Saved(path) => Some(DownloadView::Saved(path.clone())),
                DownloadState::Failed(message) => Some(DownloadView::Failed(message.clone())),
            },
        }
    }

    /// Returns whether a render is due and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn begin_submission(&mut self, fallback_title: String) -> SubmissionId {
        self.last_submission += 1;
        let submission = self.last_submission;
        self.tracked = Some(TrackedJob {
            submission,
            handle: None,
            fallback_title,
        });
        self.status = JobStatus {
            phase: Phase::Submitting,
            progress: 0,
            message: STARTING_MESSAGE.to_string(),
            result_location: None,
        };
        self.download = DownloadState::None;
        self.mark_dirty();
        submission
    }

    fn is_current_submission(&self, submission: SubmissionId) -> bool {
        self.status.phase == Phase::Submitting
            && self
                .tracked
                .as_ref()
                .is_some_and(|job| job.submission == submission)
    }

    /// Returns false when the response belongs to an abandoned submission.
    pub(crate) fn accept_handle(&mut self, submission: SubmissionId, handle: JobHandle) -> bool {
        if !self.is_current_submission(submission) {
            bookgen_debug!("Dropping handle {} for stale submission {}", handle, submission);
            return false;
        }
        if let Some(job) = self.tracked.as_mut() {
            job.handle = Some(handle);
        }
        self.status.phase = Phase::Running;
        self.status.progress = 0;
        self.mark_dirty();
        true
    }

    pub(crate) fn fail_submission(&mut self, submission: SubmissionId, message: &str) -> bool {
        if !self.is_current_submission(submission) {
            return false;
        }
        bookgen_warn!("Submission {} failed: {}", submission, message);
        self.tracked = None;
        self.status.phase = Phase::Failed;
        self.status.message = format!("Error connecting to backend: {message}");
        self.mark_dirty();
        true
    }

    pub(crate) fn apply_event(
        &mut self,
        handle: &JobHandle,
        event: JobEvent,
        received_at: DateTime<Utc>,
    ) -> EventOutcome {
        if self.status.phase != Phase::Running || self.tracked_handle() != Some(handle) {
            bookgen_debug!("Ignoring event for {} in phase {:?}", handle, self.status.phase);
            return EventOutcome::Ignored;
        }
        self.mark_dirty();

        match event {
            JobEvent::Progress { percent, message } => {
                // Regressions are applied as reported.
                if let Some(percent) = percent {
                    self.status.progress = percent;
                }
                if let Some(message) = message {
                    self.status.message = message;
                }
                EventOutcome::Updated
            }
            JobEvent::Completed {
                result_location,
                title,
                percent,
                message,
            } => {
                if let Some(percent) = percent {
                    self.status.progress = percent;
                }
                if let Some(message) = message {
                    self.status.message = message;
                }
                let fallback = self
                    .tracked
                    .take()
                    .map(|job| job.fallback_title)
                    .unwrap_or_default();
                let title = title
                    .map(|title| title.trim().to_string())
                    .filter(|title| !title.is_empty())
                    .unwrap_or(fallback);
                self.status.phase = Phase::Completed;
                self.status.result_location = Some(result_location.clone());
                bookgen_info!("Job {} completed: {}", handle, title);

                self.history.add(HistoryEntry {
                    id: handle.clone(),
                    title,
                    created_at: received_at,
                    result_location,
                });
                EventOutcome::Completed
            }
            JobEvent::Failed { message } => {
                bookgen_warn!("Job {} failed: {}", handle, message);
                self.tracked = None;
                self.status.phase = Phase::Failed;
                self.status.message = message;
                EventOutcome::Failed
            }
            JobEvent::StreamError { detail } => {
                bookgen_warn!("Stream for job {} broke: {}", handle, detail);
                self.tracked = None;
                self.status.phase = Phase::Failed;
                self.status.message = STREAM_ERROR_MESSAGE.to_string();
                EventOutcome::Failed
            }
        }
    }

    /// Back to `Idle`. Returns the handle whose channel must be closed, if any.
    pub(crate) fn reset(&mut self) -> Option<JobHandle> {
        let open_handle = match self.status.phase {
            Phase::Running => self.tracked_handle().cloned(),
            _ => None,
        };
        self.tracked = None;
        self.status = JobStatus::default();
        self.download = DownloadState::None;
        self.mark_dirty();
        open_handle
    }

    pub(crate) fn restore_history(&mut self, entries: Vec<HistoryEntry>) {
        self.history = HistoryLedger::from_entries(entries);
        self.mark_dirty();
    }

    pub(crate) fn remove_history(&mut self, id: &JobHandle) -> bool {
        let removed = self.history.remove(id);
        if removed {
            self.mark_dirty();
        }
        removed
    }

    pub(crate) fn history_location(&self, id: &JobHandle) -> Option<Url> {
        self.history.get(id).map(|entry| entry.result_location.clone())
    }

    pub(crate) fn set_download(&mut self, download: DownloadState) {
        self.download = download;
        self.mark_dirty();
    }
}
