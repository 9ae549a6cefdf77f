use std::path::PathBuf;

use url::Url;

use crate::{HistoryEntry, JobHandle, Phase};

/// File name offered for downloaded artifacts.
pub const ARTIFACT_FILE_NAME: &str = "my_islamic_book.pdf";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub phase: Phase,
    pub progress: u8,
    pub message: String,
    pub result_location: Option<Url>,
    pub job_handle: Option<JobHandle>,
    /// The submit trigger is enabled only while nothing is tracked.
    pub can_submit: bool,
    pub history: Vec<HistoryEntry>,
    pub download: Option<DownloadView>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadView {
    InProgress,
    Saved(PathBuf),
    Failed(String),
}
