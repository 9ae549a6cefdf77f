//! Terminal rendering of the view model.

use std::io::{self, Write};

use bookgen_core::{AppViewModel, DownloadView, HistoryEntry, Phase};

pub struct TerminalView<W: Write> {
    out: W,
    last_status: Option<String>,
    last_download: Option<DownloadView>,
}

impl<W: Write> TerminalView<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            last_status: None,
            last_download: None,
        }
    }

    /// Prints whatever changed since the previous render.
    pub fn render(&mut self, view: &AppViewModel) -> io::Result<()> {
        let status = status_line(view);
        if status.is_some() && status != self.last_status {
            if let Some(line) = &status {
                writeln!(self.out, "{line}")?;
            }
        }
        self.last_status = status;

        if view.download != self.last_download {
            match &view.download {
                Some(DownloadView::InProgress) => writeln!(self.out, "Downloading...")?,
                Some(DownloadView::Saved(path)) => {
                    writeln!(self.out, "Saved {}", path.display())?
                }
                Some(DownloadView::Failed(message)) => {
                    writeln!(self.out, "Download failed: {message}")?
                }
                None => {}
            }
            self.last_download = view.download.clone();
        }
        self.out.flush()
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }
}

pub fn status_line(view: &AppViewModel) -> Option<String> {
    match view.phase {
        Phase::Idle => None,
        Phase::Submitting | Phase::Running => {
            Some(format!("[{:>3}%] {}", view.progress, view.message))
        }
        Phase::Completed => {
            let location = view
                .result_location
                .as_ref()
                .map(|url| url.as_str())
                .unwrap_or_default();
            Some(format!("[{:>3}%] Book ready: {location}", view.progress))
        }
        Phase::Failed => Some(format!("Failed: {}", view.message)),
    }
}

pub fn history_table(entries: &[HistoryEntry]) -> String {
    if entries.is_empty() {
        return "No books generated yet.".to_string();
    }
    entries
        .iter()
        .map(|entry| {
            format!(
                "{}  {}  {}\n    {}",
                entry.created_at.format("%Y-%m-%d"),
                entry.id,
                entry.title,
                entry.result_location
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
