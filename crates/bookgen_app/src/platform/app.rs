use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use bookgen_core::{update, AppState, AppViewModel, DownloadView, HistoryStore, Msg, Phase};
use bookgen_engine::{EngineStopped, JobChannel};
use bookgen_logging::bookgen_warn;

use super::effects::EffectRunner;
use super::persistence;
use super::ui::TerminalView;

const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Single-threaded dispatch loop: every message goes through `update`, then
/// the resulting effects are handed to the runner.
pub struct App<W: Write> {
    state: AppState,
    effects: EffectRunner,
    view: TerminalView<W>,
}

impl<W: Write> App<W> {
    pub fn new(
        channel: Arc<dyn JobChannel>,
        store: Arc<dyn HistoryStore>,
        download_dir: PathBuf,
        out: W,
    ) -> std::io::Result<Self> {
        Ok(Self {
            state: AppState::new(),
            effects: EffectRunner::new(channel, store, download_dir)?,
            view: TerminalView::new(out),
        })
    }

    pub fn view(&self) -> AppViewModel {
        self.state.view()
    }

    /// Reads the ledger from the store once, at startup.
    pub fn restore_history(&mut self) {
        let entries = persistence::load_history(self.effects.store());
        self.dispatch(Msg::HistoryRestored(entries));
    }

    /// Applies `msg` and returns how many effects it produced.
    pub fn dispatch(&mut self, msg: Msg) -> usize {
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        let was_dirty = state.consume_dirty();
        bookgen_logging::set_job_context(state.tracked_handle().map(|h| h.as_str()));
        self.state = state;

        if was_dirty {
            let view = self.state.view();
            if let Err(err) = self.view.render(&view) {
                bookgen_warn!("Failed to render: {}", err);
            }
        }
        let produced = effects.len();
        self.effects.run(effects);
        produced
    }

    /// Delivers engine reports until `done` holds for the view model.
    /// No overall deadline: a stalled job waits until interrupted. Stops with
    /// an error if the engine goes away.
    pub fn run_until(
        &mut self,
        done: impl Fn(&AppViewModel) -> bool,
    ) -> Result<(), EngineStopped> {
        while !done(&self.state.view()) {
            if let Some(msg) = self.effects.next_msg(POLL_INTERVAL)? {
                self.dispatch(msg);
            }
        }
        Ok(())
    }

    pub fn run_until_terminal(&mut self) -> Result<Phase, EngineStopped> {
        self.run_until(|view| view.phase.is_terminal() || view.phase == Phase::Idle)?;
        Ok(self.state.status().phase)
    }

    pub fn run_until_downloaded(&mut self) -> Result<(), EngineStopped> {
        self.run_until(|view| !matches!(view.download, Some(DownloadView::InProgress)))
    }
}
