//! Everything that touches the outside world: configuration, logging, the
//! dispatch loop and terminal output.
pub mod app;
pub mod config;
pub mod effects;
pub mod logging;
pub mod persistence;
pub mod ui;

use std::io;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{bail, Context};
use bookgen_core::{build_request, JobHandle, Msg, Phase, SourceDocument};
use bookgen_engine::{ChannelSettings, JsonFileHistoryStore, ReqwestJobChannel};
use bookgen_logging::bookgen_info;

use self::app::App;
use self::config::{Cli, Command, GenerateArgs, HistoryAction};

pub fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    match cli.command {
        Command::Generate(ref args) => generate(&cli, args),
        Command::History {
            action: HistoryAction::List,
        } => {
            let mut app = open_app(&cli, cli.data_dir.clone())?;
            app.restore_history();
            println!("{}", ui::history_table(&app.view().history));
            Ok(ExitCode::SUCCESS)
        }
        Command::History {
            action: HistoryAction::Delete { ref id },
        } => {
            let mut app = open_app(&cli, cli.data_dir.clone())?;
            app.restore_history();
            if app.dispatch(Msg::HistoryDeleteClicked {
                id: JobHandle::new(id.as_str()),
            }) == 0
            {
                println!("No history entry {id}; nothing to delete.");
            } else {
                println!("Deleted {id}.");
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Download { ref id, ref out } => {
            let mut app = open_app(&cli, out.clone())?;
            app.restore_history();
            if app.dispatch(Msg::HistoryDownloadClicked {
                id: JobHandle::new(id.as_str()),
            }) == 0
            {
                bail!("no history entry with id {id}");
            }
            app.run_until_downloaded()?;
            Ok(download_exit_code(&app))
        }
    }
}

fn generate(cli: &Cli, args: &GenerateArgs) -> anyhow::Result<ExitCode> {
    let request = build_request(
        args.file.clone().map(SourceDocument::from_path),
        args.segmentation(),
        args.specs(),
    )
    .context("invalid generation request")?;

    let mut app = open_app(cli, args.out.clone())?;
    app.restore_history();
    bookgen_info!("Generating from {:?} against {}", request.document.path, cli.backend);

    app.dispatch(Msg::SubmitClicked(request));
    match app.run_until_terminal()? {
        Phase::Completed if args.download => {
            app.dispatch(Msg::DownloadClicked);
            app.run_until_downloaded()?;
            Ok(download_exit_code(&app))
        }
        Phase::Completed => Ok(ExitCode::SUCCESS),
        _ => Ok(ExitCode::FAILURE),
    }
}

fn open_app(cli: &Cli, download_dir: std::path::PathBuf) -> anyhow::Result<App<io::Stdout>> {
    let channel = ReqwestJobChannel::new(ChannelSettings::new(cli.backend.clone()))
        .context("failed to build HTTP client")?;
    let store = JsonFileHistoryStore::new(cli.data_dir.clone());
    App::new(Arc::new(channel), Arc::new(store), download_dir, io::stdout())
        .context("failed to start engine runtime")
}

fn download_exit_code(app: &App<io::Stdout>) -> ExitCode {
    match app.view().download {
        Some(bookgen_core::DownloadView::Saved(_)) => ExitCode::SUCCESS,
        _ => ExitCode::FAILURE,
    }
}
