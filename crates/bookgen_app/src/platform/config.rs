//! Command-line and environment configuration for the `bookgen` binary.

use std::path::PathBuf;

use bookgen_core::{AgeGroup, BookSpecs, HumorLevel, Segmentation};
use clap::{Args, Parser, Subcommand, ValueEnum};
use url::Url;

use super::logging::LogDestination;

#[derive(Debug, Parser)]
#[command(
    name = "bookgen",
    version,
    about = "Submit a document to the book generation service and track the job"
)]
pub struct Cli {
    /// Origin of the generation backend.
    #[arg(
        long,
        global = true,
        env = "BOOKGEN_BACKEND_ORIGIN",
        default_value = "http://localhost:8000"
    )]
    pub backend: Url,

    /// Directory holding the history ledger and the log file.
    #[arg(long, global = true, env = "BOOKGEN_DATA_DIR", default_value = ".bookgen")]
    pub data_dir: PathBuf,

    /// Where log output goes.
    #[arg(long, global = true, value_enum, env = "BOOKGEN_LOG", default_value = "file")]
    pub log: LogTarget,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogTarget {
    File,
    Terminal,
    Both,
    Off,
}

impl LogTarget {
    pub fn destination(self) -> Option<LogDestination> {
        match self {
            LogTarget::File => Some(LogDestination::File),
            LogTarget::Terminal => Some(LogDestination::Terminal),
            LogTarget::Both => Some(LogDestination::Both),
            LogTarget::Off => None,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate a book and follow the job until it finishes.
    Generate(GenerateArgs),
    /// Inspect or edit the local history of generated books.
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },
    /// Download a book listed in history.
    Download {
        id: String,
        /// Directory the PDF is written to.
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
}

#[derive(Debug, Subcommand)]
pub enum HistoryAction {
    List,
    Delete { id: String },
}

#[derive(Debug, Args)]
pub struct GenerateArgs {
    /// Source document to upload.
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Which part of the document to use.
    #[arg(long, default_value = "")]
    pub section: String,

    #[arg(long, default_value = "")]
    pub context: String,

    #[arg(long)]
    pub page_start: Option<u32>,

    #[arg(long)]
    pub page_end: Option<u32>,

    #[arg(long, default_value = "")]
    pub theme: String,

    /// 1 (serious) to 10 (playful); out-of-range values are clamped.
    #[arg(long, default_value_t = 5, allow_negative_numbers = true)]
    pub humor: i64,

    #[arg(long, default_value = "6-8")]
    pub age_group: AgeGroup,

    /// Download the PDF once the job completes.
    #[arg(long)]
    pub download: bool,

    #[arg(long, default_value = ".")]
    pub out: PathBuf,
}

impl GenerateArgs {
    pub fn segmentation(&self) -> Segmentation {
        Segmentation {
            section_description: self.section.clone(),
            additional_context: self.context.clone(),
            page_start: self.page_start,
            page_end: self.page_end,
        }
    }

    pub fn specs(&self) -> BookSpecs {
        BookSpecs {
            theme: self.theme.clone(),
            humor: HumorLevel::clamped(self.humor),
            age_group: self.age_group,
        }
    }
}
