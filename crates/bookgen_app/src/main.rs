mod platform;

use std::process::ExitCode;

use bookgen_logging::bookgen_error;
use clap::Parser;

use platform::config::Cli;

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Some(destination) = cli.log.destination() {
        platform::logging::initialize(destination, &cli.data_dir.join("bookgen.log"));
    }

    match platform::run(cli) {
        Ok(code) => code,
        Err(err) => {
            bookgen_error!("{:#}", err);
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
