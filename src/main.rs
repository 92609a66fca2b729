mod app;
mod cli;
mod domain;
mod infrastructure;

use std::process::ExitCode;

use clap::Parser;
use tracing::{debug, error};

use crate::cli::Cli;
use crate::domain::settings::Settings;
use crate::infrastructure::logging;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut settings = Settings::load();
    if cli.debug {
        settings.log_settings.level = "debug".to_string();
    }
    let _logging_guard = match logging::init_logger(&settings.log_settings) {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("failed to initialize logging: {err:#}");
            return ExitCode::FAILURE;
        }
    };

    match app::run(cli).await {
        Ok(()) => {
            debug!("finished");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}
