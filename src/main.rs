//! CLI entry point for the FTP crawler.

use std::process::ExitCode;

mod app;
mod app_config;
mod cli;
mod failure;
mod output;

/// How the process ends when no run-ending error occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ProcessExit {
    Success,
    Failure,
}

impl From<ProcessExit> for ExitCode {
    fn from(exit: ProcessExit) -> Self {
        match exit {
            ProcessExit::Success => ExitCode::SUCCESS,
            ProcessExit::Failure => ExitCode::FAILURE,
        }
    }
}

fn main() -> ExitCode {
    match app::runtime::run_crawler() {
        Ok(exit) => exit.into(),
        Err(error) => {
            tracing::debug!(error = ?error, "run aborted");
            eprintln!("{}", failure::render_failure(&error));
            ExitCode::FAILURE
        }
    }
}
