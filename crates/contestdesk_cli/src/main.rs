//! `contestdesk` command-line front end.
//!
//! # Responsibility
//! - Parse arguments and resolve configuration.
//! - Drive list, edit, and export flows through `contestdesk_core`.
//! - Map failures to one `error:` line and a non-zero exit code.

mod args;
mod commands;

use args::Cli;
use clap::Parser;
use log::error;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();
    let mut stdout = std::io::stdout().lock();
    let code = match commands::run(cli, &mut stdout) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=cli_exit module=cli status=error error={err}");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    };
    contestdesk_core::flush_logging();
    code
}
