//! Nudge: operator steering command for the scout loop.
//!
//! This is the entry point for the `nudge` CLI. It parses arguments,
//! dispatches to the appropriate store operation, and handles errors with
//! proper exit codes.

use scout::cli::NudgeCli;
use scout::commands;
use scout::exit_codes;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = NudgeCli::parse_args();

    match commands::dispatch(cli) {
        Ok(()) => ExitCode::from(exit_codes::SUCCESS as u8),
        Err(err) => {
            // Print user-actionable error message to stderr
            eprintln!("Error: {}", err);

            // Return appropriate exit code
            ExitCode::from(err.exit_code() as u8)
        }
    }
}
