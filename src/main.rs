//! # git-form CLI
//!
//! Binary entry point for the `git-form` command-line tool. It parses the
//! arguments with `clap`, runs the selected command and turns any error into a
//! one-line message and exit code 1. Usage errors are reported by `clap` with
//! exit code 2.
//!
//! Everything beyond argument handling lives in the `git_form` library crate.

mod cli;
mod commands;

use std::process::ExitCode;

use clap::Parser;

fn main() -> ExitCode {
    let cli = cli::Cli::parse();
    match cli.execute() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
