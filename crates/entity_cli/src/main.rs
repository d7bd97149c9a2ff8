//! `entity` command-line adapter.
//!
//! # Responsibility
//! - Translate command-line requests into `EntityService` calls.
//! - Map error kinds to exit statuses and render results.
//!
//! Business rules live in `entity_core`; nothing here re-validates input.

use clap::Parser;
use std::process::ExitCode;

mod cli;
mod commands;
mod config;

fn main() -> ExitCode {
    let cli = cli::Cli::parse();
    match commands::run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
