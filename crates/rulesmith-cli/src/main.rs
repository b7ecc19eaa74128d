//! # rulesmith
//!
//! Command-line entry point. Loads project settings, wires the built-in
//! target compilers into a build orchestrator, and maps outcomes to
//! process exit codes (0 success, 1 blocking failure, 2 runtime error).

#![deny(unsafe_code)]

mod cli;
mod commands;

use std::process::ExitCode;

use clap::Parser;
use rulesmith_build::{BuildError, EXIT_RUNTIME};
use rulesmith_core::logging::{init_subscriber, level_for};

use crate::cli::Cli;

fn main() -> ExitCode {
    let args = Cli::parse();
    init_subscriber(level_for(args.verbose, args.quiet));

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("error: failed to start runtime: {err}");
            return ExitCode::from(EXIT_RUNTIME);
        }
    };

    match runtime.block_on(commands::run(args.command)) {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            tracing::debug!(error = ?err, "command failed");
            eprintln!("error: {err:#}");
            ExitCode::from(exit_code_for(&err))
        }
    }
}

/// Structural build errors exit 1; everything else is a runtime failure.
fn exit_code_for(err: &anyhow::Error) -> u8 {
    err.downcast_ref::<BuildError>()
        .map_or(EXIT_RUNTIME, BuildError::exit_code)
}
