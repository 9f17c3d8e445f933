// src/main.rs

use anyhow::Result;
use asq_formula::recipe::BuildStatus;
use clap::Parser;
use std::process::ExitCode;

mod cli;
mod commands;

use cli::{Cli, Commands};

/// Exit status when the install itself failed
const EXIT_INSTALL_FAILED: u8 = 1;
/// Exit status when the binary installed but its self-test failed
const EXIT_TEST_FAILED: u8 = 2;

fn main() -> ExitCode {
    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let outcome = run(cli);
    if let Err(e) = &outcome {
        eprintln!("Error: {:#}", e);
    }
    ExitCode::from(exit_status(&outcome))
}

/// Map a command outcome to the process exit status
fn exit_status(outcome: &Result<BuildStatus>) -> u8 {
    match outcome {
        Ok(BuildStatus::Verified | BuildStatus::Unverified) => 0,
        Ok(BuildStatus::Failed) => EXIT_TEST_FAILED,
        Err(_) => EXIT_INSTALL_FAILED,
    }
}

fn run(cli: Cli) -> Result<BuildStatus> {
    match cli.command {
        Commands::Cook {
            recipe,
            prefix,
            head,
            source_cache,
            keep_builddir,
            no_test,
            timeout,
            tools,
        } => commands::cmd_cook(
            &recipe,
            commands::CookOptions {
                prefix,
                head,
                source_cache,
                keep_builddir,
                no_test,
                timeout,
                tools,
            },
        ),
        Commands::Fetch {
            recipe,
            source_cache,
        } => commands::cmd_fetch(&recipe, &source_cache).map(|_| BuildStatus::Unverified),
        Commands::Validate { recipe } => {
            commands::cmd_validate(&recipe).map(|_| BuildStatus::Unverified)
        }
        Commands::Test {
            recipe,
            prefix,
            timeout,
        } => commands::cmd_test(&recipe, &prefix, timeout),
        Commands::Completions { shell } => {
            commands::cmd_completions(shell).map(|_| BuildStatus::Unverified)
        }
    }
}
