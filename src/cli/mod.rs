// src/cli/mod.rs
//! CLI definitions for asq-formula
//!
//! This module contains all command-line interface definitions using clap.
//! The actual command implementations are in the `commands` module.
//!
//! - `cook` - Build, install and verify a recipe
//! - `fetch` - Download and verify the release archive only
//! - `validate` - Check a recipe without building
//! - `test` - Verify an existing install
//! - `completions` - Generate shell completions

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// Default location for downloaded, verified archives
pub const DEFAULT_SOURCE_CACHE: &str = "/var/cache/asq-formula/sources";

#[derive(Parser)]
#[command(name = "asq-formula")]
#[command(author = "asq-formula Contributors")]
#[command(version)]
#[command(about = "Build, install and verify asq from a source recipe", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build a recipe, install its binary into a prefix, and test it
    Cook {
        /// Path to the recipe file
        recipe: PathBuf,

        /// Install prefix (the binary lands in <prefix>/bin)
        #[arg(short, long)]
        prefix: PathBuf,

        /// Build the head branch instead of the pinned release
        #[arg(long)]
        head: bool,

        /// Source cache directory
        #[arg(long, default_value = DEFAULT_SOURCE_CACHE)]
        source_cache: PathBuf,

        /// Keep build directory after completion (for debugging)
        #[arg(long)]
        keep_builddir: bool,

        /// Skip the post-install smoke test
        #[arg(long)]
        no_test: bool,

        /// Per-step timeout in seconds (no limit if omitted)
        #[arg(long)]
        timeout: Option<u64>,

        /// Tool location override, e.g. --tool go=/opt/go1.23.4/bin/go
        #[arg(long = "tool", value_name = "NAME=PATH", value_parser = parse_tool)]
        tools: Vec<(String, PathBuf)>,
    },

    /// Fetch and verify the release archive without building
    Fetch {
        /// Path to the recipe file
        recipe: PathBuf,

        /// Source cache directory
        #[arg(long, default_value = DEFAULT_SOURCE_CACHE)]
        source_cache: PathBuf,
    },

    /// Validate a recipe without building
    Validate {
        /// Path to the recipe file
        recipe: PathBuf,
    },

    /// Run a recipe's smoke test against an installed binary
    Test {
        /// Path to the recipe file
        recipe: PathBuf,

        /// Install prefix the binary was installed into
        #[arg(short, long)]
        prefix: PathBuf,

        /// Per-invocation timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Parse a `NAME=PATH` tool override
fn parse_tool(s: &str) -> Result<(String, PathBuf), String> {
    match s.split_once('=') {
        Some((name, path)) if !name.is_empty() && !path.is_empty() => {
            Ok((name.to_string(), PathBuf::from(path)))
        }
        _ => Err(format!("expected NAME=PATH, got '{}'", s)),
    }
}
