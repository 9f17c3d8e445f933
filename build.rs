// build.rs

use clap::{Arg, ArgAction, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

/// Common argument: recipe file
fn recipe_arg() -> Arg {
    Arg::new("recipe").required(true).help("Path to the recipe file")
}

/// Common argument: install prefix
fn prefix_arg() -> Arg {
    Arg::new("prefix")
        .short('p')
        .long("prefix")
        .required(true)
        .value_name("DIR")
        .help("Install prefix (the binary lands in <prefix>/bin)")
}

/// Common argument: source cache directory
fn source_cache_arg() -> Arg {
    Arg::new("source_cache")
        .long("source-cache")
        .value_name("DIR")
        .default_value("/var/cache/asq-formula/sources")
        .help("Source cache directory")
}

fn timeout_arg() -> Arg {
    Arg::new("timeout")
        .long("timeout")
        .value_name("SECS")
        .help("Per-step timeout in seconds (no limit if omitted)")
}

fn build_cli() -> Command {
    Command::new("asq-formula")
        .version(env!("CARGO_PKG_VERSION"))
        .author("asq-formula Contributors")
        .about("Build, install and verify asq from a source recipe")
        .subcommand_required(true)
        .subcommand(
            Command::new("cook")
                .about("Build a recipe, install its binary into a prefix, and test it")
                .arg(recipe_arg())
                .arg(prefix_arg())
                .arg(
                    Arg::new("head")
                        .long("head")
                        .action(ArgAction::SetTrue)
                        .help("Build the head branch instead of the pinned release"),
                )
                .arg(source_cache_arg())
                .arg(
                    Arg::new("keep_builddir")
                        .long("keep-builddir")
                        .action(ArgAction::SetTrue)
                        .help("Keep build directory after completion (for debugging)"),
                )
                .arg(
                    Arg::new("no_test")
                        .long("no-test")
                        .action(ArgAction::SetTrue)
                        .help("Skip the post-install smoke test"),
                )
                .arg(timeout_arg())
                .arg(
                    Arg::new("tool")
                        .long("tool")
                        .value_name("NAME=PATH")
                        .action(ArgAction::Append)
                        .help("Tool location override, e.g. --tool go=/opt/go1.23.4/bin/go"),
                ),
        )
        .subcommand(
            Command::new("fetch")
                .about("Fetch and verify the release archive without building")
                .arg(recipe_arg())
                .arg(source_cache_arg()),
        )
        .subcommand(
            Command::new("validate")
                .about("Validate a recipe without building")
                .arg(recipe_arg()),
        )
        .subcommand(
            Command::new("test")
                .about("Run a recipe's smoke test against an installed binary")
                .arg(recipe_arg())
                .arg(prefix_arg())
                .arg(timeout_arg()),
        )
        .subcommand(
            Command::new("completions")
                .about("Generate shell completion scripts")
                .arg(
                    Arg::new("shell")
                        .required(true)
                        .value_parser(["bash", "elvish", "fish", "powershell", "zsh"])
                        .help("Shell type"),
                ),
        )
        .after_help(
            "EXIT STATUS:\n  0  success (installed and verified)\n  1  install failed\n  2  installed, but the self-test failed",
        )
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // Create man directory - use CARGO_MANIFEST_DIR which is always set by cargo
    let manifest_dir = match env::var("CARGO_MANIFEST_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(e) => {
            println!("cargo:warning=CARGO_MANIFEST_DIR not set: {}", e);
            return;
        }
    };
    let man_dir = manifest_dir.join("man");

    if let Err(e) = fs::create_dir_all(&man_dir) {
        println!("cargo:warning=Failed to create man directory: {}", e);
        return;
    }

    let cmd = build_cli();
    let man = Man::new(cmd);
    let mut buffer = Vec::new();

    if let Err(e) = man.render(&mut buffer) {
        println!("cargo:warning=Failed to render man page: {}", e);
        return;
    }

    let man_path = man_dir.join("asq-formula.1");
    if let Err(e) = fs::write(&man_path, buffer) {
        println!("cargo:warning=Failed to write man page: {}", e);
    }
}
