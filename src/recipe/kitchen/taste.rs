// src/recipe/kitchen/taste.rs

//! Taste: the post-install smoke test
//!
//! Writes the recipe's fixture into a scratch directory, runs the installed
//! binary once per assertion, and checks that stdout contains the expected
//! literal. The first failing check ends the tasting; nothing is retried.

use crate::error::{Error, Result};
use crate::recipe::format::{Recipe, TestSection};
use std::fs;
use std::path::{Component, Path};
use std::process::Command;
use std::time::Duration;
use tempfile::TempDir;
use tracing::{debug, info, warn};

use super::run::run_command;

/// Verification state machine: `Pending → Verified` or `Pending → Failed`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TasteState {
    Pending,
    Verified,
    Failed,
}

/// Outcome of one invocation
#[derive(Debug, Clone)]
pub struct CheckResult {
    /// Command line that was run
    pub invocation: String,
    /// Literal stdout had to contain
    pub expect: String,
    pub stdout: String,
    pub passed: bool,
    /// Why the check failed
    pub reason: Option<String>,
}

/// Result of tasting an installed package
#[derive(Debug, Clone)]
pub struct Verification {
    pub state: TasteState,
    pub checks: Vec<CheckResult>,
}

impl Verification {
    fn new() -> Self {
        Self {
            state: TasteState::Pending,
            checks: Vec::new(),
        }
    }

    fn record(&mut self, check: CheckResult) {
        if !check.passed {
            self.state = TasteState::Failed;
        }
        self.checks.push(check);
    }

    fn finish(mut self) -> Self {
        if self.state == TasteState::Pending {
            self.state = TasteState::Verified;
        }
        self
    }

    pub fn is_verified(&self) -> bool {
        self.state == TasteState::Verified
    }

    /// Reason of the failing check, if any
    pub fn failure(&self) -> Option<&str> {
        self.checks.iter().find_map(|c| c.reason.as_deref())
    }
}

/// Run a recipe's test section against an installed binary
pub(super) fn taste(
    recipe: &Recipe,
    test: &TestSection,
    binary: &Path,
    scratch_parent: Option<&Path>,
    timeout: Option<Duration>,
) -> Result<Verification> {
    check_fixture_name(&test.fixture.name)?;

    let scratch = match scratch_parent {
        Some(parent) => fs::create_dir_all(parent).and_then(|_| TempDir::new_in(parent)),
        None => TempDir::new(),
    }
    .map_err(|e| Error::EnvironmentError(format!("cannot create test directory: {}", e)))?;

    let fixture = scratch.path().join(&test.fixture.name);
    fs::write(&fixture, &test.fixture.content)?;
    debug!("Wrote fixture {}", fixture.display());

    let fixture_str = fixture.to_string_lossy();
    let testpath = scratch.path().to_string_lossy();
    let bin = binary.to_string_lossy();
    let vars = [
        ("fixture", fixture_str.as_ref()),
        ("testpath", testpath.as_ref()),
        ("bin", bin.as_ref()),
    ];

    let mut verification = Verification::new();

    for assertion in &test.assertions {
        let args: Vec<String> = assertion
            .args
            .iter()
            .map(|a| recipe.substitute(a, &vars))
            .collect();
        let invocation = std::iter::once(bin.to_string())
            .chain(args.iter().cloned())
            .collect::<Vec<_>>()
            .join(" ");
        info!("Tasting: {}", invocation);

        let mut command = Command::new(binary);
        command.args(&args).current_dir(scratch.path());

        let check = match run_command(&mut command, timeout) {
            Err(e) => CheckResult {
                invocation,
                expect: assertion.expect.clone(),
                stdout: String::new(),
                passed: false,
                reason: Some(format!("failed to run: {}", e)),
            },
            Ok(output) if !output.success => CheckResult {
                invocation,
                expect: assertion.expect.clone(),
                reason: Some(format!(
                    "exited with status {}: {}",
                    output.code_display(),
                    output.stderr.trim()
                )),
                stdout: output.stdout,
                passed: false,
            },
            Ok(output) => {
                let passed = output.stdout.contains(&assertion.expect);
                CheckResult {
                    invocation,
                    expect: assertion.expect.clone(),
                    reason: (!passed)
                        .then(|| format!("output does not contain {:?}", assertion.expect)),
                    stdout: output.stdout,
                    passed,
                }
            }
        };

        if let Some(reason) = &check.reason {
            warn!("Taste failed: {}: {}", check.invocation, reason);
        }
        verification.record(check);
        if verification.state == TasteState::Failed {
            break;
        }
    }

    Ok(verification.finish())
}

/// The fixture must be a plain file name inside the scratch directory
fn check_fixture_name(name: &str) -> Result<()> {
    let mut components = Path::new(name).components();
    let plain = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    );
    if !plain || name.contains(['/', '\\']) {
        return Err(Error::ParseError(format!("Invalid fixture name: '{}'", name)));
    }
    Ok(())
}
