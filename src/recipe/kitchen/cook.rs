// src/recipe/kitchen/cook.rs

//! Cook: the actual build execution for a single recipe

use crate::error::{Error, Result};
use crate::recipe::format::{Recipe, SourceSelector};
use crate::recipe::steps::{InstallStep, Phase};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::{NamedTempFile, TempDir};
use tracing::{debug, info};

use super::archive::{clone_branch, extract_archive, source_root};
use super::config::CookResult;
use super::env::BuildEnv;
use super::makedepends::MakedependsResult;
use super::run::run_command;
use super::Kitchen;

/// A single cook operation
pub struct Cook<'a> {
    pub(super) kitchen: &'a Kitchen,
    pub(super) recipe: &'a Recipe,
    pub(super) source: SourceSelector,
    /// Temporary build directory
    pub(super) build_dir: TempDir,
    /// Fetched archive awaiting extraction (pinned builds only)
    pub(super) archive: Option<PathBuf>,
    /// Checkout root within build_dir
    pub(super) source_dir: PathBuf,
    /// Where the toolchain writes the binary before it is installed
    pub(super) stage_dir: PathBuf,
    /// Environment handed to every build subprocess
    pub(super) env: BuildEnv,
    /// Subprocess steps still to run
    pub(super) steps: Vec<InstallStep>,
    /// Install steps already executed
    pub(super) executed: Vec<String>,
    /// Build log accumulator
    pub(super) log: String,
    /// Warnings
    pub(super) warnings: Vec<String>,
}

impl<'a> Cook<'a> {
    pub(super) fn new(kitchen: &'a Kitchen, recipe: &'a Recipe, source: SourceSelector) -> Result<Self> {
        let build_dir = match &kitchen.config.build_root {
            Some(root) => {
                fs::create_dir_all(root).map_err(|e| {
                    Error::EnvironmentError(format!(
                        "cannot create build root {}: {}",
                        root.display(),
                        e
                    ))
                })?;
                TempDir::new_in(root)
            }
            None => TempDir::new(),
        }
        .map_err(|e| Error::EnvironmentError(format!("cannot create build directory: {}", e)))?;

        let source_dir = build_dir.path().join("source");
        let stage_dir = build_dir.path().join("stage");
        let env = BuildEnv::new(build_dir.path());

        Ok(Self {
            kitchen,
            recipe,
            source,
            build_dir,
            archive: None,
            source_dir,
            stage_dir,
            env,
            steps: Vec::new(),
            executed: Vec::new(),
            log: String::new(),
            warnings: Vec::new(),
        })
    }

    /// Staged path of the executable
    fn staged_binary(&self) -> PathBuf {
        self.stage_dir.join("bin").join(self.recipe.binary_name())
    }

    /// Phase 1: Prep - fetch the pinned archive or check out the head branch
    pub(super) fn prep(&mut self) -> Result<()> {
        match self.source.clone() {
            SourceSelector::Pinned { url, checksum } => {
                let archive_path = self.kitchen.fetch_source(&url, &checksum)?;

                let local_archive = self.build_dir.path().join(self.recipe.archive_filename());
                fs::copy(&archive_path, &local_archive)?;
                self.log_line(&format!("Fetched source: {} ({})", url, checksum));
                self.archive = Some(local_archive);
            }
            SourceSelector::Head { url, branch } => {
                let git = self.kitchen.config.tool_path("git");
                info!("Checking out {} ({})", url, branch);
                clone_branch(
                    &git,
                    &url,
                    &branch,
                    &self.source_dir,
                    self.kitchen.config.timeout,
                )?;
                self.log_line(&format!("Checked out {} branch {}", url, branch));
                self.warnings
                    .push(format!("Head build from {} ({}); no digest applies", url, branch));
            }
        }

        Ok(())
    }

    /// Phase 1b: Unpack - extract the fetched archive and locate the checkout root
    pub(super) fn unpack(&mut self) -> Result<()> {
        if let Some(archive) = self.archive.take() {
            fs::create_dir_all(&self.source_dir)?;
            extract_archive(&archive, &self.source_dir)?;
            self.log_line(&format!(
                "Extracted source to {}",
                self.source_dir.display()
            ));

            self.source_dir = match &self.recipe.source.extract_dir {
                Some(dir) => self.source_dir.join(dir),
                None => source_root(&self.source_dir)?,
            };
        }

        if !self.source_dir.is_dir() {
            return Err(Error::NotFound(format!(
                "Source directory not found: {}",
                self.source_dir.display()
            )));
        }
        debug!("Source directory: {}", self.source_dir.display());

        Ok(())
    }

    /// Phase 2: Season - construct the isolated build environment
    pub(super) fn season(&mut self, prefix: &Path) -> Result<()> {
        let staged = self.staged_binary();
        let steps = self.recipe.install_steps(&self.source_dir, prefix, &staged);

        for step in steps {
            match step {
                InstallStep::SetEnv { key, value } => {
                    debug!("Setting {}={}", key, value);
                    self.executed.push(format!("{}={}", key, value));
                    self.env.set(key, value);
                }
                run @ InstallStep::Run { .. } => self.steps.push(run),
            }
        }

        self.env.prepare()?;
        fs::create_dir_all(staged.parent().unwrap_or(&self.stage_dir)).map_err(|e| {
            Error::EnvironmentError(format!("cannot create staging directory: {}", e))
        })?;
        self.log_line(&format!(
            "Environment: {}",
            self.env
                .vars()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect::<Vec<_>>()
                .join(" ")
        ));

        Ok(())
    }

    /// Phase 3: Simmer - provision dependencies and compile
    pub(super) fn simmer(&mut self) -> Result<()> {
        let workdir = match &self.recipe.build.workdir {
            Some(wd) => self.source_dir.join(wd),
            None => self.source_dir.clone(),
        };

        let steps = std::mem::take(&mut self.steps);
        for step in &steps {
            if let InstallStep::Run {
                phase,
                program,
                args,
                package,
            } = step
            {
                self.run_build_step(*phase, program, args, package.as_deref(), &workdir)?;
                self.executed.push(step.to_string());
            }
        }

        let staged = self.staged_binary();
        if !staged.is_file() {
            return Err(Error::BuildFailed(format!(
                "build reported success but produced no binary at {}",
                staged.display()
            )));
        }

        Ok(())
    }

    /// Run one toolchain invocation
    fn run_build_step(
        &mut self,
        phase: Phase,
        program: &str,
        args: &[String],
        package: Option<&str>,
        workdir: &Path,
    ) -> Result<()> {
        let tool = self.kitchen.config.tool_path(program);
        info!("Running {} phase: {} {}", phase.as_str(), program, args.join(" "));

        let mut command = Command::new(&tool);
        command.args(args).current_dir(workdir);
        self.env.apply(&mut command);

        let failure = |message: String| match phase {
            Phase::Provision => Error::DependencyFetchError {
                package: package.unwrap_or(program).to_string(),
                message,
            },
            Phase::Build => Error::BuildFailed(message),
        };

        let output = run_command(&mut command, self.kitchen.config.timeout).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                Error::ToolNotFound(format!("{} ({})", program, tool.display()))
            } else {
                failure(format!("failed to run {}: {}", tool.display(), e))
            }
        })?;

        self.log_build_output(phase.as_str(), &output.stdout, &output.stderr);

        if !output.success {
            return Err(failure(format!(
                "{} phase failed with exit code {}\nstderr: {}",
                phase.as_str(),
                output.code_display(),
                output.stderr.trim()
            )));
        }

        Ok(())
    }

    /// Phase 4: Plate - install the staged binary into the prefix
    ///
    /// The binary is copied next to its destination and renamed into place,
    /// so the prefix never holds a partially written executable.
    pub(super) fn plate(&mut self, prefix: &Path) -> Result<PathBuf> {
        let staged = self.staged_binary();
        let bin_dir = prefix.join("bin");
        let target = bin_dir.join(self.recipe.binary_name());

        fs::create_dir_all(&bin_dir).map_err(|e| {
            Error::InstallFailed(format!("cannot create {}: {}", bin_dir.display(), e))
        })?;

        let temp = NamedTempFile::new_in(&bin_dir)
            .map_err(|e| Error::InstallFailed(format!("cannot write to {}: {}", bin_dir.display(), e)))?;
        fs::copy(&staged, temp.path())
            .map_err(|e| Error::InstallFailed(format!("cannot copy binary: {}", e)))?;
        set_executable(temp.path())?;
        temp.persist(&target)
            .map_err(|e| Error::InstallFailed(format!("cannot install {}: {}", target.display(), e)))?;

        self.log_line(&format!("Installed {}", target.display()));
        info!("Cooked: {}", target.display());

        Ok(target)
    }

    /// Consume the cook into its result, keeping the build directory if configured
    pub(super) fn finish(
        self,
        binary_path: PathBuf,
        makedepends: Option<MakedependsResult>,
    ) -> CookResult {
        let build_dir = if self.kitchen.config.keep_builddir {
            let path = self.build_dir.keep();
            info!("Keeping build directory {}", path.display());
            Some(path)
        } else {
            None
        };

        CookResult {
            binary_path,
            source: self.source,
            log: self.log,
            warnings: self.warnings,
            steps: self.executed,
            makedepends,
            build_dir,
        }
    }

    fn log_line(&mut self, line: &str) {
        self.log.push_str(line);
        self.log.push('\n');
    }

    /// Log build step output (stdout/stderr) with a phase header
    fn log_build_output(&mut self, phase: &str, stdout: &str, stderr: &str) {
        self.log_line(&format!("=== {} ===", phase));
        if !stdout.is_empty() {
            self.log.push_str(stdout);
            self.log.push('\n');
        }
        if !stderr.is_empty() {
            self.log.push_str(stderr);
            self.log.push('\n');
        }
    }
}

#[cfg(unix)]
fn set_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))?;
    Ok(())
}

#[cfg(not(unix))]
fn set_executable(_path: &Path) -> Result<()> {
    Ok(())
}
