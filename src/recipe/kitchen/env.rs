// src/recipe/kitchen/env.rs

//! Per-build subprocess environment
//!
//! A `BuildEnv` is an explicit value handed to every build subprocess. It is
//! never written into the kitchen's own process environment, so two builds
//! running side by side cannot see each other's workspace roots.

use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

/// Environment variables for one build's subprocess tree
#[derive(Debug, Clone)]
pub struct BuildEnv {
    /// Root of the build-scoped working directory
    build_root: PathBuf,
    vars: BTreeMap<String, String>,
}

impl BuildEnv {
    pub fn new(build_root: impl Into<PathBuf>) -> Self {
        Self {
            build_root: build_root.into(),
            vars: BTreeMap::new(),
        }
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(|s| s.as_str())
    }

    pub fn vars(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Materialize the workspace directories this environment points at
    ///
    /// Every variable whose value is a path inside the build root is created
    /// and checked for writability. Paths outside the build root are left
    /// alone. Fails with `EnvironmentError` before anything is executed.
    pub fn prepare(&self) -> Result<()> {
        check_writable(&self.build_root)?;

        for (key, value) in &self.vars {
            let path = Path::new(value);
            if !path.is_absolute() || !path.starts_with(&self.build_root) {
                continue;
            }
            debug!("Preparing workspace {}={}", key, path.display());
            fs::create_dir_all(path).map_err(|e| {
                Error::EnvironmentError(format!(
                    "cannot create {} at {}: {}",
                    key,
                    path.display(),
                    e
                ))
            })?;
            check_writable(path)?;
        }

        Ok(())
    }

    /// Attach the variables to a command
    pub fn apply(&self, command: &mut Command) {
        command.envs(self.vars.iter());
    }
}

fn check_writable(dir: &Path) -> Result<()> {
    tempfile::tempfile_in(dir).map(drop).map_err(|e| {
        Error::EnvironmentError(format!("{} is not writable: {}", dir.display(), e))
    })
}
