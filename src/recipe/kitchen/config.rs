// src/recipe/kitchen/config.rs

//! Configuration and result types for the Kitchen

use crate::recipe::format::SourceSelector;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::makedepends::MakedependsResult;
use super::taste::Verification;

/// Configuration for the Kitchen
#[derive(Debug, Clone)]
pub struct KitchenConfig {
    /// Directory for downloaded, verified source archives
    pub source_cache: PathBuf,
    /// Parent for build-scoped working directories (system temp dir if unset)
    pub build_root: Option<PathBuf>,
    /// Timeout for each subprocess (None = wait indefinitely)
    pub timeout: Option<Duration>,
    /// Keep build directory after completion (for debugging)
    pub keep_builddir: bool,
    /// Explicit tool locations, consulted before `PATH`
    ///
    /// Keys are program names as written in recipes (`go`, `git`).
    pub tools: BTreeMap<String, PathBuf>,
    /// Check makedepends before cooking
    pub check_makedepends: bool,
}

impl Default for KitchenConfig {
    fn default() -> Self {
        Self {
            source_cache: default_source_cache(),
            build_root: None,
            timeout: None, // Imposed by the caller, recipes declare none
            keep_builddir: false,
            tools: BTreeMap::new(),
            check_makedepends: true,
        }
    }
}

fn default_source_cache() -> PathBuf {
    std::env::temp_dir().join("asq-formula").join("sources")
}

impl KitchenConfig {
    /// Configuration rooted in a single scratch directory
    ///
    /// Sources are cached under `<root>/sources` and build directories are
    /// created under `<root>/builds`.
    pub fn rooted_at(root: &Path) -> Self {
        Self {
            source_cache: root.join("sources"),
            build_root: Some(root.join("builds")),
            ..Self::default()
        }
    }

    /// Override the location of a tool
    pub fn with_tool(mut self, name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.tools.insert(name.into(), path.into());
        self
    }

    /// Resolve a program name to what should be executed
    pub fn tool_path(&self, name: &str) -> PathBuf {
        self.tools
            .get(name)
            .cloned()
            .unwrap_or_else(|| PathBuf::from(name))
    }
}

/// Result of cooking a recipe
#[derive(Debug)]
pub struct CookResult {
    /// Installed executable
    pub binary_path: PathBuf,
    /// Source locator that was used
    pub source: SourceSelector,
    /// Build log
    pub log: String,
    /// Warnings generated during build
    pub warnings: Vec<String>,
    /// Install steps that ran, in order
    pub steps: Vec<String>,
    /// Makedepends resolution result (if checked)
    pub makedepends: Option<MakedependsResult>,
    /// Build directory, if it was kept
    pub build_dir: Option<PathBuf>,
}

/// Overall outcome of one recipe build
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStatus {
    /// Installed and every assertion passed
    Verified,
    /// Installed, but the smoke test failed
    Failed,
    /// Installed, no test was run
    Unverified,
}

impl BuildStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildStatus::Verified => "verified",
            BuildStatus::Failed => "failed",
            BuildStatus::Unverified => "unverified",
        }
    }
}

/// Install result plus its verification
#[derive(Debug)]
pub struct BuildReport {
    pub cook: CookResult,
    pub verification: Option<Verification>,
}

impl BuildReport {
    pub fn status(&self) -> BuildStatus {
        match &self.verification {
            Some(v) if v.is_verified() => BuildStatus::Verified,
            Some(_) => BuildStatus::Failed,
            None => BuildStatus::Unverified,
        }
    }
}
