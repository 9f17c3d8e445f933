// src/recipe/format.rs

//! Recipe file format definitions
//!
//! Recipes are TOML files that describe how to turn one tagged source
//! release (or a live branch) into one installed, verified executable.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// A complete recipe for building a package
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipe {
    /// Package metadata
    pub package: PackageSection,

    /// Release archive and head reference
    pub source: SourceSection,

    /// Build instructions
    pub build: BuildSection,

    /// Post-install smoke test (optional)
    #[serde(default)]
    pub test: Option<TestSection>,

    /// Variables for substitution (optional)
    #[serde(default)]
    pub variables: HashMap<String, String>,
}

impl Recipe {
    /// Substitute variables in a string
    ///
    /// Replaces `%(name)s` patterns with their values from:
    /// 1. Built-in variables (version, name)
    /// 2. Phase-specific variables supplied by the caller (buildpath, prefix, fixture, ...)
    /// 3. Custom variables from the [variables] section
    pub fn substitute(&self, template: &str, extra: &[(&str, &str)]) -> String {
        let mut result = template.to_string();

        result = result.replace("%(version)s", &self.package.version);
        result = result.replace("%(name)s", &self.package.name);

        for (key, value) in extra {
            result = result.replace(&format!("%({})s", key), value);
        }

        for (key, value) in &self.variables {
            result = result.replace(&format!("%({})s", key), value);
        }

        result
    }

    /// Get the archive URL with variables substituted
    pub fn archive_url(&self) -> String {
        self.substitute(&self.source.archive, &[])
    }

    /// Get the archive filename from the URL
    pub fn archive_filename(&self) -> String {
        self.archive_url()
            .split('/')
            .next_back()
            .filter(|s| !s.is_empty())
            .unwrap_or("source.tar.gz")
            .to_string()
    }

    /// Pick the source locator for a build mode
    ///
    /// Exactly one locator is active per build. Asking for a head build of a
    /// recipe without a head reference is a resolution error.
    pub fn select_source(&self, mode: BuildMode) -> Result<SourceSelector> {
        match mode {
            BuildMode::Release => Ok(SourceSelector::Pinned {
                url: self.archive_url(),
                checksum: self.source.checksum.clone(),
            }),
            BuildMode::Head => {
                let head = self.source.head.as_ref().ok_or_else(|| {
                    Error::ResolutionError(format!(
                        "{} declares no head reference",
                        self.package.name
                    ))
                })?;
                Ok(SourceSelector::Head {
                    url: head.url.clone(),
                    branch: head.branch.clone(),
                })
            }
        }
    }

    /// Parsed build-time dependencies, in declaration order
    pub fn build_dependencies(&self) -> Result<Vec<BuildDependency>> {
        self.build
            .makedepends
            .iter()
            .map(|s| BuildDependency::parse(s))
            .collect()
    }

    /// Name of the executable this recipe installs
    pub fn binary_name(&self) -> &str {
        self.build.binary.as_deref().unwrap_or(&self.package.name)
    }
}

/// Which locator a build should use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BuildMode {
    /// The tagged release archive, gated by its digest
    #[default]
    Release,
    /// The live development branch
    Head,
}

/// The active source locator for one build
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceSelector {
    /// Versioned release archive and its integrity digest
    Pinned { url: String, checksum: String },
    /// Version-control branch tip; no digest applies
    Head { url: String, branch: String },
}

impl SourceSelector {
    pub fn url(&self) -> &str {
        match self {
            SourceSelector::Pinned { url, .. } | SourceSelector::Head { url, .. } => url,
        }
    }

    pub fn is_head(&self) -> bool {
        matches!(self, SourceSelector::Head { .. })
    }
}

/// Package metadata section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageSection {
    /// Package name
    pub name: String,

    /// Package version (semantic version)
    pub version: String,

    /// Short description
    #[serde(default)]
    pub summary: Option<String>,

    /// Full description
    #[serde(default)]
    pub description: Option<String>,

    /// License identifier (SPDX)
    #[serde(default)]
    pub license: Option<String>,

    /// Homepage URL
    #[serde(default)]
    pub homepage: Option<String>,
}

/// Source section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceSection {
    /// Release archive URL
    ///
    /// Supports `%(version)s` substitution.
    /// Example: `https://github.com/StCredZero/asq/archive/refs/tags/v%(version)s.tar.gz`
    pub archive: String,

    /// Digest of the archive (`sha256:...`, `xxh128:...`, or bare sha256 hex)
    pub checksum: String,

    /// Live branch used for head builds
    #[serde(default)]
    pub head: Option<HeadSource>,

    /// Directory name after extraction (if different from the archive's top level)
    #[serde(default)]
    pub extract_dir: Option<String>,
}

/// Version-control reference for head builds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeadSource {
    /// Repository URL
    pub url: String,

    /// Branch to check out
    #[serde(default = "default_branch")]
    pub branch: String,
}

fn default_branch() -> String {
    "main".to_string()
}

/// How library dependencies reach the isolated workspace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProvisionMode {
    /// One fetch invocation per entry in `dependencies`
    #[default]
    Explicit,
    /// A single download step driven by the package's own module manifest
    Manifest,
}

/// Build instructions section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildSection {
    /// Build-time only dependencies, as `tool@version`
    ///
    /// These are needed to build but are not runtime requirements.
    /// Format: `["go@1.23.4"]`
    #[serde(default)]
    pub makedepends: Vec<String>,

    /// Toolchain program that fetches dependencies and compiles
    pub tool: String,

    /// Library dependencies fetched into the workspace before building
    #[serde(default)]
    pub dependencies: Vec<String>,

    /// Dependency provisioning strategy
    #[serde(default)]
    pub provision: ProvisionMode,

    /// Toolchain subcommand used for each explicit fetch
    #[serde(default = "default_fetch_subcommand")]
    pub fetch_subcommand: String,

    /// Toolchain arguments for manifest-driven provisioning
    #[serde(default = "default_manifest_args")]
    pub manifest_args: Vec<String>,

    /// Toolchain subcommand that compiles
    #[serde(default = "default_build_subcommand")]
    pub build_subcommand: String,

    /// Flag that precedes the output path
    #[serde(default = "default_output_flag")]
    pub output_flag: String,

    /// Entry point within the checkout, passed to the build subcommand
    pub entry_point: String,

    /// Installed executable name (defaults to the package name)
    #[serde(default)]
    pub binary: Option<String>,

    /// Environment for every build subprocess
    ///
    /// Supports `%(buildpath)s`, `%(prefix)s`, and the usual variables.
    #[serde(default)]
    pub environment: BTreeMap<String, String>,

    /// Working directory within source (relative path)
    #[serde(default)]
    pub workdir: Option<String>,
}

fn default_fetch_subcommand() -> String {
    "get".to_string()
}

fn default_manifest_args() -> Vec<String> {
    vec!["mod".to_string(), "download".to_string()]
}

fn default_build_subcommand() -> String {
    "build".to_string()
}

fn default_output_flag() -> String {
    "-o".to_string()
}

/// Smoke test run against the installed binary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestSection {
    /// Source file written into the scratch directory
    pub fixture: Fixture,

    /// Invocations and the output each must contain, run in order
    #[serde(default, rename = "assert")]
    pub assertions: Vec<Assertion>,
}

/// A generated fixture file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fixture {
    /// File name within the scratch directory
    pub name: String,
    /// File content
    pub content: String,
}

/// One invocation of the installed binary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assertion {
    /// Arguments; `%(fixture)s` expands to the fixture path
    pub args: Vec<String>,
    /// Literal that stdout must contain
    pub expect: String,
}

/// A build-time tool requirement such as `go@1.23.4`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildDependency {
    pub name: String,
    pub version: Option<String>,
}

impl BuildDependency {
    pub fn parse(spec: &str) -> Result<Self> {
        let spec = spec.trim();
        let (name, version) = match spec.split_once('@') {
            Some((name, version)) => (name, Some(version.to_string())),
            None => (spec, None),
        };
        if name.is_empty() || version.as_deref() == Some("") {
            return Err(Error::ParseError(format!(
                "Invalid build dependency: '{}'",
                spec
            )));
        }
        Ok(Self {
            name: name.to_string(),
            version,
        })
    }

    /// Version as a semver requirement, if one was given
    pub fn version_req(&self) -> Result<Option<semver::VersionReq>> {
        self.version
            .as_deref()
            .map(|v| {
                semver::VersionReq::parse(v).map_err(|e| {
                    Error::ParseError(format!("Invalid version for {}: {}", self.name, e))
                })
            })
            .transpose()
    }
}

impl std::fmt::Display for BuildDependency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.version {
            Some(v) => write!(f, "{}@{}", self.name, v),
            None => write!(f, "{}", self.name),
        }
    }
}
