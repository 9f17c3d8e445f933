// src/recipe/kitchen/mod.rs

//! Kitchen: the build environment for cooking recipes
//!
//! The Kitchen turns a recipe into an installed, verified executable. It handles:
//! - Fetching the release archive and gating it on its digest, or checking out a branch
//! - Constructing a private environment for the build subprocesses
//! - Fetching library dependencies and running the toolchain build
//! - Installing the single binary into the prefix
//! - Tasting the installed binary against the recipe's fixture

mod archive;
mod config;
mod cook;
mod env;
pub mod makedepends;
mod run;
mod taste;

pub use config::{BuildReport, BuildStatus, CookResult, KitchenConfig};
pub use cook::Cook;
pub use env::BuildEnv;
pub use makedepends::{MakedependsResolver, MakedependsResult, PathResolver};
pub use run::{run_command, CommandOutput};
pub use taste::{CheckResult, TasteState, Verification};

use crate::error::{Error, Result};
use crate::hash::Checksum;
use crate::recipe::format::{BuildMode, Recipe, SourceSelector};
use archive::{download_file, verify_file_checksum};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

/// The Kitchen: where recipes are cooked
pub struct Kitchen {
    pub(crate) config: KitchenConfig,
    /// Optional resolver for makedepends
    resolver: Option<Arc<dyn MakedependsResolver>>,
}

impl Kitchen {
    /// Create a new Kitchen with the given configuration
    pub fn new(config: KitchenConfig) -> Self {
        Self {
            config,
            resolver: None,
        }
    }

    /// Create a new Kitchen with a makedepends resolver
    pub fn with_resolver(config: KitchenConfig, resolver: Arc<dyn MakedependsResolver>) -> Self {
        Self {
            config,
            resolver: Some(resolver),
        }
    }

    /// Create a Kitchen with default configuration
    pub fn with_defaults() -> Self {
        Self::new(KitchenConfig::default())
    }

    /// Set the makedepends resolver
    pub fn set_resolver(&mut self, resolver: Arc<dyn MakedependsResolver>) {
        self.resolver = Some(resolver);
    }

    pub fn config(&self) -> &KitchenConfig {
        &self.config
    }

    /// Check makedepends for a recipe
    ///
    /// Without a resolver the caller is expected to have provisioned the
    /// toolchain, and every makedepend is reported as available.
    pub fn resolve_makedepends(&self, recipe: &Recipe) -> Result<MakedependsResult> {
        let makedepends: Vec<&str> = recipe.build.makedepends.iter().map(|s| s.as_str()).collect();

        if makedepends.is_empty() {
            debug!("No makedepends specified in recipe");
            return Ok(MakedependsResult::default());
        }

        info!("Checking makedepends: {}", makedepends.join(", "));

        let missing = match &self.resolver {
            Some(resolver) => resolver.check_missing(&makedepends)?,
            None => {
                debug!("No makedepends resolver configured, assuming all deps are available");
                // Specs are still validated
                recipe.build_dependencies()?;
                Vec::new()
            }
        };

        let available = makedepends
            .iter()
            .filter(|d| !missing.iter().any(|m| m == *d))
            .map(|s| s.to_string())
            .collect();

        if missing.is_empty() {
            info!("All makedepends are available");
        } else {
            warn!("Could not resolve makedepends: {}", missing.join(", "));
        }

        Ok(MakedependsResult {
            available,
            unresolved: missing,
        })
    }

    /// Cook a recipe and install its binary under `prefix`
    ///
    /// This is the main entry point for building from source.
    ///
    /// ## Cooking Process
    /// 0. **Makedepends**: Check build-time tools (if enabled)
    /// 1. **Prep**: Fetch and digest-check the archive, or check out the head branch
    /// 1b. **Unpack**: Extract the archive and locate the checkout root
    /// 2. **Season**: Build the private environment and workspace
    /// 3. **Simmer**: Fetch dependencies, then run the toolchain build
    /// 4. **Plate**: Atomically install the binary into `<prefix>/bin`
    ///
    /// Every phase is all-or-nothing. The prefix is only written in the
    /// last phase, so any earlier failure leaves it untouched.
    pub fn cook(&self, recipe: &Recipe, mode: BuildMode, prefix: &Path) -> Result<CookResult> {
        let source = recipe.select_source(mode)?;
        info!(
            "Cooking {} {} from {}",
            recipe.package.name,
            if source.is_head() { "HEAD" } else { recipe.package.version.as_str() },
            source.url()
        );

        // Phase 0: Resolve makedepends (if enabled)
        let makedepends_result = if self.config.check_makedepends {
            let result = self.resolve_makedepends(recipe)?;
            if !result.unresolved.is_empty() {
                return Err(Error::ResolutionError(format!(
                    "Unresolved makedepends: {}",
                    result.unresolved.join(", ")
                )));
            }
            Some(result)
        } else {
            None
        };

        let mut cook = Cook::new(self, recipe, source)?;

        info!("Prep: resolving source...");
        cook.prep()?;

        info!("Unpacking source...");
        cook.unpack()?;

        info!("Seasoning: constructing build environment...");
        cook.season(prefix)?;

        info!("Simmering: provisioning and building...");
        cook.simmer()?;

        info!("Plating: installing binary...");
        let binary_path = cook.plate(prefix)?;

        Ok(cook.finish(binary_path, makedepends_result))
    }

    /// Run a recipe's smoke test against an installed binary
    pub fn taste(&self, recipe: &Recipe, binary: &Path) -> Result<Verification> {
        let test = recipe.test.as_ref().ok_or_else(|| {
            Error::NotFound(format!("{} has no test section", recipe.package.name))
        })?;

        info!(
            "Tasting {} ({} assertion(s))",
            binary.display(),
            test.assertions.len()
        );

        let verification = taste::taste(
            recipe,
            test,
            binary,
            self.config.build_root.as_deref(),
            self.config.timeout,
        )?;

        if verification.is_verified() {
            info!("{} verified", recipe.package.name);
        } else {
            warn!(
                "{} failed verification: {}",
                recipe.package.name,
                verification.failure().unwrap_or("unknown")
            );
        }

        Ok(verification)
    }

    /// Cook, then taste the freshly installed binary
    ///
    /// Install failures are returned as errors. A failed smoke test is not
    /// an error: it is reported through `BuildReport::status`.
    pub fn cook_and_taste(&self, recipe: &Recipe, mode: BuildMode, prefix: &Path) -> Result<BuildReport> {
        let cook = self.cook(recipe, mode, prefix)?;

        let verification = match &recipe.test {
            Some(_) => Some(self.taste(recipe, &cook.binary_path)?),
            None => {
                warn!("{} has no test section, skipping verification", recipe.package.name);
                None
            }
        };

        Ok(BuildReport { cook, verification })
    }

    /// Fetch the release archive without building
    ///
    /// Downloads and verifies the archive, caching it locally so a later
    /// `cook()` does not need the network for the source.
    pub fn fetch(&self, recipe: &Recipe) -> Result<PathBuf> {
        info!(
            "Fetching sources for {} version {}",
            recipe.package.name, recipe.package.version
        );

        match recipe.select_source(BuildMode::Release)? {
            SourceSelector::Pinned { url, checksum } => self.fetch_source(&url, &checksum),
            SourceSelector::Head { url, .. } => Err(Error::SourceFetchFailed(format!(
                "{} is a branch and cannot be prefetched",
                url
            ))),
        }
    }

    /// Check if the release archive is already cached
    pub fn sources_cached(&self, recipe: &Recipe) -> bool {
        Checksum::parse(&recipe.source.checksum)
            .map(|c| self.config.source_cache.join(c.cache_key()).exists())
            .unwrap_or(false)
    }

    /// Fetch a source archive (with caching), gated on its digest
    ///
    /// A mismatch is fatal and never retried; the fetched bytes are discarded.
    pub(crate) fn fetch_source(&self, url: &str, checksum: &str) -> Result<PathBuf> {
        let checksum = Checksum::parse(checksum).map_err(|e| {
            Error::ResolutionError(format!("Invalid checksum for {}: {}", url, e))
        })?;

        fs::create_dir_all(&self.config.source_cache).map_err(|e| {
            Error::SourceFetchFailed(format!(
                "cannot create source cache {}: {}",
                self.config.source_cache.display(),
                e
            ))
        })?;

        let cached_path = self.config.source_cache.join(checksum.cache_key());

        if cached_path.exists() {
            debug!("Using cached source: {}", cached_path.display());
            if verify_file_checksum(&cached_path, &checksum)?.is_ok() {
                return Ok(cached_path);
            }
            warn!("Cached file checksum mismatch, re-downloading");
            fs::remove_file(&cached_path)?;
        }

        info!("Downloading: {}", url);
        let temp = NamedTempFile::new_in(&self.config.source_cache)?;
        download_file(url, temp.path())?;

        if let Err(actual) = verify_file_checksum(temp.path(), &checksum)? {
            // Dropping `temp` deletes the rejected download
            return Err(Error::ChecksumMismatch {
                source_ref: url.to_string(),
                expected: checksum.to_string(),
                actual: actual.to_prefixed_string(),
            });
        }

        temp.persist(&cached_path)
            .map_err(|e| Error::IoError(format!("Failed to cache {}: {}", url, e)))?;
        Ok(cached_path)
    }
}
