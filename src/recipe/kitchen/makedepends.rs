// src/recipe/kitchen/makedepends.rs

//! Makedepends resolution for recipe builds

use crate::error::Result;
use crate::recipe::format::BuildDependency;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::debug;

/// Trait for checking makedepends before building
///
/// This allows the Kitchen to stay decoupled from how build tools are
/// located (tool table, `PATH`, a package database).
pub trait MakedependsResolver: Send + Sync {
    /// Check which makedepends are missing
    ///
    /// Takes dependency specs as written in the recipe (`go@1.23.4`) and
    /// returns the ones that are not available.
    fn check_missing(&self, deps: &[&str]) -> Result<Vec<String>>;
}

/// Resolver that looks tools up in the tool table and on `PATH`
///
/// A dependency is present if its tool name is in the explicit tool table
/// or can be found on `PATH`. Missing tools stay unresolved.
pub struct PathResolver {
    tools: BTreeMap<String, PathBuf>,
}

impl PathResolver {
    pub fn new(tools: BTreeMap<String, PathBuf>) -> Self {
        Self { tools }
    }

    fn is_available(&self, name: &str) -> bool {
        if let Some(path) = self.tools.get(name) {
            return path.exists() || which::which(path).is_ok();
        }
        which::which(name).is_ok()
    }
}

impl MakedependsResolver for PathResolver {
    fn check_missing(&self, deps: &[&str]) -> Result<Vec<String>> {
        let mut missing = Vec::new();
        for spec in deps {
            let dep = BuildDependency::parse(spec)?;
            if self.is_available(&dep.name) {
                debug!("Found build tool {}", dep.name);
            } else {
                missing.push(spec.to_string());
            }
        }
        Ok(missing)
    }
}

/// Result of makedepends resolution
#[derive(Debug, Default, Clone)]
pub struct MakedependsResult {
    /// Build tools that were found
    pub available: Vec<String>,
    /// Build tools that could not be found
    pub unresolved: Vec<String>,
}
