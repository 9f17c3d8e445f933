// src/commands/cook.rs

//! Cook command - build, install and verify a recipe

use anyhow::{Context, Result};
use asq_formula::recipe::{
    parse_recipe_file, validate_recipe, BuildMode, BuildReport, BuildStatus, Kitchen,
    KitchenConfig, PathResolver,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use super::print_verification;

/// Options for `cook`, as given on the command line
pub struct CookOptions {
    pub prefix: PathBuf,
    pub head: bool,
    pub source_cache: PathBuf,
    pub keep_builddir: bool,
    pub no_test: bool,
    pub timeout: Option<u64>,
    pub tools: Vec<(String, PathBuf)>,
}

/// Cook a recipe into a prefix
///
/// Install failures are returned as errors. A completed install reports its
/// verification outcome through the returned status.
pub fn cmd_cook(recipe_path: &Path, opts: CookOptions) -> Result<BuildStatus> {
    // Parse the recipe
    println!("Reading recipe: {}", recipe_path.display());
    let recipe = parse_recipe_file(recipe_path)
        .with_context(|| format!("Failed to parse recipe: {}", recipe_path.display()))?;

    println!("Recipe: {} version {}", recipe.package.name, recipe.package.version);

    // Validate the recipe
    let warnings = validate_recipe(&recipe).with_context(|| "Recipe validation failed")?;

    for warning in &warnings {
        println!("Warning: {}", warning);
    }

    // Configure the kitchen
    let config = KitchenConfig {
        source_cache: opts.source_cache,
        keep_builddir: opts.keep_builddir,
        timeout: opts.timeout.map(Duration::from_secs),
        tools: opts.tools.into_iter().collect(),
        ..Default::default()
    };

    let resolver = Arc::new(PathResolver::new(config.tools.clone()));
    let kitchen = Kitchen::with_resolver(config, resolver);

    let mode = if opts.head {
        println!("[WARNING] Building head branch: source is not pinned to a digest");
        BuildMode::Head
    } else {
        BuildMode::Release
    };

    if mode == BuildMode::Release && kitchen.sources_cached(&recipe) {
        println!("  - Source already cached (offline fetch possible)");
    }

    println!("Cooking {} into {}...", recipe.package.name, opts.prefix.display());
    let report = if opts.no_test {
        let cook = kitchen
            .cook(&recipe, mode, &opts.prefix)
            .with_context(|| format!("Failed to cook {}", recipe.package.name))?;
        BuildReport {
            cook,
            verification: None,
        }
    } else {
        kitchen
            .cook_and_taste(&recipe, mode, &opts.prefix)
            .with_context(|| format!("Failed to cook {}", recipe.package.name))?
    };
    let result = &report.cook;

    println!("\n[COMPLETE] Installed: {}", result.binary_path.display());

    if !result.warnings.is_empty() {
        println!("\nBuild warnings:");
        for warning in &result.warnings {
            println!("  - {}", warning);
        }
    }

    if let Some(dir) = &result.build_dir {
        println!("Build directory kept at {}", dir.display());
    }

    info!(
        "Successfully cooked {} to {}",
        recipe.package.name,
        result.binary_path.display()
    );

    match &report.verification {
        Some(verification) => {
            println!("\nTested {}:", result.binary_path.display());
            print_verification(&recipe, verification);
        }
        None => println!("[SKIPPED] No self-test run"),
    }

    Ok(report.status())
}
