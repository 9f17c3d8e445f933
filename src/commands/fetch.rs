// src/commands/fetch.rs

//! Fetch command - download and verify the release archive

use anyhow::{Context, Result};
use asq_formula::recipe::{parse_recipe_file, Kitchen, KitchenConfig};
use std::path::{Path, PathBuf};

pub fn cmd_fetch(recipe_path: &Path, source_cache: &Path) -> Result<()> {
    let recipe = parse_recipe_file(recipe_path)
        .with_context(|| format!("Failed to parse recipe: {}", recipe_path.display()))?;

    let kitchen = Kitchen::new(KitchenConfig {
        source_cache: PathBuf::from(source_cache),
        ..Default::default()
    });

    if kitchen.sources_cached(&recipe) {
        println!("[OK] Source already cached for {} {}", recipe.package.name, recipe.package.version);
    }

    println!("Fetching sources for {} {}...", recipe.package.name, recipe.package.version);
    let archive = kitchen
        .fetch(&recipe)
        .with_context(|| format!("Failed to fetch sources for {}", recipe.package.name))?;

    println!("\n[COMPLETE] Fetched: {}", archive.display());
    println!("[OK] Source is cached. Ready for offline build.");

    Ok(())
}
