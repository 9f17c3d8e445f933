// src/commands/validate.rs

//! Validate command - check a recipe without building

use anyhow::{Context, Result};
use asq_formula::recipe::{parse_recipe_file, validate_recipe};
use std::path::Path;

pub fn cmd_validate(recipe_path: &Path) -> Result<()> {
    println!("Reading recipe: {}", recipe_path.display());
    let recipe = parse_recipe_file(recipe_path)
        .with_context(|| format!("Failed to parse recipe: {}", recipe_path.display()))?;

    println!("Recipe: {} version {}", recipe.package.name, recipe.package.version);

    let warnings = validate_recipe(&recipe).with_context(|| "Recipe validation failed")?;

    for warning in &warnings {
        println!("Warning: {}", warning);
    }

    println!("Recipe validation passed");
    if warnings.is_empty() {
        println!("[OK] No issues found");
    } else {
        println!("[OK] {} warning(s)", warnings.len());
    }

    Ok(())
}
