// src/recipe/mod.rs

//! Recipe system for building tools from source
//!
//! Recipes define how to build a single executable from source, including:
//! - The pinned release archive and its integrity digest
//! - An optional head branch for unpinned builds
//! - Build-time tools and library dependencies
//! - The toolchain invocation and its private environment
//! - A smoke test run against the installed binary
//!
//! # Culinary Terminology
//!
//! The build pipeline uses cooking metaphors:
//! - **Recipe**: The build specification (like a recipe card)
//! - **Kitchen**: The engine that cooks recipes
//! - **Cook**: Build and install one recipe
//! - **Prep**: Fetch and verify sources
//! - **Season**: Construct the build environment
//! - **Simmer**: Fetch dependencies and compile
//! - **Plate**: Install the binary
//! - **Taste**: Verify the installed binary
//!
//! # Example Recipe
//!
//! ```toml
//! [package]
//! name = "asq"
//! version = "0.1.0"
//!
//! [source]
//! archive = "https://github.com/StCredZero/asq/archive/refs/tags/v%(version)s.tar.gz"
//! checksum = "sha256:..."
//! head = { url = "https://github.com/StCredZero/asq.git", branch = "main" }
//!
//! [build]
//! makedepends = ["go@1.23.4"]
//! tool = "go"
//! dependencies = ["github.com/alexflint/go-arg"]
//! entry_point = "./cmd/asq"
//!
//! [build.environment]
//! GOPATH = "%(buildpath)s"
//! GO111MODULE = "on"
//! ```

mod format;
pub mod kitchen;
pub mod parser;
mod steps;

pub use format::{
    Assertion, BuildDependency, BuildMode, BuildSection, Fixture, HeadSource, PackageSection,
    ProvisionMode, Recipe, SourceSection, SourceSelector, TestSection,
};
pub use kitchen::{
    BuildReport, BuildStatus, CheckResult, Cook, CookResult, Kitchen, KitchenConfig,
    MakedependsResolver, MakedependsResult, PathResolver, TasteState, Verification,
};
pub use parser::{parse_recipe, parse_recipe_file, validate_recipe};
pub use steps::{InstallStep, Phase};
