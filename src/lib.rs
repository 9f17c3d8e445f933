// src/lib.rs

//! asq-formula
//!
//! Builds the `asq` Go code-analysis tool from a declarative recipe, installs
//! its binary into a prefix, and verifies the install with a smoke test.
//!
//! # Architecture
//!
//! - Recipes: TOML build specifications with `%(var)s` substitution
//! - Kitchen: fetches, builds and installs one recipe at a time
//! - Integrity: release archives are gated on their digest before any build step
//! - Isolation: every build gets its own directory and its own environment value

mod error;
pub mod hash;
pub mod recipe;

pub use error::{Error, ErrorCategory, Result};
pub use hash::{Checksum, Hash, HashAlgorithm, Hasher};
pub use recipe::{
    BuildMode, BuildReport, BuildStatus, Cook, CookResult, Kitchen, KitchenConfig, Recipe,
    SourceSelector, Verification,
};
