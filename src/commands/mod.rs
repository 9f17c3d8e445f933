// src/commands/mod.rs
//! Command handlers for the asq-formula CLI

mod completions;
mod cook;
mod fetch;
mod validate;

pub use completions::cmd_completions;
pub use cook::{cmd_cook, CookOptions};
pub use fetch::cmd_fetch;
pub use test::cmd_test;
pub use validate::cmd_validate;

use asq_formula::recipe::{Recipe, Verification};

/// Print the outcome of each smoke-test invocation
fn print_verification(recipe: &Recipe, verification: &Verification) {
    for check in &verification.checks {
        let mark = if check.passed { "[PASS]" } else { "[FAIL]" };
        println!("  {} {}", mark, check.invocation);
        if let Some(reason) = &check.reason {
            println!("         {}", reason);
        }
    }

    if verification.is_verified() {
        println!("[OK] {} verified", recipe.package.name);
    } else {
        println!("[FAILED] {} installed but failed its self-test", recipe.package.name);
    }
}
