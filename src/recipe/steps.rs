// src/recipe/steps.rs

//! Lowering of a recipe's `[build]` section into ordered install steps

use crate::recipe::format::{ProvisionMode, Recipe};
use std::fmt;
use std::path::Path;

/// Install phase a subprocess belongs to; decides how its failure is reported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Fetching library dependencies into the workspace
    Provision,
    /// Compiling the executable
    Build,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Provision => "provision",
            Phase::Build => "build",
        }
    }
}

/// One shell-level install operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallStep {
    /// Add a variable to the build environment
    SetEnv { key: String, value: String },
    /// Run the toolchain with an argument list
    Run {
        phase: Phase,
        program: String,
        args: Vec<String>,
        /// Dependency this step fetches, for provisioning steps
        package: Option<String>,
    },
}

impl fmt::Display for InstallStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstallStep::SetEnv { key, value } => write!(f, "{}={}", key, value),
            InstallStep::Run { program, args, .. } => {
                write!(f, "{}", program)?;
                for arg in args {
                    write!(f, " {}", arg)?;
                }
                Ok(())
            }
        }
    }
}

impl Recipe {
    /// Ordered install steps for a checkout at `buildpath`
    ///
    /// Environment assignments come first, then dependency provisioning,
    /// and the sequence always ends with the single build invocation that
    /// writes `output`.
    pub fn install_steps(&self, buildpath: &Path, prefix: &Path, output: &Path) -> Vec<InstallStep> {
        let buildpath = buildpath.to_string_lossy();
        let prefix = prefix.to_string_lossy();
        let vars = [("buildpath", buildpath.as_ref()), ("prefix", prefix.as_ref())];
        let build = &self.build;
        let mut steps = Vec::new();

        for (key, value) in &build.environment {
            steps.push(InstallStep::SetEnv {
                key: key.clone(),
                value: self.substitute(value, &vars),
            });
        }

        match build.provision {
            ProvisionMode::Explicit => {
                for package in &build.dependencies {
                    steps.push(InstallStep::Run {
                        phase: Phase::Provision,
                        program: build.tool.clone(),
                        args: vec![build.fetch_subcommand.clone(), package.clone()],
                        package: Some(package.clone()),
                    });
                }
            }
            ProvisionMode::Manifest => {
                steps.push(InstallStep::Run {
                    phase: Phase::Provision,
                    program: build.tool.clone(),
                    args: build.manifest_args.clone(),
                    package: None,
                });
            }
        }

        steps.push(InstallStep::Run {
            phase: Phase::Build,
            program: build.tool.clone(),
            args: vec![
                build.build_subcommand.clone(),
                build.output_flag.clone(),
                output.to_string_lossy().to_string(),
                self.substitute(&build.entry_point, &vars),
            ],
            package: None,
        });

        steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipe::parse_recipe;

    const RECIPE: &str = r#"
[package]
name = "asq"
version = "0.1.0"

[source]
archive = "https://example.com/asq-%(version)s.tar.gz"
checksum = "sha256:abc"

[build]
tool = "go"
dependencies = ["github.com/go-enry/go-enry/v2", "github.com/smacker/go-tree-sitter", "github.com/alexflint/go-arg"]
entry_point = "./cmd/asq"

[build.environment]
GOPATH = "%(buildpath)s"
GO111MODULE = "on"
"#;

    fn steps_for(recipe: &Recipe) -> Vec<InstallStep> {
        recipe.install_steps(
            Path::new("/build/src"),
            Path::new("/prefix"),
            Path::new("/build/stage/bin/asq"),
        )
    }

    #[test]
    fn test_explicit_steps_in_order() {
        let recipe = parse_recipe(RECIPE).unwrap();
        let steps = steps_for(&recipe);

        assert_eq!(steps.len(), 6);
        assert_eq!(
            steps[0],
            InstallStep::SetEnv {
                key: "GO111MODULE".to_string(),
                value: "on".to_string()
            }
        );
        assert_eq!(
            steps[1],
            InstallStep::SetEnv {
                key: "GOPATH".to_string(),
                value: "/build/src".to_string()
            }
        );
        assert_eq!(steps[2].to_string(), "go get github.com/go-enry/go-enry/v2");
        assert_eq!(steps[3].to_string(), "go get github.com/smacker/go-tree-sitter");
        assert_eq!(steps[4].to_string(), "go get github.com/alexflint/go-arg");
        assert_eq!(steps[5].to_string(), "go build -o /build/stage/bin/asq ./cmd/asq");
    }

    #[test]
    fn test_last_step_is_build() {
        let recipe = parse_recipe(RECIPE).unwrap();
        let steps = steps_for(&recipe);
        assert!(matches!(
            steps.last(),
            Some(InstallStep::Run { phase: Phase::Build, .. })
        ));
    }

    #[test]
    fn test_manifest_mode_single_download() {
        let mut recipe = parse_recipe(RECIPE).unwrap();
        recipe.build.provision = ProvisionMode::Manifest;
        let steps = steps_for(&recipe);

        let provision: Vec<_> = steps
            .iter()
            .filter(|s| matches!(s, InstallStep::Run { phase: Phase::Provision, .. }))
            .collect();
        assert_eq!(provision.len(), 1);
        assert_eq!(provision[0].to_string(), "go mod download");
    }
}
