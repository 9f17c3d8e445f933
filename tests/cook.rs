// tests/cook.rs

//! End-to-end cooking tests with a fake toolchain.
//!
//! Each test builds the asq recipe against a local release tarball (or a fake
//! git checkout), installs into a scratch prefix and tastes the result.

#![cfg(unix)]

mod common;

use asq_formula::recipe::{
    parse_recipe, BuildMode, BuildStatus, Kitchen, KitchenConfig, PathResolver, TasteState,
};
use asq_formula::{Error, ErrorCategory};
use common::{recipe_toml, sha256_of, GoBehavior, Workspace, BROKEN_ASQ, GOOD_ASQ};
use std::fs;
use std::sync::Arc;

fn kitchen_for(ws: &Workspace, go_behavior: GoBehavior, asq_body: &str) -> Kitchen {
    let go = ws.fake_go(asq_body, go_behavior);
    let git = ws.fake_git();
    let config = KitchenConfig::rooted_at(&ws.root().join("kitchen"))
        .with_tool("go", go)
        .with_tool("git", git);
    let resolver = Arc::new(PathResolver::new(config.tools.clone()));
    Kitchen::with_resolver(config, resolver)
}

#[test]
fn test_release_build_installs_and_verifies() {
    let ws = Workspace::new();
    let archive = ws.source_tarball();
    let recipe = parse_recipe(&recipe_toml(&archive, &sha256_of(&archive), "explicit")).unwrap();
    let kitchen = kitchen_for(&ws, GoBehavior::default(), GOOD_ASQ);

    let report = kitchen
        .cook_and_taste(&recipe, BuildMode::Release, &ws.prefix())
        .unwrap();

    assert_eq!(report.status(), BuildStatus::Verified);
    assert_eq!(report.cook.binary_path, ws.installed_binary());
    assert!(ws.installed_binary().is_file());

    let verification = report.verification.as_ref().unwrap();
    assert_eq!(verification.checks.len(), 2);
    assert!(verification.checks[0].stdout.contains("(call_expression"));
    assert!(verification.checks[1].stdout.contains("//asq_match"));

    // Dependencies are fetched in declaration order, then the build runs once
    let log = ws.log();
    assert_eq!(log[0], "go get github.com/go-enry/go-enry/v2");
    assert_eq!(log[1], "go get github.com/smacker/go-tree-sitter");
    assert_eq!(log[2], "go get github.com/alexflint/go-arg");
    assert!(log[3].starts_with("go build -o "));
    assert!(log[3].ends_with("/stage/bin/asq ./cmd/asq"));
    assert_eq!(log.len(), 5);

    // The build saw the private environment rooted at the checkout
    assert!(log[4].contains("GO111MODULE=on"));
    assert!(log[4].contains("/asq-0.1.0 "));

    // Environment first (sorted by name), then every subprocess step
    let steps = &report.cook.steps;
    assert_eq!(steps.len(), 6);
    assert_eq!(steps[0], "GO111MODULE=on");
    assert!(steps[1].starts_with("GOPATH=") && steps[1].ends_with("/asq-0.1.0"));
    assert_eq!(steps[2], "go get github.com/go-enry/go-enry/v2");
    assert_eq!(steps[5], log[3]);
}

#[test]
fn test_placeholder_digest_stops_before_any_build_step() {
    let ws = Workspace::new();
    let archive = ws.source_tarball();
    let recipe = parse_recipe(&recipe_toml(&archive, "0", "explicit")).unwrap();
    let kitchen = kitchen_for(&ws, GoBehavior::default(), GOOD_ASQ);

    let err = kitchen
        .cook_and_taste(&recipe, BuildMode::Release, &ws.prefix())
        .unwrap_err();

    match &err {
        Error::ChecksumMismatch { expected, actual, .. } => {
            assert_eq!(expected, "sha256:0");
            assert_eq!(actual, &sha256_of(&archive));
        }
        other => panic!("expected checksum mismatch, got {:?}", other),
    }
    assert_eq!(err.category(), ErrorCategory::Resolution);

    // The toolchain never ran and nothing was installed or cached
    assert!(ws.log().is_empty());
    assert!(!ws.installed_binary().exists());
    let cache = kitchen.config().source_cache.clone();
    assert_eq!(fs::read_dir(&cache).unwrap().count(), 0);
}

#[test]
fn test_failed_smoke_test_keeps_install_but_reports_failure() {
    let ws = Workspace::new();
    let archive = ws.source_tarball();
    let recipe = parse_recipe(&recipe_toml(&archive, &sha256_of(&archive), "explicit")).unwrap();
    let kitchen = kitchen_for(&ws, GoBehavior::default(), BROKEN_ASQ);

    let report = kitchen
        .cook_and_taste(&recipe, BuildMode::Release, &ws.prefix())
        .unwrap();

    assert_eq!(report.status(), BuildStatus::Failed);
    assert!(ws.installed_binary().is_file());

    // The first assertion fails, so the query check never runs
    let verification = report.verification.unwrap();
    assert_eq!(verification.state, TasteState::Failed);
    assert_eq!(verification.checks.len(), 1);
    assert!(verification.checks[0].invocation.contains("tree-sitter"));
    assert!(verification.failure().unwrap().contains("(call_expression"));
}

#[test]
fn test_head_build_skips_digest() {
    let ws = Workspace::new();
    // The release digest is a placeholder, which must not matter for head builds
    let recipe = parse_recipe(&recipe_toml(&ws.root().join("missing.tar.gz"), "0", "explicit"))
        .unwrap();
    let kitchen = kitchen_for(&ws, GoBehavior::default(), GOOD_ASQ);

    let report = kitchen
        .cook_and_taste(&recipe, BuildMode::Head, &ws.prefix())
        .unwrap();

    assert_eq!(report.status(), BuildStatus::Verified);
    assert!(report.cook.source.is_head());
    assert!(report.cook.warnings.iter().any(|w| w.contains("no digest")));

    let log = ws.log();
    assert!(log[0].starts_with(
        "git clone --depth 1 --branch main https://github.com/StCredZero/asq.git "
    ));
    assert!(log.iter().any(|l| l.starts_with("go build")));
}

#[test]
fn test_dependency_fetch_failure_never_builds() {
    let ws = Workspace::new();
    let archive = ws.source_tarball();
    let recipe = parse_recipe(&recipe_toml(&archive, &sha256_of(&archive), "explicit")).unwrap();
    let behavior = GoBehavior {
        fail_get: true,
        ..Default::default()
    };
    let kitchen = kitchen_for(&ws, behavior, GOOD_ASQ);

    let err = kitchen
        .cook(&recipe, BuildMode::Release, &ws.prefix())
        .unwrap_err();

    match &err {
        Error::DependencyFetchError { package, message } => {
            assert_eq!(package, "github.com/go-enry/go-enry/v2");
            assert!(message.contains("not found"));
        }
        other => panic!("expected dependency fetch error, got {:?}", other),
    }
    assert_eq!(err.category(), ErrorCategory::DependencyFetch);

    assert_eq!(ws.log(), vec!["go get github.com/go-enry/go-enry/v2"]);
    assert!(!ws.installed_binary().exists());
}

#[test]
fn test_later_dependency_fetch_failure_never_builds() {
    let ws = Workspace::new();
    let archive = ws.source_tarball();
    let recipe = parse_recipe(&recipe_toml(&archive, &sha256_of(&archive), "explicit")).unwrap();
    let behavior = GoBehavior {
        fail_get_of: Some("github.com/alexflint/go-arg"),
        ..Default::default()
    };
    let kitchen = kitchen_for(&ws, behavior, GOOD_ASQ);

    let err = kitchen
        .cook(&recipe, BuildMode::Release, &ws.prefix())
        .unwrap_err();

    assert!(matches!(
        err,
        Error::DependencyFetchError { ref package, .. } if package == "github.com/alexflint/go-arg"
    ));
    assert_eq!(
        ws.log(),
        vec![
            "go get github.com/go-enry/go-enry/v2",
            "go get github.com/smacker/go-tree-sitter",
            "go get github.com/alexflint/go-arg",
        ]
    );
    assert!(!ws.log().iter().any(|l| l.starts_with("go build")));
    assert!(!ws.installed_binary().exists());
}

#[test]
fn test_unwritable_build_root_is_environment_error() {
    let ws = Workspace::new();
    let archive = ws.source_tarball();
    let recipe = parse_recipe(&recipe_toml(&archive, &sha256_of(&archive), "explicit")).unwrap();

    // A regular file where the build root's parent directory should be
    let blocker = ws.root().join("blocker");
    fs::write(&blocker, "").unwrap();

    let go = ws.fake_go(GOOD_ASQ, GoBehavior::default());
    let mut config = KitchenConfig::rooted_at(&ws.root().join("kitchen")).with_tool("go", go);
    config.build_root = Some(blocker.join("builds"));
    config.check_makedepends = false;
    let kitchen = Kitchen::new(config);

    let err = kitchen
        .cook(&recipe, BuildMode::Release, &ws.prefix())
        .unwrap_err();

    assert!(matches!(err, Error::EnvironmentError(_)));
    assert_eq!(err.category(), ErrorCategory::Environment);
    assert!(ws.log().is_empty());
    assert!(!ws.installed_binary().exists());
}

#[test]
fn test_build_failure_leaves_prefix_unchanged() {
    let ws = Workspace::new();
    let archive = ws.source_tarball();
    let recipe = parse_recipe(&recipe_toml(&archive, &sha256_of(&archive), "explicit")).unwrap();
    let behavior = GoBehavior {
        fail_build: true,
        ..Default::default()
    };
    let kitchen = kitchen_for(&ws, behavior, GOOD_ASQ);

    fs::create_dir_all(ws.prefix().join("bin")).unwrap();
    fs::write(ws.installed_binary(), "previous install").unwrap();

    let err = kitchen
        .cook(&recipe, BuildMode::Release, &ws.prefix())
        .unwrap_err();

    assert!(matches!(err, Error::BuildFailed(ref m) if m.contains("syntax error")));
    assert_eq!(err.category(), ErrorCategory::Build);
    assert_eq!(
        fs::read_to_string(ws.installed_binary()).unwrap(),
        "previous install"
    );
    assert_eq!(fs::read_dir(ws.prefix().join("bin")).unwrap().count(), 1);
}

#[test]
fn test_manifest_provisioning_uses_single_download() {
    let ws = Workspace::new();
    let archive = ws.source_tarball();
    let recipe = parse_recipe(&recipe_toml(&archive, &sha256_of(&archive), "manifest")).unwrap();
    let kitchen = kitchen_for(&ws, GoBehavior::default(), GOOD_ASQ);

    let result = kitchen
        .cook(&recipe, BuildMode::Release, &ws.prefix())
        .unwrap();

    let log = ws.log();
    assert_eq!(log[0], "go mod download");
    assert!(log[1].starts_with("go build"));
    assert!(!log.iter().any(|l| l.starts_with("go get")));
    assert!(result.binary_path.is_file());
}

#[test]
fn test_missing_toolchain_is_resolution_error() {
    let ws = Workspace::new();
    let archive = ws.source_tarball();
    let recipe = parse_recipe(&recipe_toml(&archive, &sha256_of(&archive), "explicit")).unwrap();

    let config = KitchenConfig::rooted_at(&ws.root().join("kitchen"))
        .with_tool("go", ws.root().join("tools").join("go-not-installed"));
    let resolver = Arc::new(PathResolver::new(config.tools.clone()));
    let kitchen = Kitchen::with_resolver(config, resolver);

    let err = kitchen
        .cook(&recipe, BuildMode::Release, &ws.prefix())
        .unwrap_err();

    assert!(matches!(err, Error::ResolutionError(ref m) if m.contains("go@1.23.4")));
    assert!(!ws.prefix().exists());
}

#[test]
fn test_missing_tool_without_makedepends_check() {
    let ws = Workspace::new();
    let archive = ws.source_tarball();
    let recipe = parse_recipe(&recipe_toml(&archive, &sha256_of(&archive), "explicit")).unwrap();

    let mut config = KitchenConfig::rooted_at(&ws.root().join("kitchen"))
        .with_tool("go", ws.root().join("tools").join("go-not-installed"));
    config.check_makedepends = false;
    let kitchen = Kitchen::new(config);

    let err = kitchen
        .cook(&recipe, BuildMode::Release, &ws.prefix())
        .unwrap_err();

    assert!(matches!(err, Error::ToolNotFound(ref m) if m.starts_with("go ")));
    assert!(!ws.installed_binary().exists());
}

#[test]
fn test_second_release_build_uses_cached_source() {
    let ws = Workspace::new();
    let archive = ws.source_tarball();
    let recipe = parse_recipe(&recipe_toml(&archive, &sha256_of(&archive), "explicit")).unwrap();
    let kitchen = kitchen_for(&ws, GoBehavior::default(), GOOD_ASQ);

    kitchen.fetch(&recipe).unwrap();
    assert!(kitchen.sources_cached(&recipe));

    // The origin is gone; the verified copy in the cache is enough
    fs::remove_file(&archive).unwrap();
    let result = kitchen
        .cook(&recipe, BuildMode::Release, &ws.prefix())
        .unwrap();
    assert!(result.binary_path.is_file());
}

#[test]
fn test_keep_builddir() {
    let ws = Workspace::new();
    let archive = ws.source_tarball();
    let recipe = parse_recipe(&recipe_toml(&archive, &sha256_of(&archive), "explicit")).unwrap();

    let go = ws.fake_go(GOOD_ASQ, GoBehavior::default());
    let mut config = KitchenConfig::rooted_at(&ws.root().join("kitchen")).with_tool("go", go);
    config.keep_builddir = true;
    let kitchen = Kitchen::new(config);

    let result = kitchen
        .cook(&recipe, BuildMode::Release, &ws.prefix())
        .unwrap();

    let build_dir = result.build_dir.unwrap();
    assert!(build_dir.join("stage").join("bin").join("asq").is_file());
    assert!(build_dir.join("source").join("asq-0.1.0").join("go.mod").is_file());
}
