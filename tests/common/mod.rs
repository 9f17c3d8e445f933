// tests/common/mod.rs

//! Shared test utilities and helpers for integration tests.
//!
//! The toolchain, version control and the packaged binary are all replaced by
//! small shell scripts that append their arguments to a log file, so tests
//! can assert exactly which commands ran and in what order.

#![allow(dead_code)]

use asq_formula::hash::{hash_file, HashAlgorithm};
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::{self, File};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Fixture used by every test recipe
pub const FIXTURE: &str = "package main\nfunc main() {\n  //asq_start\n  println(\"Hello, World!\")\n  //asq_end\n}\n";

/// A fake `asq` that behaves like the real tool on the fixture
pub const GOOD_ASQ: &str = r#"grep -q asq_start "$2" || exit 4
case "$1" in
  tree-sitter) echo '(source_file (function_declaration body: (block (call_expression))))' ;;
  query) echo '//asq_match'; sed -n '/asq_start/,/asq_end/p' "$2" ;;
  *) exit 2 ;;
esac"#;

/// A fake `asq` whose parser never finds a call expression
pub const BROKEN_ASQ: &str = r#"case "$1" in
  tree-sitter) echo '(source_file)' ;;
  query) echo '//asq_match' ;;
  *) exit 2 ;;
esac"#;

/// How the fake `go` should behave
#[derive(Clone, Copy, Default)]
pub struct GoBehavior {
    /// Every `go get` fails
    pub fail_get: bool,
    /// Only `go get` of this package fails
    pub fail_get_of: Option<&'static str>,
    pub fail_build: bool,
}

/// Scratch layout for one test: tools, sources, cache and prefix
pub struct Workspace {
    pub dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("tools")).unwrap();
        Self { dir }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn prefix(&self) -> PathBuf {
        self.root().join("prefix")
    }

    pub fn installed_binary(&self) -> PathBuf {
        self.prefix().join("bin").join("asq")
    }

    /// Log every fake tool appends to
    pub fn log_path(&self) -> PathBuf {
        self.root().join("commands.log")
    }

    /// Logged command lines, empty if nothing ran
    pub fn log(&self) -> Vec<String> {
        fs::read_to_string(self.log_path())
            .map(|s| s.lines().map(|l| l.to_string()).collect())
            .unwrap_or_default()
    }

    /// Write the fake `asq` that `go build` will produce
    pub fn asq_source(&self, body: &str) -> PathBuf {
        let path = self.root().join("tools").join("asq.sh");
        write_script(&path, body);
        path
    }

    /// Write a fake `go` toolchain
    pub fn fake_go(&self, asq_body: &str, behavior: GoBehavior) -> PathBuf {
        let asq = self.asq_source(asq_body);
        let log = self.log_path();
        let fail = "echo \"go: module $2: not found\" >&2; exit 1";
        let get = match (behavior.fail_get, behavior.fail_get_of) {
            (true, _) => fail.to_string(),
            (false, Some(package)) => format!("[ \"$2\" != '{}' ] || {{ {}; }}", package, fail),
            (false, None) => ":".to_string(),
        };
        let build = if behavior.fail_build {
            "echo 'cmd/asq/main.go:3:1: syntax error' >&2; exit 1"
        } else {
            "[ -d \"$4\" ] || exit 3; cp ASQ \"$3\""
        };

        let body = format!(
            r#"echo "go $*" >> {log}
case "$1" in
  get|mod) {get} ;;
  build)
    echo "env GOPATH=$GOPATH GO111MODULE=$GO111MODULE" >> {log}
    {build} ;;
  *) exit 2 ;;
esac"#,
            log = shell_quote(&log),
            get = get,
            build = build.replace("ASQ", &shell_quote(&asq)),
        );

        let path = self.root().join("tools").join("go");
        write_script(&path, &body);
        path
    }

    /// Write a fake `git` whose clone produces a minimal module checkout
    pub fn fake_git(&self) -> PathBuf {
        let body = format!(
            r#"echo "git $*" >> {log}
[ "$1" = clone ] || exit 2
dest="$7"
mkdir -p "$dest/cmd/asq" || exit 1
echo 'module github.com/StCredZero/asq' > "$dest/go.mod"
echo 'package main' > "$dest/cmd/asq/main.go""#,
            log = shell_quote(&self.log_path()),
        );
        let path = self.root().join("tools").join("git");
        write_script(&path, &body);
        path
    }

    /// Release tarball laid out like a GitHub tag archive
    pub fn source_tarball(&self) -> PathBuf {
        let path = self.root().join("asq-0.1.0.tar.gz");
        write_tarball(
            &path,
            &[
                ("asq-0.1.0/go.mod", "module github.com/StCredZero/asq\n\ngo 1.23\n"),
                ("asq-0.1.0/cmd/asq/main.go", "package main\n\nfunc main() {}\n"),
            ],
        );
        path
    }
}

/// Recipe text for a local archive, in the shape of the shipped asq recipe
pub fn recipe_toml(archive: &Path, checksum: &str, provision: &str) -> String {
    format!(
        r#"[package]
name = "asq"
version = "0.1.0"
license = "MIT"

[source]
archive = "{archive}"
checksum = "{checksum}"

[source.head]
url = "https://github.com/StCredZero/asq.git"
branch = "main"

[build]
makedepends = ["go@1.23.4"]
tool = "go"
provision = "{provision}"
dependencies = [
    "github.com/go-enry/go-enry/v2",
    "github.com/smacker/go-tree-sitter",
    "github.com/alexflint/go-arg",
]
entry_point = "./cmd/asq"

[build.environment]
GOPATH = "%(buildpath)s"
GO111MODULE = "on"

[test.fixture]
name = "test.go"
content = {fixture:?}

[[test.assert]]
args = ["tree-sitter", "%(fixture)s"]
expect = "(call_expression"

[[test.assert]]
args = ["query", "%(fixture)s"]
expect = "//asq_match"
"#,
        archive = archive.display(),
        checksum = checksum,
        provision = provision,
        fixture = FIXTURE,
    )
}

/// Prefixed SHA-256 of a file
pub fn sha256_of(path: &Path) -> String {
    hash_file(HashAlgorithm::Sha256, path)
        .unwrap()
        .to_prefixed_string()
}

pub fn write_script(path: &Path, body: &str) {
    fs::write(path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
}

pub fn write_tarball(path: &Path, files: &[(&str, &str)]) {
    let file = File::create(path).unwrap();
    let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
    for (name, content) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, name, content.as_bytes())
            .unwrap();
    }
    builder.into_inner().unwrap().finish().unwrap();
}

fn shell_quote(path: &Path) -> String {
    format!("'{}'", path.display())
}
