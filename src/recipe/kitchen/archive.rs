// src/recipe/kitchen/archive.rs

//! Archive and source checkout utilities for the Kitchen

use crate::error::{Error, Result};
use crate::hash::{hash_file, Checksum, Hash};
use flate2::read::GzDecoder;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;
use tracing::debug;
use xz2::read::XzDecoder;

use super::run::run_command;

/// Download a file from a URL
///
/// `http(s)://` goes through reqwest; `file://` URLs and absolute paths are
/// copied from the local filesystem (mirrors, tests, offline builds).
pub fn download_file(url: &str, dest: &Path) -> Result<()> {
    if let Some(local) = local_path(url) {
        debug!("Copying local source {}", local.display());
        fs::copy(&local, dest).map_err(|e| {
            Error::DownloadError(format!("Failed to read {}: {}", local.display(), e))
        })?;
        return Ok(());
    }

    let mut response = reqwest::blocking::get(url)
        .and_then(|r| r.error_for_status())
        .map_err(|e| Error::DownloadError(format!("Failed to download {}: {}", url, e)))?;

    let mut file = File::create(dest)?;
    io::copy(&mut response, &mut file)
        .map_err(|e| Error::DownloadError(format!("Failed to download {}: {}", url, e)))?;

    Ok(())
}

fn local_path(url: &str) -> Option<PathBuf> {
    if Path::new(url).is_absolute() {
        return Some(PathBuf::from(url));
    }
    let parsed = url::Url::parse(url).ok()?;
    if parsed.scheme() == "file" {
        parsed.to_file_path().ok()
    } else {
        None
    }
}

/// Hash a file with the checksum's algorithm and compare
///
/// Returns the computed hash on mismatch so callers can report it.
pub fn verify_file_checksum(path: &Path, expected: &Checksum) -> Result<std::result::Result<(), Hash>> {
    let actual = hash_file(expected.algorithm, path)?;
    if expected.matches(&actual) {
        Ok(Ok(()))
    } else {
        Ok(Err(actual))
    }
}

/// Extract an archive to a destination directory
///
/// Supports: .tar.gz, .tgz, .tar.xz, .txz, .tar
pub fn extract_archive(archive: &Path, dest: &Path) -> Result<()> {
    let filename = archive
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("");

    let reader: Box<dyn Read> = if filename.ends_with(".tar.gz") || filename.ends_with(".tgz") {
        Box::new(GzDecoder::new(File::open(archive)?))
    } else if filename.ends_with(".tar.xz") || filename.ends_with(".txz") {
        Box::new(XzDecoder::new(File::open(archive)?))
    } else if filename.ends_with(".tar") {
        Box::new(File::open(archive)?)
    } else {
        return Err(Error::ParseError(format!(
            "Unknown archive format: {}",
            filename
        )));
    };

    tar::Archive::new(reader)
        .unpack(dest)
        .map_err(|e| Error::IoError(format!("Failed to extract {}: {}", filename, e)))
}

/// Check out the tip of a branch with git
pub fn clone_branch(
    git: &Path,
    url: &str,
    branch: &str,
    dest: &Path,
    timeout: Option<Duration>,
) -> Result<()> {
    let mut command = Command::new(git);
    command
        .args(["clone", "--depth", "1", "--branch", branch, url])
        .arg(dest);

    let output = run_command(&mut command, timeout).map_err(|e| {
        Error::SourceFetchFailed(format!("git clone of {} failed: {}", url, e))
    })?;

    if !output.success {
        return Err(Error::SourceFetchFailed(format!(
            "Failed to check out {} ({}): {}",
            url,
            branch,
            output.stderr.trim()
        )));
    }

    Ok(())
}

/// The directory a checkout actually lives in
///
/// Release tarballs usually wrap everything in one top-level directory.
pub fn source_root(extracted: &Path) -> Result<PathBuf> {
    let entries: Vec<_> = fs::read_dir(extracted)?.filter_map(|e| e.ok()).collect();

    if entries.len() == 1 && entries[0].file_type().map(|t| t.is_dir()).unwrap_or(false) {
        Ok(entries[0].path())
    } else {
        Ok(extracted.to_path_buf())
    }
}
