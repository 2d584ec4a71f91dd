//! PATH-based binary resolution
//!
//! First rung of the fallback chain: reuse an executable that already
//! exists, but never accept the installer's own symlink destination as a
//! resolution (that would be a self-referential no-op loop).

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::Result;
use crate::paths;

use super::BinaryTarget;

/// Whether `path` is an existing regular file with an execute bit
pub fn is_executable_file(path: &Path) -> bool {
    fs::metadata(path)
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

/// Canonicalize `candidate` and accept it unless it resolves to the
/// symlink destination the installer itself manages.
fn accept(candidate: &Path, intended_link: &Path) -> Option<PathBuf> {
    let canonical = fs::canonicalize(candidate).ok()?;
    if canonical == intended_link {
        debug!(
            "rejecting self-referential candidate {} -> {}",
            candidate.display(),
            canonical.display()
        );
        return None;
    }
    if is_executable_file(&canonical) {
        Some(canonical)
    } else {
        None
    }
}

/// Resolve a target already present on PATH or in the managed bin dir.
///
/// Broken symlinks never make it through: `which` skips non-executable
/// entries and canonicalization fails on dangling links, which forces the
/// caller onward to the prebuilt/source states.
pub fn resolve_on_path(target: BinaryTarget, intended_link: &Path) -> Result<Option<PathBuf>> {
    let name = target.binary_name();

    if let Ok(found) = which::which(name) {
        if let Some(path) = accept(&found, intended_link) {
            return Ok(Some(path));
        }
    }

    // A previous run may have provisioned into the managed dir even if
    // ~/.local/bin is not on PATH yet
    let managed = paths::managed_bin_dir()?.join(name);
    if let Some(path) = accept(&managed, intended_link) {
        return Ok(Some(path));
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::fs::symlink;
    use tempfile::TempDir;

    fn write_executable(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, "#!/bin/sh\n").unwrap();
        let mut perms = fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&path, perms).unwrap();
        path
    }

    #[test]
    fn test_is_executable_file() {
        let temp = TempDir::new().unwrap();
        let exe = write_executable(temp.path(), "tool");
        assert!(is_executable_file(&exe));

        let plain = temp.path().join("plain");
        fs::write(&plain, "data").unwrap();
        assert!(!is_executable_file(&plain));

        assert!(!is_executable_file(&temp.path().join("missing")));
    }

    #[test]
    fn test_accept_regular_binary() {
        let temp = TempDir::new().unwrap();
        let exe = write_executable(temp.path(), "whisper-cli");
        let link = temp.path().join("link").join("whisper-cli");
        let accepted = accept(&exe, &link).unwrap();
        assert_eq!(accepted, exe.canonicalize().unwrap());
    }

    #[test]
    fn test_accept_rejects_self_referential_link() {
        let temp = TempDir::new().unwrap();
        let real = write_executable(temp.path(), "real-binary");
        // candidate is a symlink whose canonical path IS the managed link path
        let link = temp.path().join("whisper-cli");
        symlink(&real, &link).unwrap();
        assert!(accept(&link, &real.canonicalize().unwrap()).is_none());
    }

    #[test]
    fn test_accept_rejects_broken_symlink() {
        let temp = TempDir::new().unwrap();
        let dangling = temp.path().join("whisper-cli");
        symlink(temp.path().join("deleted"), &dangling).unwrap();
        let link = temp.path().join("other");
        assert!(accept(&dangling, &link).is_none());
    }
}
