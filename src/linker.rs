//! Symlink management for the user-local bin directory
//!
//! Places resolved binaries on PATH via symlinks in `~/.local/bin`.
//! Idempotent by construction: self-loops are skipped, regular files are
//! never overwritten, stale or broken links are replaced.

use std::fs;
use std::os::unix::fs::symlink;
use std::path::Path;

use normpath::PathExt;
use tracing::{debug, warn};

use crate::error::{Result, SetupError};

/// What `ensure_symlink` did, for reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkOutcome {
    /// Fresh symlink created (or a stale one replaced)
    Created,
    /// A correct symlink was already in place
    AlreadyLinked,
    /// Source resolves to the link path itself; creating it would loop
    SkippedSelfLoop,
    /// A regular file occupies the link path; left untouched
    RefusedOccupied,
}

/// Ensure `link` is a symlink pointing at the canonical path of `source`.
pub fn ensure_symlink(source: &Path, link: &Path) -> Result<LinkOutcome> {
    let canonical = source
        .normalize()
        .map(normpath::BasePathBuf::into_path_buf)
        .map_err(|e| SetupError::CommandFailed {
            command: format!("canonicalize {}", source.display()),
            reason: e.to_string(),
        })?;

    if canonical == link {
        debug!("skipping self-referential link at {}", link.display());
        return Ok(LinkOutcome::SkippedSelfLoop);
    }

    match fs::symlink_metadata(link) {
        Ok(meta) if meta.file_type().is_symlink() => {
            // Correct link already? read_link, not canonicalize: the link
            // may be dangling.
            let current = fs::read_link(link)?;
            if current == canonical {
                return Ok(LinkOutcome::AlreadyLinked);
            }
            debug!(
                "replacing stale link {} -> {}",
                link.display(),
                current.display()
            );
            fs::remove_file(link)?;
        }
        Ok(_) => {
            // User-owned regular file (or directory); never overwrite
            warn!("not replacing non-symlink at {}", link.display());
            return Ok(LinkOutcome::RefusedOccupied);
        }
        Err(_) => {}
    }

    if let Some(parent) = link.parent() {
        fs::create_dir_all(parent)?;
    }
    symlink(&canonical, link)?;
    Ok(LinkOutcome::Created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn touch(path: &PathBuf) {
        fs::write(path, "bin").unwrap();
    }

    #[test]
    fn test_creates_fresh_link() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("whisper-cli");
        touch(&source);
        let link = temp.path().join("bin").join("whisper-cli");

        assert_eq!(ensure_symlink(&source, &link).unwrap(), LinkOutcome::Created);
        assert_eq!(
            fs::read_link(&link).unwrap(),
            source.canonicalize().unwrap()
        );
    }

    #[test]
    fn test_second_run_is_noop() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("whisper-cli");
        touch(&source);
        let link = temp.path().join("link");

        assert_eq!(ensure_symlink(&source, &link).unwrap(), LinkOutcome::Created);
        assert_eq!(
            ensure_symlink(&source, &link).unwrap(),
            LinkOutcome::AlreadyLinked
        );
    }

    #[test]
    fn test_skips_self_loop() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("whisper-cli");
        touch(&source);
        // Link path IS the canonical source path
        let link = source.canonicalize().unwrap();
        assert_eq!(
            ensure_symlink(&source, &link).unwrap(),
            LinkOutcome::SkippedSelfLoop
        );
        // Still a regular file, not a circular link
        assert!(fs::symlink_metadata(&link).unwrap().file_type().is_file());
    }

    #[test]
    fn test_refuses_to_overwrite_regular_file() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("whisper-cli");
        touch(&source);
        let link = temp.path().join("occupied");
        touch(&link);

        assert_eq!(
            ensure_symlink(&source, &link).unwrap(),
            LinkOutcome::RefusedOccupied
        );
        assert_eq!(fs::read_to_string(&link).unwrap(), "bin");
    }

    #[test]
    fn test_replaces_broken_symlink() {
        let temp = TempDir::new().unwrap();
        let old_target = temp.path().join("deleted-binary");
        touch(&old_target);
        let link = temp.path().join("link");
        symlink(&old_target, &link).unwrap();
        fs::remove_file(&old_target).unwrap();

        let source = temp.path().join("whisper-cli");
        touch(&source);
        assert_eq!(ensure_symlink(&source, &link).unwrap(), LinkOutcome::Created);
        assert_eq!(
            fs::read_link(&link).unwrap(),
            source.canonicalize().unwrap()
        );
    }

    #[test]
    fn test_replaces_link_to_old_location() {
        let temp = TempDir::new().unwrap();
        let old = temp.path().join("old");
        let new = temp.path().join("new");
        touch(&old);
        touch(&new);
        let link = temp.path().join("link");
        symlink(old.canonicalize().unwrap(), &link).unwrap();

        assert_eq!(ensure_symlink(&new, &link).unwrap(), LinkOutcome::Created);
        assert_eq!(fs::read_link(&link).unwrap(), new.canonicalize().unwrap());
    }
}
