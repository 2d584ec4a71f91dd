//! Common test utilities for voxd-setup integration tests

use std::path::PathBuf;
use tempfile::TempDir;

/// A scratch home directory so tests never touch the real user state
#[allow(dead_code)]
pub struct TestHome {
    /// Temporary directory backing the fake home
    #[allow(dead_code)]
    pub temp: TempDir,
    /// Path to the fake home root
    pub path: PathBuf,
}

#[allow(dead_code)]
impl TestHome {
    pub fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let path = temp.path().to_path_buf();
        Self { temp, path }
    }

    /// Build a voxd-setup Command with HOME and XDG vars pinned inside
    /// the scratch directory
    // Temporary fix for deprecated cargo_bin - will be updated when build-dir issues are resolved
    #[allow(deprecated)]
    pub fn cmd(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::Command::cargo_bin("voxd-setup").unwrap();
        cmd.env("HOME", &self.path)
            .env("XDG_DATA_HOME", self.path.join(".local/share"))
            .env("XDG_STATE_HOME", self.path.join(".local/state"))
            .env("XDG_CONFIG_HOME", self.path.join(".config"))
            .env_remove("VOXD_BIN_REPO")
            .env_remove("VOXD_BIN_TAG");
        cmd
    }

    /// Write a file under the fake home, creating parents
    pub fn write_file(&self, rel: &str, content: &str) -> PathBuf {
        let file_path = self.path.join(rel);
        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        std::fs::write(&file_path, content).expect("Failed to write file");
        file_path
    }

    /// Write an executable file under the fake home
    pub fn write_executable(&self, rel: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;
        let path = self.write_file(rel, "#!/bin/sh\nexit 0\n");
        let mut perms = std::fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&path, perms).unwrap();
        path
    }

    /// Check whether a path exists under the fake home
    pub fn exists(&self, rel: &str) -> bool {
        self.path.join(rel).exists()
    }
}
