//! Binary provisioning
//!
//! Each managed binary is resolved through an ordered fallback chain:
//! already usable on PATH, then an architecture-matched prebuilt release
//! archive (with checksum verification), then a source build. Essential
//! binaries must resolve; optional ones may end `Unavailable` and the run
//! degrades gracefully.

pub mod build;
pub mod models;
pub mod path_probe;
pub mod release;

use std::fmt;
use std::path::PathBuf;

use tracing::{info, warn};

use crate::context::SetupContext;
use crate::error::{Result, SetupError};
use crate::paths;

/// Binaries the installer manages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryTarget {
    /// Speech-engine CLI; the app is useless without it
    WhisperCli,
    /// LLM server for AI post-processing; optional
    LlamaServer,
    /// Input-simulation daemon (Wayland typing); optional
    Ydotoold,
    /// Input-simulation client; optional, travels with the daemon
    Ydotool,
}

impl BinaryTarget {
    /// Executable name as it appears on PATH and in archives
    pub fn binary_name(self) -> &'static str {
        match self {
            BinaryTarget::WhisperCli => "whisper-cli",
            BinaryTarget::LlamaServer => "llama-server",
            BinaryTarget::Ydotoold => "ydotoold",
            BinaryTarget::Ydotool => "ydotool",
        }
    }

    /// Whether an `Unavailable` terminal state aborts the whole run
    pub fn essential(self) -> bool {
        matches!(self, BinaryTarget::WhisperCli)
    }

    /// What the user loses when this target ends up unavailable
    pub fn degradation_notice(self) -> &'static str {
        match self {
            BinaryTarget::WhisperCli => "transcription is impossible without whisper-cli",
            BinaryTarget::LlamaServer => "AI post-processing will be disabled",
            BinaryTarget::Ydotoold | BinaryTarget::Ydotool => {
                "simulated typing unavailable, falls back to clipboard-only"
            }
        }
    }

    /// Upstream repository for the source-build fallback
    pub fn upstream_repo(self) -> &'static str {
        match self {
            BinaryTarget::WhisperCli => "https://github.com/ggml-org/whisper.cpp",
            BinaryTarget::LlamaServer => "https://github.com/ggml-org/llama.cpp",
            BinaryTarget::Ydotoold | BinaryTarget::Ydotool => {
                "https://github.com/ReimuNotMoe/ydotool"
            }
        }
    }
}

impl fmt::Display for BinaryTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.binary_name())
    }
}

/// How a binary was ultimately obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    OnPath,
    PrebuiltDownload,
    SourceBuild,
    Unavailable,
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Provenance::OnPath => "on_path",
            Provenance::PrebuiltDownload => "prebuilt_download",
            Provenance::SourceBuild => "source_build",
            Provenance::Unavailable => "unavailable",
        })
    }
}

/// Outcome of provisioning one target
#[derive(Debug, Clone)]
pub struct BinaryResolution {
    pub target: BinaryTarget,
    pub path: Option<PathBuf>,
    pub provenance: Provenance,
}

impl BinaryResolution {
    pub fn unavailable(target: BinaryTarget) -> Self {
        Self {
            target,
            path: None,
            provenance: Provenance::Unavailable,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.provenance != Provenance::Unavailable
    }

    /// A resolution goes stale when its path vanishes or stops being
    /// executable (e.g. the user deleted the managed bin dir).
    pub fn is_valid(&self) -> bool {
        match &self.path {
            Some(path) => path_probe::is_executable_file(path),
            None => false,
        }
    }
}

/// Resolve one binary through the fallback chain.
///
/// Errors are only returned for essential targets; optional targets fold
/// every failure into an `Unavailable` resolution.
pub fn provision(ctx: &SetupContext, target: BinaryTarget) -> Result<BinaryResolution> {
    let link_path = paths::user_bin_dir()?.join(target.binary_name());
    let mut attempts: Vec<&str> = Vec::new();

    // CHECK_PATH
    attempts.push("on_path");
    if let Some(path) = path_probe::resolve_on_path(target, &link_path)? {
        info!("{target}: reusing {}", path.display());
        return Ok(BinaryResolution {
            target,
            path: Some(path),
            provenance: Provenance::OnPath,
        });
    }

    // CHECK_PREBUILT, gated on the run-start reachability probe
    if ctx.online {
        attempts.push("prebuilt_download");
        match release::fetch_prebuilt(ctx, target) {
            Ok(Some(path)) => {
                info!("{target}: installed prebuilt at {}", path.display());
                return Ok(BinaryResolution {
                    target,
                    path: Some(path),
                    provenance: Provenance::PrebuiltDownload,
                });
            }
            Ok(None) => {}
            Err(err) => warn!("{target}: prebuilt resolution failed: {err}"),
        }
    }

    // CHECK_SOURCE_BUILD
    if ctx.online {
        attempts.push("source_build");
        match build::build_from_source(target) {
            Ok(path) => {
                info!("{target}: built from source at {}", path.display());
                return Ok(BinaryResolution {
                    target,
                    path: Some(path),
                    provenance: Provenance::SourceBuild,
                });
            }
            Err(err) => warn!("{target}: source build failed: {err}"),
        }
    }

    if target.essential() {
        return Err(SetupError::ProvisioningExhausted {
            target: target.binary_name().to_string(),
            attempts: attempts.join(", "),
        });
    }
    warn!("{target}: unavailable; {}", target.degradation_notice());
    Ok(BinaryResolution::unavailable(target))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;
    use std::os::unix::fs::PermissionsExt;

    use tempfile::TempDir;

    use crate::context::SetupContext;
    use crate::pkgmgr::{PackageManager, PackageManagerProfile};

    fn offline_ctx() -> SetupContext {
        SetupContext {
            manager: PackageManagerProfile::for_tests(PackageManager::Apt),
            online: false,
            wayland: true,
            release_repo: "jakovius/voxd-prebuilts".to_string(),
            release_tag: None,
            skip_models: true,
            assume_yes: true,
        }
    }

    /// Pins HOME, XDG_DATA_HOME and PATH into a scratch directory and
    /// restores the previous values on drop, panic included
    struct EnvGuard {
        saved: Vec<(&'static str, Option<OsString>)>,
    }

    impl EnvGuard {
        fn pin(temp: &TempDir) -> Self {
            let keys = ["HOME", "XDG_DATA_HOME", "PATH"];
            let saved = keys.iter().map(|k| (*k, std::env::var_os(k))).collect();
            unsafe {
                std::env::set_var("HOME", temp.path());
                std::env::set_var("XDG_DATA_HOME", temp.path().join(".local").join("share"));
                std::env::set_var("PATH", temp.path().join("no-binaries-here"));
            }
            Self { saved }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            for (key, value) in self.saved.drain(..) {
                unsafe {
                    match value {
                        Some(v) => std::env::set_var(key, v),
                        None => std::env::remove_var(key),
                    }
                }
            }
        }
    }

    #[test]
    #[serial_test::serial]
    fn test_offline_optional_target_degrades_to_unavailable() {
        let temp = TempDir::new().unwrap();
        let _env = EnvGuard::pin(&temp);

        let resolution = provision(&offline_ctx(), BinaryTarget::Ydotoold).unwrap();
        assert_eq!(resolution.provenance, Provenance::Unavailable);
        assert!(!resolution.is_resolved());
        assert_eq!(resolution.path, None);
    }

    #[test]
    #[serial_test::serial]
    fn test_offline_essential_target_errors_naming_attempts() {
        let temp = TempDir::new().unwrap();
        let _env = EnvGuard::pin(&temp);

        let err = provision(&offline_ctx(), BinaryTarget::WhisperCli).unwrap_err();
        match err {
            SetupError::ProvisioningExhausted { target, attempts } => {
                assert_eq!(target, "whisper-cli");
                assert_eq!(attempts, "on_path");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    #[serial_test::serial]
    fn test_offline_reuses_binary_from_managed_dir() {
        let temp = TempDir::new().unwrap();
        let _env = EnvGuard::pin(&temp);

        let bin_dir = paths::managed_bin_dir().unwrap();
        std::fs::create_dir_all(&bin_dir).unwrap();
        let binary = bin_dir.join("whisper-cli");
        std::fs::write(&binary, "#!/bin/sh\nexit 0\n").unwrap();
        let mut perms = std::fs::metadata(&binary).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&binary, perms).unwrap();

        let resolution = provision(&offline_ctx(), BinaryTarget::WhisperCli).unwrap();
        assert_eq!(resolution.provenance, Provenance::OnPath);
        assert_eq!(resolution.path, Some(binary.canonicalize().unwrap()));
    }

    #[test]
    fn test_only_whisper_is_essential() {
        assert!(BinaryTarget::WhisperCli.essential());
        assert!(!BinaryTarget::LlamaServer.essential());
        assert!(!BinaryTarget::Ydotoold.essential());
        assert!(!BinaryTarget::Ydotool.essential());
    }

    #[test]
    fn test_provenance_display_is_greppable() {
        assert_eq!(Provenance::OnPath.to_string(), "on_path");
        assert_eq!(Provenance::PrebuiltDownload.to_string(), "prebuilt_download");
        assert_eq!(Provenance::SourceBuild.to_string(), "source_build");
        assert_eq!(Provenance::Unavailable.to_string(), "unavailable");
    }

    #[test]
    fn test_unavailable_resolution_is_not_resolved() {
        let res = BinaryResolution::unavailable(BinaryTarget::Ydotoold);
        assert!(!res.is_resolved());
        assert!(!res.is_valid());
        assert_eq!(res.path, None);
    }

    #[test]
    fn test_daemon_and_client_share_upstream() {
        assert_eq!(
            BinaryTarget::Ydotoold.upstream_repo(),
            BinaryTarget::Ydotool.upstream_repo()
        );
    }
}
