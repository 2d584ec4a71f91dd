//! Error types and handling for voxd-setup
//!
//! Uses `thiserror` for error definitions and `miette` for pretty diagnostics.

use miette::Diagnostic;
use thiserror::Error;

/// Main error type for voxd-setup operations
#[derive(Error, Diagnostic, Debug)]
pub enum SetupError {
    // Environment errors
    #[error("No supported package manager found")]
    #[diagnostic(
        code(voxd_setup::env::no_package_manager),
        help("voxd-setup supports apt, dnf5, dnf, pacman and zypper")
    )]
    NoPackageManager,

    #[error("Refusing to run as root")]
    #[diagnostic(
        code(voxd_setup::env::running_as_root),
        help("Run voxd-setup as your normal desktop user; it elevates with sudo or pkexec only where needed")
    )]
    RunningAsRoot,

    #[error("No privilege elevation command available")]
    #[diagnostic(
        code(voxd_setup::env::no_elevation),
        help("Install sudo or pkexec, or install the listed packages manually and re-run")
    )]
    NoElevationCommand,

    // Dependency errors
    #[error("Required packages could not be installed: {packages}")]
    #[diagnostic(
        code(voxd_setup::deps::required_failed),
        help("Install these packages manually with your package manager and re-run voxd-setup")
    )]
    RequiredPackagesFailed { packages: String },

    // Provisioning errors
    #[error("Required binary '{target}' could not be provisioned")]
    #[diagnostic(
        code(voxd_setup::provision::exhausted),
        help("Strategies tried: {attempts}. Check the setup log for details")
    )]
    ProvisioningExhausted { target: String, attempts: String },

    #[error("Download failed: {url}")]
    #[diagnostic(code(voxd_setup::net::download_failed))]
    DownloadFailed { url: String, reason: String },

    #[error("Failed to query release metadata: {url}")]
    #[diagnostic(code(voxd_setup::net::release_metadata))]
    ReleaseMetadataFailed { url: String, reason: String },

    #[error("Git operation failed: {message}")]
    #[diagnostic(code(voxd_setup::git::operation_failed))]
    GitOperationFailed { message: String },

    #[error("Build failed for '{target}': {reason}")]
    #[diagnostic(
        code(voxd_setup::build::failed),
        help("Make sure the compiler toolchain (gcc, make, cmake) is installed")
    )]
    BuildFailed { target: String, reason: String },

    #[error("Built binary '{name}' not found under {dir}")]
    #[diagnostic(code(voxd_setup::build::binary_missing))]
    BuiltBinaryMissing { name: String, dir: String },

    // Command execution errors
    #[error("Command failed: {command}: {reason}")]
    #[diagnostic(code(voxd_setup::exec::command_failed))]
    CommandFailed { command: String, reason: String },

    // Configuration errors
    #[error("Failed to parse configuration file: {path}")]
    #[diagnostic(code(voxd_setup::config::parse_failed))]
    ConfigParseFailed { path: String, reason: String },

    #[error("Failed to write file: {path}")]
    #[diagnostic(code(voxd_setup::fs::write_failed))]
    FileWriteFailed { path: String, reason: String },

    #[error("Could not determine the user home directory")]
    #[diagnostic(code(voxd_setup::fs::no_home))]
    NoHomeDirectory,

    // Generic wrappers
    #[error("I/O error: {0}")]
    #[diagnostic(code(voxd_setup::io))]
    Io(#[from] std::io::Error),
}

impl From<git2::Error> for SetupError {
    fn from(err: git2::Error) -> Self {
        SetupError::GitOperationFailed {
            message: err.message().to_string(),
        }
    }
}

impl From<serde_yaml::Error> for SetupError {
    fn from(err: serde_yaml::Error) -> Self {
        SetupError::ConfigParseFailed {
            path: String::new(),
            reason: err.to_string(),
        }
    }
}

/// Convenience result type for voxd-setup operations
pub type Result<T> = std::result::Result<T, SetupError>;
