//! XDG path helpers for voxd-managed files
//!
//! Every path the installer creates or probes is derived here, so the
//! install, uninstall and status commands agree on locations. XDG
//! environment overrides take precedence over the `dirs` defaults, which
//! also keeps integration tests hermetic (they run with a scratch HOME).

use std::env;
use std::path::PathBuf;

use crate::error::{Result, SetupError};

fn home_dir() -> Result<PathBuf> {
    env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .ok_or(SetupError::NoHomeDirectory)
}

fn xdg_dir(var: &str, fallback: &[&str]) -> Result<PathBuf> {
    if let Some(base) = env::var_os(var).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(base));
    }
    let mut path = home_dir()?;
    for part in fallback {
        path.push(part);
    }
    Ok(path)
}

/// `$XDG_DATA_HOME/voxd`, root for everything voxd-setup downloads or builds
pub fn data_dir() -> Result<PathBuf> {
    Ok(xdg_dir("XDG_DATA_HOME", &[".local", "share"])?.join("voxd"))
}

/// Managed binary directory; prebuilt and source-built binaries land here
pub fn managed_bin_dir() -> Result<PathBuf> {
    Ok(data_dir()?.join("bin"))
}

/// Whisper model directory
pub fn models_dir() -> Result<PathBuf> {
    Ok(data_dir()?.join("models"))
}

/// llama.cpp model directory
pub fn llama_models_dir() -> Result<PathBuf> {
    Ok(data_dir()?.join("llamacpp").join("models"))
}

/// Checkouts used by the source-build fallback
pub fn source_dir() -> Result<PathBuf> {
    Ok(data_dir()?.join("src"))
}

/// `$XDG_STATE_HOME/voxd`, the setup log lives here
pub fn state_dir() -> Result<PathBuf> {
    Ok(xdg_dir("XDG_STATE_HOME", &[".local", "state"])?.join("voxd"))
}

/// `~/.local/bin`, where the binary symlinks are placed
pub fn user_bin_dir() -> Result<PathBuf> {
    Ok(home_dir()?.join(".local").join("bin"))
}

/// Per-user systemd unit directory
pub fn user_systemd_dir() -> Result<PathBuf> {
    Ok(xdg_dir("XDG_CONFIG_HOME", &[".config"])?
        .join("systemd")
        .join("user"))
}

/// Application config file read by the voxd app at startup
pub fn app_config_path() -> Result<PathBuf> {
    Ok(xdg_dir("XDG_CONFIG_HOME", &[".config"])?
        .join("voxd")
        .join("config.yaml"))
}

/// Desktop entry directory (cleaned up on uninstall)
pub fn desktop_entry_dir() -> Result<PathBuf> {
    Ok(xdg_dir("XDG_DATA_HOME", &[".local", "share"])?.join("applications"))
}

/// Shell rc files that may carry the `YDOTOOL_SOCKET` export
pub fn shell_rc_files() -> Result<Vec<PathBuf>> {
    let home = home_dir()?;
    Ok(vec![home.join(".bashrc"), home.join(".zshrc")])
}

/// Socket path handed to ydotoold
pub fn ydotool_socket_path() -> Result<PathBuf> {
    Ok(home_dir()?.join(".ydotool_socket"))
}
