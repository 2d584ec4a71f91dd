//! Uninstall command implementation
//!
//! Explicit removal of everything the installer created. Only symlinks
//! that point into the managed directory are removed from `~/.local/bin`;
//! anything else there is not ours. Missing pieces are fine, uninstall
//! after a partial install must still succeed.

use std::fs;
use std::path::Path;
use std::process::{Command, Stdio};

use console::style;
use tracing::debug;

use crate::cli::UninstallArgs;
use crate::error::Result;
use crate::{paths, service};

const MANAGED_BINARIES: &[&str] = &["whisper-cli", "llama-server", "ydotoold", "ydotool"];

pub fn run(args: UninstallArgs) -> Result<()> {
    if !args.yes && console::user_attended() {
        let confirmed = inquire::Confirm::new("Remove everything voxd-setup installed?")
            .with_default(false)
            .prompt()
            .unwrap_or(false);
        if !confirmed {
            println!("Aborted.");
            return Ok(());
        }
    }

    stop_service();
    remove_symlinks()?;
    remove_dir("managed binaries", &paths::data_dir()?.join("bin"))?;
    remove_dir("source checkouts", &paths::source_dir()?)?;
    remove_unit_file()?;
    remove_desktop_entries()?;
    remove_file("app config", &paths::app_config_path()?)?;

    if args.purge {
        remove_dir("whisper models", &paths::models_dir()?)?;
        remove_dir("llama models", &paths::llama_models_dir()?)?;
        remove_dir("data directory", &paths::data_dir()?)?;
    } else {
        println!(
            "  {}",
            style("model files kept; run with --purge to remove them").dim()
        );
    }

    println!("{} uninstall complete", style("✔").green());
    println!(
        "  {}",
        style("'input' group membership and the udev rule were left in place").dim()
    );
    Ok(())
}

fn stop_service() {
    for action in ["stop", "disable"] {
        let _ = Command::new("systemctl")
            .args(["--user", action, service::SERVICE_NAME])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();
    }
}

/// Remove our symlinks from `~/.local/bin`, leaving user files alone
fn remove_symlinks() -> Result<()> {
    let bin_dir = paths::user_bin_dir()?;
    let managed_dir = paths::managed_bin_dir()?;
    for name in MANAGED_BINARIES {
        let link = bin_dir.join(name);
        let Ok(meta) = fs::symlink_metadata(&link) else {
            continue;
        };
        if !meta.file_type().is_symlink() {
            debug!("{} is not a symlink, leaving it", link.display());
            continue;
        }
        let points_into_managed = fs::read_link(&link)
            .map(|target| target.starts_with(&managed_dir))
            .unwrap_or(false);
        // Dangling links into the managed dir are ours too
        if points_into_managed {
            fs::remove_file(&link)?;
            println!("  removed symlink {}", link.display());
        }
    }
    Ok(())
}

fn remove_unit_file() -> Result<()> {
    let unit = paths::user_systemd_dir()?.join(service::SERVICE_NAME);
    remove_file("service unit", &unit)?;
    let _ = Command::new("systemctl")
        .args(["--user", "daemon-reload"])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();
    Ok(())
}

fn remove_desktop_entries() -> Result<()> {
    let apps = paths::desktop_entry_dir()?;
    for mode in ["gui", "tray", "flux"] {
        remove_file("desktop entry", &apps.join(format!("voxd-{mode}.desktop")))?;
    }
    Ok(())
}

fn remove_file(label: &str, path: &Path) -> Result<()> {
    if path.is_file() || fs::symlink_metadata(path).is_ok() {
        fs::remove_file(path)?;
        println!("  removed {label} {}", path.display());
    }
    Ok(())
}

fn remove_dir(label: &str, path: &Path) -> Result<()> {
    if path.is_dir() {
        fs::remove_dir_all(path)?;
        println!("  removed {label} {}", path.display());
    }
    Ok(())
}
