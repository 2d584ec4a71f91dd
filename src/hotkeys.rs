//! Hotkey helper
//!
//! Desktop hotkeys cannot be registered portably; GNOME custom
//! keybindings are manageable through gsettings, everything else gets
//! instructions. Diagnose probes the full simulated-typing chain.

use std::process::Command;

use console::style;
use tracing::debug;

use crate::error::{Result, SetupError};
use crate::provision::path_probe;
use crate::{context, paths, service};

const MEDIA_KEYS_SCHEMA: &str = "org.gnome.settings-daemon.plugins.media-keys";
const KEYBINDING_SCHEMA: &str =
    "org.gnome.settings-daemon.plugins.media-keys.custom-keybinding";

fn gsettings_get(schema: &str, path: Option<&str>, key: &str) -> Option<String> {
    let schema_arg = match path {
        Some(p) => format!("{schema}:{p}"),
        None => schema.to_string(),
    };
    let out = Command::new("gsettings")
        .args(["get", &schema_arg, key])
        .output()
        .ok()?;
    out.status
        .success()
        .then(|| String::from_utf8_lossy(&out.stdout).trim().to_string())
}

fn gsettings_set(schema_arg: &str, key: &str, value: &str) -> bool {
    Command::new("gsettings")
        .args(["set", schema_arg, key, value])
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Parse a gsettings string-array literal like `['/a/', '/b/']`
pub fn parse_string_array(raw: &str) -> Vec<String> {
    let trimmed = raw.trim();
    let inner = trimmed
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .unwrap_or("");
    inner
        .split(',')
        .filter_map(|item| {
            let item = item.trim();
            item.strip_prefix('\'')
                .and_then(|s| s.strip_suffix('\''))
                .map(str::to_string)
        })
        .collect()
}

/// Render a string array back into gsettings literal form
pub fn format_string_array(items: &[String]) -> String {
    if items.is_empty() {
        // GVariant needs the type annotation for an empty array
        return "@as []".to_string();
    }
    let quoted: Vec<String> = items.iter().map(|i| format!("'{i}'")).collect();
    format!("[{}]", quoted.join(", "))
}

fn custom_binding_paths() -> Vec<String> {
    gsettings_get(MEDIA_KEYS_SCHEMA, None, "custom-keybindings")
        .map(|raw| parse_string_array(&raw))
        .unwrap_or_default()
}

fn binding_command(path: &str) -> Option<String> {
    gsettings_get(KEYBINDING_SCHEMA, Some(path), "command")
        .map(|raw| raw.trim_matches('\'').to_string())
}

fn voxd_binding_paths() -> Vec<String> {
    custom_binding_paths()
        .into_iter()
        .filter(|path| {
            binding_command(path).is_some_and(|cmd| cmd.contains("voxd"))
        })
        .collect()
}

fn glyph(ok: bool) -> console::StyledObject<&'static str> {
    if ok {
        style("✔").green()
    } else {
        style("✘").red()
    }
}

/// Print per-desktop setup instructions
pub fn guide() {
    println!("{}", style("Hotkey setup").bold());
    println!();
    println!("GNOME:   Settings → Keyboard → Custom Shortcuts, add a shortcut");
    println!("         running 'voxd --trigger-record' on your preferred key.");
    println!("KDE:     System Settings → Shortcuts → Custom Shortcuts, new");
    println!("         Global Shortcut → Command/URL: 'voxd --trigger-record'.");
    println!("Other:   bind a key to 'voxd --trigger-record' in your");
    println!("         compositor or window manager configuration.");
    println!();
    println!("Run 'voxd-setup hotkeys diagnose' to verify the typing chain.");
}

/// Probe the whole simulated-typing chain and report each link
pub fn diagnose() -> Result<()> {
    let wayland = context::is_wayland_session();
    println!(
        "session: {}",
        if wayland { "wayland" } else { "x11 (ydotool not required)" }
    );

    let client = which::which("ydotool").ok();
    println!(
        "{} ydotool client {}",
        glyph(client.is_some()),
        client
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default()
    );

    let daemon_path = paths::managed_bin_dir()?.join("ydotoold");
    let daemon = which::which("ydotoold")
        .ok()
        .or_else(|| path_probe::is_executable_file(&daemon_path).then_some(daemon_path));
    println!(
        "{} ydotoold daemon {}",
        glyph(daemon.is_some()),
        daemon
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default()
    );

    let socket = paths::ydotool_socket_path()?;
    println!("{} socket {}", glyph(socket.exists()), socket.display());
    println!("{} input group membership", glyph(service::in_input_group()));
    println!("{} ydotoold service active", glyph(service::service_is_active()));

    if !service::in_input_group() {
        println!();
        println!("{}", style("Group membership takes effect after the next login.").yellow());
    }
    Ok(())
}

/// List GNOME custom keybindings that invoke voxd
pub fn list() -> Result<()> {
    if which::which("gsettings").is_err() {
        println!("gsettings not available; listing is GNOME-only.");
        return Ok(());
    }
    let paths = voxd_binding_paths();
    if paths.is_empty() {
        println!("No voxd keybindings registered.");
        return Ok(());
    }
    for path in paths {
        let name = gsettings_get(KEYBINDING_SCHEMA, Some(&path), "name").unwrap_or_default();
        let binding = gsettings_get(KEYBINDING_SCHEMA, Some(&path), "binding").unwrap_or_default();
        let command = binding_command(&path).unwrap_or_default();
        println!("{} {} → {}", style(name.trim_matches('\'')).bold(), binding, command);
    }
    Ok(())
}

/// Drop voxd keybindings whose command no longer exists (e.g. after an
/// uninstall that left the bindings behind); keeps working ones.
pub fn cleanup() -> Result<()> {
    if which::which("gsettings").is_err() {
        println!("gsettings not available; cleanup is GNOME-only.");
        return Ok(());
    }
    if which::which("voxd").is_ok() {
        println!("voxd is still installed; nothing stale to clean up.");
        return Ok(());
    }
    remove()
}

/// Remove every GNOME keybinding that invokes voxd
pub fn remove() -> Result<()> {
    if which::which("gsettings").is_err() {
        return Err(SetupError::CommandFailed {
            command: "gsettings".to_string(),
            reason: "not found; removal is GNOME-only".to_string(),
        });
    }
    let all = custom_binding_paths();
    let voxd: Vec<String> = voxd_binding_paths();
    if voxd.is_empty() {
        println!("No voxd keybindings to remove.");
        return Ok(());
    }
    let remaining: Vec<String> = all.into_iter().filter(|p| !voxd.contains(p)).collect();
    for path in &voxd {
        debug!("resetting keybinding at {path}");
        let schema_arg = format!("{KEYBINDING_SCHEMA}:{path}");
        for key in ["name", "command", "binding"] {
            gsettings_set(&schema_arg, key, "''");
        }
    }
    if gsettings_set(
        MEDIA_KEYS_SCHEMA,
        "custom-keybindings",
        &format_string_array(&remaining),
    ) {
        println!("Removed {} voxd keybinding(s).", voxd.len());
        Ok(())
    } else {
        Err(SetupError::CommandFailed {
            command: "gsettings set".to_string(),
            reason: "could not update custom-keybindings".to_string(),
        })
    }
}
