//! Idempotency report
//!
//! Re-probes the final state of every managed resource from scratch and
//! prints one line per resource in a fixed, greppable format. Pure
//! observation: no side effects, never fails the run.

use std::fmt;
use std::path::PathBuf;

use console::style;

use crate::provision::models;
use crate::provision::path_probe;
use crate::{context, paths, service};

/// Probe result for one managed resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Present,
    Missing,
    Degraded,
    /// Not applicable in this environment (e.g. ydotool on X11)
    Skipped,
}

impl fmt::Display for Presence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Presence::Present => "present",
            Presence::Missing => "missing",
            Presence::Degraded => "degraded",
            Presence::Skipped => "skipped",
        })
    }
}

/// One line of the final report
#[derive(Debug, Clone)]
pub struct ResourceReport {
    pub resource: &'static str,
    pub status: Presence,
    pub path: Option<PathBuf>,
}

impl ResourceReport {
    /// Fixed format: `resource=<name> status=<status> path=<path|->`
    pub fn format_line(&self) -> String {
        let path = self
            .path
            .as_ref()
            .map_or_else(|| "-".to_string(), |p| p.display().to_string());
        format!(
            "resource={} status={} path={}",
            self.resource, self.status, path
        )
    }
}

fn probe_file(resource: &'static str, path: PathBuf) -> ResourceReport {
    let status = if path.is_file() {
        Presence::Present
    } else {
        Presence::Missing
    };
    ResourceReport {
        resource,
        status,
        path: Some(path),
    }
}

fn probe_binary(resource: &'static str, name: &str, wanted: bool) -> ResourceReport {
    if !wanted {
        return ResourceReport {
            resource,
            status: Presence::Skipped,
            path: None,
        };
    }
    // Symlinked location first, managed dir second, PATH last
    let candidates = [
        paths::user_bin_dir().map(|d| d.join(name)),
        paths::managed_bin_dir().map(|d| d.join(name)),
    ];
    for candidate in candidates.into_iter().flatten() {
        if path_probe::is_executable_file(&candidate) {
            return ResourceReport {
                resource,
                status: Presence::Present,
                path: Some(candidate),
            };
        }
    }
    if let Ok(found) = which::which(name) {
        return ResourceReport {
            resource,
            status: Presence::Present,
            path: Some(found),
        };
    }
    ResourceReport {
        resource,
        status: Presence::Missing,
        path: None,
    }
}

/// Probe every managed resource. The `wayland` flag decides whether the
/// input-simulation resources count as applicable.
pub fn gather(wayland: bool) -> Vec<ResourceReport> {
    let mut reports = Vec::new();

    if let Ok(config) = paths::app_config_path() {
        reports.push(probe_file("app-config", config));
    }
    if let Ok(bin_dir) = paths::managed_bin_dir() {
        let status = if bin_dir.is_dir() {
            Presence::Present
        } else {
            Presence::Missing
        };
        reports.push(ResourceReport {
            resource: "managed-bin-dir",
            status,
            path: Some(bin_dir),
        });
    }

    reports.push(probe_binary("whisper-cli", "whisper-cli", true));
    reports.push(probe_binary("llama-server", "llama-server", true));
    reports.push(probe_binary("ydotoold", "ydotoold", wayland));
    reports.push(probe_binary("ydotool", "ydotool", wayland));

    if let Ok(dir) = paths::models_dir() {
        reports.push(probe_file("whisper-model", dir.join(models::WHISPER_MODEL)));
    }
    if let Ok(dir) = paths::llama_models_dir() {
        reports.push(probe_file("llama-model", dir.join(models::LLAMA_MODEL)));
    }

    let service_status = if !wayland {
        Presence::Skipped
    } else if service::service_is_active() {
        Presence::Present
    } else {
        Presence::Degraded
    };
    reports.push(ResourceReport {
        resource: "ydotoold-service",
        status: service_status,
        path: None,
    });

    let group_status = if !wayland {
        Presence::Skipped
    } else if service::in_input_group() {
        Presence::Present
    } else {
        Presence::Degraded
    };
    reports.push(ResourceReport {
        resource: "input-group",
        status: group_status,
        path: None,
    });

    let udev_path = PathBuf::from(service::UDEV_RULE_PATH);
    let udev_status = if !wayland {
        Presence::Skipped
    } else if udev_path.is_file() {
        Presence::Present
    } else {
        Presence::Missing
    };
    reports.push(ResourceReport {
        resource: "udev-rule",
        status: udev_status,
        path: Some(udev_path),
    });

    reports
}

/// Print the report with status-colored lines
pub fn print(reports: &[ResourceReport]) {
    println!();
    println!("{}", style("Setup state:").bold());
    for report in reports {
        let line = report.format_line();
        match report.status {
            Presence::Present => println!("  {line}"),
            Presence::Missing => println!("  {}", style(line).red()),
            Presence::Degraded => println!("  {}", style(line).yellow()),
            Presence::Skipped => println!("  {}", style(line).dim()),
        }
    }
}

/// Convenience wrapper used by the status command
pub fn run() {
    let reports = gather(context::is_wayland_session());
    print(&reports);
}
