//! Package manager detection and invocation
//!
//! Probes for known package managers in a fixed priority order and wraps
//! their install/remove/refresh invocations behind one profile type, with
//! privilege elevation through sudo or pkexec.

use std::process::{Command, Stdio};

use tracing::{debug, warn};

use crate::error::{Result, SetupError};

/// Supported system package managers, in probe priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageManager {
    Apt,
    Dnf5,
    Dnf,
    Pacman,
    Zypper,
}

/// Fixed probe order: apt wins on hybrid hosts that carry several managers
pub const PROBE_ORDER: &[PackageManager] = &[
    PackageManager::Apt,
    PackageManager::Dnf5,
    PackageManager::Dnf,
    PackageManager::Pacman,
    PackageManager::Zypper,
];

impl PackageManager {
    /// Executable name probed on PATH
    pub fn command(self) -> &'static str {
        match self {
            PackageManager::Apt => "apt",
            PackageManager::Dnf5 => "dnf5",
            PackageManager::Dnf => "dnf",
            PackageManager::Pacman => "pacman",
            PackageManager::Zypper => "zypper",
        }
    }

    /// argv for a non-interactive install of the given packages
    pub fn install_args(self, packages: &[&str]) -> Vec<String> {
        let mut argv: Vec<String> = match self {
            PackageManager::Apt => vec!["apt", "install", "-y"],
            PackageManager::Dnf5 => vec!["dnf5", "install", "-y"],
            PackageManager::Dnf => vec!["dnf", "install", "-y"],
            PackageManager::Pacman => vec!["pacman", "-S", "--noconfirm", "--needed"],
            PackageManager::Zypper => vec!["zypper", "--non-interactive", "install"],
        }
        .into_iter()
        .map(String::from)
        .collect();
        argv.extend(packages.iter().map(|p| (*p).to_string()));
        argv
    }

    /// argv for a metadata refresh before the batch install
    pub fn refresh_args(self) -> Vec<String> {
        match self {
            PackageManager::Apt => vec!["apt", "update"],
            PackageManager::Dnf5 => vec!["dnf5", "makecache"],
            PackageManager::Dnf => vec!["dnf", "makecache"],
            PackageManager::Pacman => vec!["pacman", "-Sy"],
            PackageManager::Zypper => vec!["zypper", "--non-interactive", "refresh"],
        }
        .into_iter()
        .map(String::from)
        .collect()
    }

    /// argv for a non-interactive removal of the given packages
    pub fn remove_args(self, packages: &[&str]) -> Vec<String> {
        let mut argv: Vec<String> = match self {
            PackageManager::Apt => vec!["apt", "remove", "-y"],
            PackageManager::Dnf5 => vec!["dnf5", "remove", "-y"],
            PackageManager::Dnf => vec!["dnf", "remove", "-y"],
            PackageManager::Pacman => vec!["pacman", "-R", "--noconfirm"],
            PackageManager::Zypper => vec!["zypper", "--non-interactive", "remove"],
        }
        .into_iter()
        .map(String::from)
        .collect();
        argv.extend(packages.iter().map(|p| (*p).to_string()));
        argv
    }
}

impl std::fmt::Display for PackageManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.command())
    }
}

/// Detected package manager plus elevation strategy
#[derive(Debug, Clone)]
pub struct PackageManagerProfile {
    pub manager: PackageManager,
    elevation: Vec<String>,
}

impl PackageManagerProfile {
    /// Probe PATH in [`PROBE_ORDER`]; no match is fatal, every later step
    /// depends on having a manager.
    pub fn detect() -> Result<Self> {
        let manager = PROBE_ORDER
            .iter()
            .copied()
            .find(|pm| which::which(pm.command()).is_ok())
            .ok_or(SetupError::NoPackageManager)?;
        debug!("detected package manager: {manager}");
        Ok(Self {
            manager,
            elevation: elevation_prefix()?,
        })
    }

    #[cfg(test)]
    pub fn for_tests(manager: PackageManager) -> Self {
        Self {
            manager,
            elevation: Vec::new(),
        }
    }

    /// Elevation prefix for other system-mutating commands (udev, usermod)
    pub fn elevation(&self) -> &[String] {
        &self.elevation
    }

    fn run(&self, argv: &[String]) -> bool {
        let full: Vec<&str> = self
            .elevation
            .iter()
            .chain(argv.iter())
            .map(String::as_str)
            .collect();
        let Some((program, rest)) = full.split_first() else {
            return false;
        };
        debug!("running: {}", full.join(" "));
        match Command::new(program)
            .args(rest)
            .stdout(Stdio::null())
            .status()
        {
            Ok(status) => status.success(),
            Err(err) => {
                warn!("failed to spawn {program}: {err}");
                false
            }
        }
    }

    /// Refresh package metadata; failure is tolerated, the install may
    /// still hit a warm cache.
    pub fn refresh(&self) -> bool {
        self.run(&self.manager.refresh_args())
    }

    /// Install packages; returns whether the command succeeded
    pub fn install(&self, packages: &[&str]) -> bool {
        if packages.is_empty() {
            return true;
        }
        self.run(&self.manager.install_args(packages))
    }
}

/// Elevation prefix for system-mutating commands. Already-root processes
/// are rejected much earlier, so an empty prefix only happens in tests.
fn elevation_prefix() -> Result<Vec<String>> {
    if unsafe { libc::geteuid() } == 0 {
        return Ok(Vec::new());
    }
    if which::which("sudo").is_ok() {
        return Ok(vec!["sudo".to_string()]);
    }
    if which::which("pkexec").is_ok() {
        return Ok(vec!["pkexec".to_string()]);
    }
    Err(SetupError::NoElevationCommand)
}
