//! System dependency resolution
//!
//! The package catalog is declarative data, not logic: canonical names,
//! per-manager overrides and per-manager alias fallbacks. Resolution tries
//! one batch install, then per-package retries, then aliases, and only
//! aborts when a required package stays uninstallable.

use tracing::{debug, warn};

use crate::error::{Result, SetupError};
use crate::pkgmgr::{PackageManager, PackageManagerProfile};

/// One required or optional system package with distro fallbacks
#[derive(Debug, Clone, Copy)]
pub struct DependencySpec {
    /// Canonical package name (as known to apt)
    pub name: &'static str,
    /// Per-manager rename of the primary package
    pub overrides: &'static [(PackageManager, &'static str)],
    /// Per-manager fallback tried when the primary name fails to install
    pub aliases: &'static [(PackageManager, &'static str)],
    /// Required packages abort the run when unresolvable (toolchain);
    /// optional ones degrade features instead
    pub required: bool,
}

impl DependencySpec {
    /// Primary package name under the given manager
    pub fn package_for(&self, manager: PackageManager) -> &'static str {
        self.overrides
            .iter()
            .find(|(pm, _)| *pm == manager)
            .map_or(self.name, |(_, name)| *name)
    }

    /// Alias fallback under the given manager, if one is configured
    pub fn alias_for(&self, manager: PackageManager) -> Option<&'static str> {
        self.aliases
            .iter()
            .find(|(pm, _)| *pm == manager)
            .map(|(_, name)| *name)
    }
}

use PackageManager::{Dnf, Dnf5, Pacman, Zypper};

/// Package catalog for a full install run. Session type decides which
/// clipboard/typing helpers are wanted.
pub fn catalog(wayland: bool) -> Vec<DependencySpec> {
    let mut specs = vec![
        DependencySpec {
            name: "git",
            overrides: &[],
            aliases: &[],
            required: true,
        },
        DependencySpec {
            name: "cmake",
            overrides: &[],
            aliases: &[],
            required: true,
        },
        DependencySpec {
            name: "make",
            overrides: &[],
            aliases: &[],
            required: true,
        },
        // apt's metapackage; everywhere else the C++ compiler package
        DependencySpec {
            name: "build-essential",
            overrides: &[
                (Dnf5, "gcc-c++"),
                (Dnf, "gcc-c++"),
                (Pacman, "base-devel"),
                (Zypper, "gcc-c++"),
            ],
            aliases: &[(Dnf5, "gcc"), (Dnf, "gcc"), (Zypper, "gcc")],
            required: true,
        },
        DependencySpec {
            name: "ffmpeg",
            overrides: &[],
            aliases: &[(Dnf5, "ffmpeg-free"), (Dnf, "ffmpeg-free")],
            required: false,
        },
    ];
    if wayland {
        specs.push(DependencySpec {
            name: "wl-clipboard",
            overrides: &[],
            aliases: &[],
            required: false,
        });
    } else {
        specs.push(DependencySpec {
            name: "xclip",
            overrides: &[],
            aliases: &[(Pacman, "xsel"), (Zypper, "xsel")],
            required: false,
        });
        specs.push(DependencySpec {
            name: "xdotool",
            overrides: &[],
            aliases: &[],
            required: false,
        });
    }
    specs
}

/// What the resolver ended up with
#[derive(Debug, Default)]
pub struct DependencyOutcome {
    /// Packages confirmed installed (primary or alias name)
    pub satisfied: Vec<String>,
    /// Optional packages that failed after aliasing; features degrade
    pub degraded: Vec<String>,
    /// (primary, alias) pairs where the alias was the one that worked
    pub aliased: Vec<(String, String)>,
}

/// Resolve against the live package manager
pub fn resolve(
    profile: &PackageManagerProfile,
    specs: &[DependencySpec],
) -> Result<DependencyOutcome> {
    profile.refresh();
    resolve_with(profile.manager, specs, &mut |pkgs| profile.install(pkgs))
}

/// Resolution core with the install command injected, so the batch →
/// individual → alias ladder is testable without a live package manager.
pub fn resolve_with(
    manager: PackageManager,
    specs: &[DependencySpec],
    install: &mut dyn FnMut(&[&str]) -> bool,
) -> Result<DependencyOutcome> {
    let mut outcome = DependencyOutcome::default();
    let names: Vec<&str> = specs.iter().map(|s| s.package_for(manager)).collect();

    if install(&names) {
        outcome.satisfied = names.iter().map(|n| (*n).to_string()).collect();
        return Ok(outcome);
    }
    debug!("batch install failed, retrying packages individually");

    let mut failed_required = Vec::new();
    for spec in specs {
        let primary = spec.package_for(manager);
        if install(&[primary]) {
            outcome.satisfied.push(primary.to_string());
            continue;
        }
        if let Some(alias) = spec.alias_for(manager) {
            if install(&[alias]) {
                outcome.satisfied.push(alias.to_string());
                outcome
                    .aliased
                    .push((primary.to_string(), alias.to_string()));
                continue;
            }
        }
        if spec.required {
            failed_required.push(primary.to_string());
        } else {
            warn!("optional package '{primary}' could not be installed");
            outcome.degraded.push(primary.to_string());
        }
    }

    if failed_required.is_empty() {
        Ok(outcome)
    } else {
        Err(SetupError::RequiredPackagesFailed {
            packages: failed_required.join(", "),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use PackageManager::Apt;

    fn spec(name: &'static str, required: bool) -> DependencySpec {
        DependencySpec {
            name,
            overrides: &[],
            aliases: &[],
            required,
        }
    }

    #[test]
    fn test_batch_success_short_circuits() {
        let specs = [spec("git", true), spec("ffmpeg", false)];
        let mut calls = 0;
        let outcome = resolve_with(Apt, &specs, &mut |_| {
            calls += 1;
            true
        })
        .unwrap();
        assert_eq!(calls, 1);
        assert_eq!(outcome.satisfied, vec!["git", "ffmpeg"]);
        assert!(outcome.degraded.is_empty());
    }

    #[test]
    fn test_alias_fallback_counts_as_satisfied() {
        let specs = [DependencySpec {
            name: "ffmpeg",
            overrides: &[],
            aliases: &[(Apt, "ffmpeg-free")],
            required: false,
        }];
        let outcome = resolve_with(Apt, &specs, &mut |pkgs| pkgs == ["ffmpeg-free"]).unwrap();
        assert_eq!(outcome.satisfied, vec!["ffmpeg-free"]);
        assert_eq!(
            outcome.aliased,
            vec![("ffmpeg".to_string(), "ffmpeg-free".to_string())]
        );
        assert!(outcome.degraded.is_empty());
    }

    #[test]
    fn test_optional_failure_degrades_not_fatal() {
        let specs = [spec("git", true), spec("xdotool", false)];
        let outcome = resolve_with(Apt, &specs, &mut |pkgs| pkgs == ["git"]).unwrap();
        assert_eq!(outcome.satisfied, vec!["git"]);
        assert_eq!(outcome.degraded, vec!["xdotool"]);
    }

    #[test]
    fn test_required_failure_is_fatal() {
        let specs = [spec("cmake", true)];
        let err = resolve_with(Apt, &specs, &mut |_| false).unwrap_err();
        assert!(matches!(err, SetupError::RequiredPackagesFailed { .. }));
        assert!(err.to_string().contains("cmake"));
    }

    #[test]
    fn test_manager_override_applies() {
        let spec = DependencySpec {
            name: "build-essential",
            overrides: &[(PackageManager::Pacman, "base-devel")],
            aliases: &[],
            required: true,
        };
        assert_eq!(spec.package_for(PackageManager::Pacman), "base-devel");
        assert_eq!(spec.package_for(Apt), "build-essential");
    }

    #[test]
    fn test_catalog_session_split() {
        let wayland = catalog(true);
        assert!(wayland.iter().any(|s| s.name == "wl-clipboard"));
        assert!(!wayland.iter().any(|s| s.name == "xdotool"));

        let x11 = catalog(false);
        assert!(x11.iter().any(|s| s.name == "xclip"));
        assert!(x11.iter().any(|s| s.name == "xdotool"));
    }

    #[test]
    fn test_toolchain_is_required_in_catalog() {
        for name in ["git", "cmake", "make", "build-essential"] {
            assert!(
                catalog(true).iter().any(|s| s.name == name && s.required),
                "{name} should be required"
            );
        }
    }
}
