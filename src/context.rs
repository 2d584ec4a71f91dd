//! Run-wide setup context
//!
//! All state the installer's steps share is carried in one struct that is
//! built once at run start and passed forward, never mutated from globals.

use std::env;

use crate::cli::InstallArgs;
use crate::error::Result;
use crate::net;
use crate::pkgmgr::PackageManagerProfile;

/// Everything a step needs to know about this run
#[derive(Debug, Clone)]
pub struct SetupContext {
    pub manager: PackageManagerProfile,
    /// Reachability probe result; false short-circuits every network step
    pub online: bool,
    /// Wayland session needs the uinput daemon for simulated typing
    pub wayland: bool,
    /// Release repository coordinate for prebuilt binaries
    pub release_repo: String,
    /// Optional release tag pin; latest release when unset
    pub release_tag: Option<String>,
    pub skip_models: bool,
    pub assume_yes: bool,
}

/// Wayland detection: session type first, compositor socket as fallback
pub fn is_wayland_session() -> bool {
    if let Ok(session) = env::var("XDG_SESSION_TYPE") {
        return session.starts_with("wayland");
    }
    env::var_os("WAYLAND_DISPLAY").is_some()
}

impl SetupContext {
    /// Detect the environment and freeze it for the rest of the run
    pub fn detect(args: &InstallArgs) -> Result<Self> {
        let manager = PackageManagerProfile::detect()?;
        let online = if args.offline {
            false
        } else {
            net::probe_reachability()
        };
        Ok(Self {
            manager,
            online,
            wayland: is_wayland_session(),
            release_repo: args.bin_repo.clone(),
            release_tag: args.bin_tag.clone(),
            skip_models: args.skip_models,
            assume_yes: args.yes,
        })
    }
}
