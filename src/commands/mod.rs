//! Command implementations

pub mod completions;
pub mod hotkeys;
pub mod install;
pub mod status;
pub mod uninstall;
pub mod version;
