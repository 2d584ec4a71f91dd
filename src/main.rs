//! voxd-setup - idempotent bootstrap for the VOXD voice-dictation app
//!
//! Detects the system package manager, resolves dependencies, provisions
//! the speech-engine, LLM-server and input-simulation binaries through a
//! reuse → prebuilt → source-build fallback chain, configures the
//! per-user typing daemon, and reports the resulting state. Safe to
//! re-run at any time.

use clap::Parser;

mod appconfig;
mod cli;
mod commands;
mod context;
mod cpu;
mod deps;
mod error;
mod hotkeys;
mod linker;
mod logging;
mod net;
mod paths;
mod pkgmgr;
mod progress;
mod provision;
mod report;
mod retry;
mod service;

use cli::{Cli, Commands};
use error::{Result, SetupError};

/// System-mutating commands refuse to run as root: the install targets
/// the invoking user's home and elevates per-command where needed.
fn check_not_root() -> Result<()> {
    if unsafe { libc::geteuid() } == 0 {
        return Err(SetupError::RunningAsRoot);
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let command = cli.command.unwrap_or_else(|| {
        // Bare invocation is a full install run
        Commands::Install(cli::InstallArgs::default())
    });

    let needs_user_context = matches!(command, Commands::Install(_) | Commands::Uninstall(_));
    if needs_user_context {
        if let Err(e) = check_not_root() {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }

    let result = match command {
        Commands::Install(args) => commands::install::run(args),
        Commands::Uninstall(args) => commands::uninstall::run(args),
        Commands::Status => commands::status::run(),
        Commands::Hotkeys(args) => commands::hotkeys::run(args),
        Commands::Version => commands::version::run(),
        Commands::Completions(args) => commands::completions::run(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
