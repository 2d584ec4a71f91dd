//! Install command implementation
//!
//! The full bootstrap, strictly sequential:
//! 1. Detect the package manager (fatal when none)
//! 2. Probe network reachability once; offline skips all network steps
//! 3. Resolve system dependencies (batch → individual → alias)
//! 4. Provision binaries through the fallback chain and symlink them
//! 5. Configure the typing daemon service (Wayland only)
//! 6. Ensure model files
//! 7. Persist resolved paths into the app config
//! 8. Print the idempotency report
//!
//! Every step tolerates re-invocation after a partial prior run.

use tracing::info;

use crate::cli::InstallArgs;
use crate::context::SetupContext;
use crate::error::Result;
use crate::linker::{self, LinkOutcome};
use crate::progress::{self, Step};
use crate::provision::{self, BinaryResolution, BinaryTarget, models};
use crate::{appconfig, deps, paths, report, service};

pub fn run(args: InstallArgs) -> Result<()> {
    let step = Step::start("Detecting package manager");
    let ctx = match SetupContext::detect(&args) {
        Ok(ctx) => {
            step.done_with(&format!("({})", ctx.manager.manager));
            ctx
        }
        Err(err) => {
            step.fail();
            return Err(err);
        }
    };
    if !ctx.online {
        progress::note("no connectivity; prebuilt, source-build and model steps will be skipped");
    }

    install_dependencies(&ctx)?;

    let whisper = provision_and_link(&ctx, BinaryTarget::WhisperCli)?;
    let llama = provision_and_link(&ctx, BinaryTarget::LlamaServer)?;

    let mut daemon = None;
    if ctx.wayland {
        let resolved = provision_and_link(&ctx, BinaryTarget::Ydotoold)?;
        provision_and_link(&ctx, BinaryTarget::Ydotool)?;
        if resolved.is_resolved() {
            daemon = resolved.path.clone();
        }
    } else {
        progress::note("X11 session: input-simulation daemon not required");
    }

    if let Some(daemon_path) = daemon {
        let step = Step::start("Configuring typing daemon service");
        match service::configure(&ctx.manager, &daemon_path) {
            Ok(outcome) if outcome.active => {
                if outcome.used_group_fallback {
                    step.done_with("(via sg fallback)");
                } else {
                    step.done();
                }
                if outcome.needs_relogin {
                    progress::warn_line(
                        "input group membership takes effect after the next login",
                    );
                }
            }
            Ok(_) => {
                step.warn("service not running; log out and back in, then re-run voxd-setup");
            }
            Err(err) => {
                // Non-fatal per the error taxonomy: typing degrades
                step.warn(&format!("service configuration failed: {err}"));
            }
        }
    }

    let (whisper_model, llama_model) = ensure_models(&ctx, &llama)?;

    persist_config(&whisper, &llama, whisper_model, llama_model)?;

    report::print(&report::gather(ctx.wayland));
    Ok(())
}

fn install_dependencies(ctx: &SetupContext) -> Result<()> {
    if !ctx.assume_yes && console::user_attended() {
        let confirmed = inquire::Confirm::new(
            "Install system packages with elevated privileges?",
        )
        .with_default(true)
        .prompt()
        .unwrap_or(false);
        if !confirmed {
            progress::warn_line(
                "skipping system packages; builds may fail if the toolchain is missing",
            );
            return Ok(());
        }
    }

    let step = Step::start("Installing system dependencies");
    let catalog = deps::catalog(ctx.wayland);
    match deps::resolve(&ctx.manager, &catalog) {
        Ok(outcome) => {
            for (primary, alias) in &outcome.aliased {
                info!("package '{primary}' satisfied via alias '{alias}'");
            }
            if outcome.degraded.is_empty() {
                step.done();
            } else {
                step.warn(&format!(
                    "optional packages unavailable: {}",
                    outcome.degraded.join(", ")
                ));
            }
            Ok(())
        }
        Err(err) => {
            step.fail();
            Err(err)
        }
    }
}

/// Provision one target and place its symlink in `~/.local/bin`
fn provision_and_link(ctx: &SetupContext, target: BinaryTarget) -> Result<BinaryResolution> {
    let step = Step::start(&format!("Resolving {}", target.binary_name()));
    let resolution = match provision::provision(ctx, target) {
        Ok(resolution) => resolution,
        Err(err) => {
            step.fail();
            return Err(err);
        }
    };

    let Some(ref path) = resolution.path else {
        step.warn(target.degradation_notice());
        return Ok(resolution);
    };

    let link = paths::user_bin_dir()?.join(target.binary_name());
    match linker::ensure_symlink(path, &link)? {
        LinkOutcome::RefusedOccupied => {
            step.warn(&format!("{} exists and is not a symlink; left untouched", link.display()));
        }
        LinkOutcome::Created | LinkOutcome::AlreadyLinked | LinkOutcome::SkippedSelfLoop => {
            step.done_with(&format!("({})", resolution.provenance));
        }
    }
    Ok(resolution)
}

fn ensure_models(
    ctx: &SetupContext,
    llama: &BinaryResolution,
) -> Result<(Option<std::path::PathBuf>, Option<std::path::PathBuf>)> {
    if ctx.skip_models || !ctx.online {
        if ctx.skip_models {
            progress::note("model downloads skipped (--skip-models)");
        }
        return Ok((None, None));
    }

    let step = Step::start("Ensuring whisper model");
    let whisper_model = models::ensure_whisper_model()?;
    match whisper_model {
        Some(_) => step.done(),
        None => step.warn("download failed; transcription needs a model file"),
    }

    let mut llama_model = None;
    if llama.is_resolved() {
        let step = Step::start("Ensuring AI post-processing model");
        llama_model = models::ensure_llama_model()?;
        match llama_model {
            Some(_) => step.done(),
            None => step.warn("download failed; AI post-processing stays disabled"),
        }
    }
    Ok((whisper_model, llama_model))
}

/// Leave absolute paths for the app to pick up at its own startup
fn persist_config(
    whisper: &BinaryResolution,
    llama: &BinaryResolution,
    whisper_model: Option<std::path::PathBuf>,
    llama_model: Option<std::path::PathBuf>,
) -> Result<()> {
    let mut updates: Vec<(&str, String)> = Vec::new();
    if let Some(ref path) = whisper.path {
        updates.push((appconfig::KEY_WHISPER_BINARY, path.display().to_string()));
    }
    if let Some(ref path) = llama.path {
        updates.push((appconfig::KEY_LLAMA_SERVER, path.display().to_string()));
    }
    if let Some(path) = whisper_model {
        updates.push((appconfig::KEY_WHISPER_MODEL, path.display().to_string()));
    }
    if let Some(path) = llama_model {
        updates.push((appconfig::KEY_LLAMA_MODEL, path.display().to_string()));
    }
    if updates.is_empty() {
        return Ok(());
    }
    let step = Step::start("Writing app configuration");
    match appconfig::persist(&updates) {
        Ok(()) => {
            step.done();
            Ok(())
        }
        Err(err) => {
            step.fail();
            Err(err)
        }
    }
}
