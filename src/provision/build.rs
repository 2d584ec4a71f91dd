//! Source-build fallback
//!
//! Last rung of the resolution chain: clone the upstream repository,
//! configure with cmake (optional subcomponents off, to keep the
//! dependency footprint down) and build with the available parallelism,
//! then copy the produced binary into the managed bin dir.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::{debug, info};
use walkdir::WalkDir;

use crate::error::{Result, SetupError};
use crate::paths;
use crate::provision::path_probe;

use super::BinaryTarget;

/// cmake configure flags per target: release build, docs/tests/examples
/// trimmed to what produces the one binary we need.
fn configure_flags(target: BinaryTarget) -> Vec<&'static str> {
    let mut flags = vec!["-DCMAKE_BUILD_TYPE=Release"];
    match target {
        BinaryTarget::WhisperCli => {
            flags.push("-DWHISPER_BUILD_TESTS=OFF");
        }
        BinaryTarget::LlamaServer => {
            flags.push("-DLLAMA_BUILD_TESTS=OFF");
            flags.push("-DLLAMA_BUILD_EXAMPLES=OFF");
            flags.push("-DLLAMA_BUILD_SERVER=ON");
        }
        BinaryTarget::Ydotoold | BinaryTarget::Ydotool => {
            // scdoc man pages are the only optional subcomponent
            flags.push("-DBUILD_DOCS=OFF");
        }
    }
    flags
}

fn checkout_name(target: BinaryTarget) -> &'static str {
    match target {
        BinaryTarget::WhisperCli => "whisper.cpp",
        BinaryTarget::LlamaServer => "llama.cpp",
        BinaryTarget::Ydotoold | BinaryTarget::Ydotool => "ydotool",
    }
}

fn run_step(target: BinaryTarget, dir: &Path, program: &str, args: &[&str]) -> Result<()> {
    debug!("[{target}] {} {}", program, args.join(" "));
    let status = Command::new(program)
        .args(args)
        .current_dir(dir)
        .stdout(Stdio::null())
        .status()
        .map_err(|e| SetupError::CommandFailed {
            command: program.to_string(),
            reason: e.to_string(),
        })?;
    if status.success() {
        Ok(())
    } else {
        Err(SetupError::BuildFailed {
            target: target.binary_name().to_string(),
            reason: format!("{program} exited with {status}"),
        })
    }
}

/// Clone the upstream repo, or reuse an existing checkout from a prior
/// partial run.
fn ensure_checkout(target: BinaryTarget) -> Result<PathBuf> {
    let checkout = paths::source_dir()?.join(checkout_name(target));
    if checkout.join(".git").is_dir() {
        debug!("reusing existing checkout at {}", checkout.display());
        return Ok(checkout);
    }
    fs::create_dir_all(paths::source_dir()?)?;
    info!("cloning {} into {}", target.upstream_repo(), checkout.display());
    git2::Repository::clone(target.upstream_repo(), &checkout)?;
    Ok(checkout)
}

/// Locate the built binary under the build tree
fn find_built_binary(build_dir: &Path, name: &str) -> Option<PathBuf> {
    WalkDir::new(build_dir)
        .into_iter()
        .filter_map(std::result::Result::ok)
        .map(walkdir::DirEntry::into_path)
        .find(|p| {
            p.file_name().and_then(|n| n.to_str()) == Some(name)
                && path_probe::is_executable_file(p)
        })
}

/// Clone, configure, build and install one target into the managed bin dir
pub fn build_from_source(target: BinaryTarget) -> Result<PathBuf> {
    let checkout = ensure_checkout(target)?;
    let build_dir = checkout.join("build");

    let mut configure = vec!["-S", ".", "-B", "build"];
    configure.extend(configure_flags(target));
    run_step(target, &checkout, "cmake", &configure)?;

    let jobs = num_cpus::get().to_string();
    run_step(
        target,
        &checkout,
        "cmake",
        &["--build", "build", "--config", "Release", "-j", &jobs],
    )?;

    let name = target.binary_name();
    let built = find_built_binary(&build_dir, name).ok_or_else(|| {
        SetupError::BuiltBinaryMissing {
            name: name.to_string(),
            dir: build_dir.display().to_string(),
        }
    })?;

    let bin_dir = paths::managed_bin_dir()?;
    fs::create_dir_all(&bin_dir)?;
    let dest = bin_dir.join(name);
    fs::copy(&built, &dest)?;
    let mut perms = fs::metadata(&dest)?.permissions();
    use std::os::unix::fs::PermissionsExt;
    perms.set_mode(0o755);
    fs::set_permissions(&dest, perms)?;
    Ok(dest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    #[test]
    fn test_configure_flags_trim_extras() {
        let whisper = configure_flags(BinaryTarget::WhisperCli);
        assert!(whisper.contains(&"-DWHISPER_BUILD_TESTS=OFF"));

        let llama = configure_flags(BinaryTarget::LlamaServer);
        assert!(llama.contains(&"-DLLAMA_BUILD_SERVER=ON"));
        assert!(llama.contains(&"-DLLAMA_BUILD_EXAMPLES=OFF"));

        let ydotool = configure_flags(BinaryTarget::Ydotoold);
        assert!(ydotool.contains(&"-DBUILD_DOCS=OFF"));
    }

    #[test]
    fn test_all_targets_build_release() {
        for target in [
            BinaryTarget::WhisperCli,
            BinaryTarget::LlamaServer,
            BinaryTarget::Ydotoold,
        ] {
            assert!(configure_flags(target).contains(&"-DCMAKE_BUILD_TYPE=Release"));
        }
    }

    #[test]
    fn test_find_built_binary_requires_exec_bit() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("bin");
        fs::create_dir_all(&nested).unwrap();

        let plain = nested.join("whisper-cli");
        fs::write(&plain, "not executable").unwrap();
        assert!(find_built_binary(temp.path(), "whisper-cli").is_none());

        let mut perms = fs::metadata(&plain).unwrap().permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&plain, perms).unwrap();
        assert_eq!(
            find_built_binary(temp.path(), "whisper-cli").unwrap(),
            plain
        );
    }
}
