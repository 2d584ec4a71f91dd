//! Prebuilt release resolution
//!
//! Queries the release-metadata API for the configured prebuilts
//! repository, picks the asset matching the detected CPU profile,
//! downloads it, verifies it against the published SHA256 manifest when
//! one exists, and extracts the binary into the managed bin dir.
//!
//! A checksum mismatch discards the archive and abandons only the
//! prebuilt path; the caller falls through to the source build. An
//! advertised-but-failing checksum never installs.

use std::fs::{self, File};
use std::io::{Read, Write};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tar::Archive;
use tracing::{debug, info, warn};

use crate::context::SetupContext;
use crate::cpu;
use crate::error::{Result, SetupError};
use crate::progress;
use crate::retry;
use crate::{net, paths};

use super::BinaryTarget;

#[derive(Debug, Deserialize)]
struct Release {
    assets: Vec<Asset>,
}

#[derive(Debug, Deserialize)]
struct Asset {
    name: String,
    browser_download_url: String,
}

fn release_api_url(repo: &str, tag: Option<&str>) -> String {
    match tag {
        Some(tag) => format!("https://api.github.com/repos/{repo}/releases/tags/{tag}"),
        None => format!("https://api.github.com/repos/{repo}/releases/latest"),
    }
}

fn fetch_release(
    client: &reqwest::blocking::Client,
    repo: &str,
    tag: Option<&str>,
) -> Result<Release> {
    let url = release_api_url(repo, tag);
    let make_err = |reason: String| SetupError::ReleaseMetadataFailed {
        url: url.clone(),
        reason,
    };
    let body = client
        .get(&url)
        .send()
        .map_err(|e| make_err(e.to_string()))?
        .error_for_status()
        .map_err(|e| make_err(e.to_string()))?
        .text()
        .map_err(|e| make_err(e.to_string()))?;
    serde_json::from_str(&body).map_err(|e| make_err(e.to_string()))
}

fn find_asset<'a>(release: &'a Release, name: &str) -> Option<&'a Asset> {
    release.assets.iter().find(|a| a.name == name)
}

/// Download `url` into `dest` with bounded retries and a progress bar
pub fn download_to(
    client: &reqwest::blocking::Client,
    url: &str,
    dest: &Path,
    label: &str,
) -> Result<()> {
    retry::with_backoff(retry::DEFAULT_ATTEMPTS, retry::DEFAULT_BACKOFF, |attempt| {
        if attempt > 1 {
            debug!("retrying download ({attempt}): {url}");
        }
        let mut response = client
            .get(url)
            .send()
            .and_then(reqwest::blocking::Response::error_for_status)
            .map_err(|e| SetupError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
        let bar = progress::download_bar(response.content_length(), label);
        // Write to a sibling temp file, rename only on full success
        let tmp = dest.with_extension("part");
        let mut file = File::create(&tmp)?;
        let mut buf = [0u8; 1 << 16];
        loop {
            let n = response.read(&mut buf).map_err(|e| SetupError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
            if n == 0 {
                break;
            }
            file.write_all(&buf[..n])?;
            bar.inc(n as u64);
        }
        bar.finish_and_clear();
        fs::rename(&tmp, dest)?;
        Ok(())
    })
}

/// Hex-encoded sha256 of a file
pub fn sha256_file(path: &Path) -> Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    std::io::copy(&mut file, &mut hasher)?;
    Ok(format!("{:x}", hasher.finalize()))
}

/// Pull the expected digest for `asset_name` out of a SHA256SUMS manifest
pub fn expected_digest(manifest: &str, asset_name: &str) -> Option<String> {
    manifest.lines().find_map(|line| {
        let mut parts = line.split_whitespace();
        let digest = parts.next()?;
        let name = parts.next()?;
        (name == asset_name && parts.next().is_none()).then(|| digest.to_lowercase())
    })
}

/// Extract a tar.gz archive into `dest_dir`, returning the path of the
/// first extracted file named in `wanted`.
pub fn extract_tar_gz(archive: &Path, dest_dir: &Path, wanted: &[&str]) -> Result<Option<PathBuf>> {
    fs::create_dir_all(dest_dir)?;
    let file = File::open(archive)?;
    let mut tar = Archive::new(GzDecoder::new(file));
    let mut found = None;
    for entry in tar.entries()? {
        let mut entry = entry?;
        let entry_path = entry.path()?.into_owned();
        let Some(file_name) = entry_path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let out_path = dest_dir.join(file_name);
        entry.unpack(&out_path)?;
        if found.is_none() && wanted.contains(&file_name) {
            found = Some(out_path);
        }
    }
    Ok(found)
}

fn make_executable(path: &Path) -> Result<()> {
    let mut perms = fs::metadata(path)?.permissions();
    perms.set_mode(0o755);
    fs::set_permissions(path, perms)?;
    Ok(())
}

/// Decide whether `archive` passes the given checksum manifest text.
///
/// An asset the manifest does not list verifies trivially (nothing was
/// advertised for it); a listed-but-different digest rejects.
pub fn archive_passes_manifest(manifest: &str, asset_name: &str, archive: &Path) -> Result<bool> {
    let Some(expected) = expected_digest(manifest, asset_name) else {
        debug!("asset '{asset_name}' not listed in manifest, skipping verification");
        return Ok(true);
    };
    let actual = sha256_file(archive)?;
    if actual == expected {
        info!("checksum verified for {asset_name}");
        Ok(true)
    } else {
        warn!("checksum mismatch for {asset_name}: expected {expected}, got {actual}");
        Ok(false)
    }
}

/// Verify `archive` against the release's checksum manifest, if any.
/// A release without a manifest asset verifies trivially.
fn verify_against_manifest(
    client: &reqwest::blocking::Client,
    release: &Release,
    profile: &cpu::CpuProfile,
    asset_name: &str,
    archive: &Path,
) -> Result<bool> {
    let Some(sums_name) = profile.sums_asset_name() else {
        return Ok(true);
    };
    let Some(sums_asset) = find_asset(release, &sums_name) else {
        debug!("no checksum manifest '{sums_name}' in release, skipping verification");
        return Ok(true);
    };
    let manifest = client
        .get(&sums_asset.browser_download_url)
        .send()
        .and_then(reqwest::blocking::Response::error_for_status)
        .and_then(reqwest::blocking::Response::text)
        .map_err(|e| SetupError::DownloadFailed {
            url: sums_asset.browser_download_url.clone(),
            reason: e.to_string(),
        })?;
    archive_passes_manifest(&manifest, asset_name, archive)
}

/// Fetch a prebuilt binary for `target` into the managed bin dir.
///
/// `Ok(None)` means the prebuilt path does not apply (no matching asset
/// for this CPU, or the archive failed verification) and the caller
/// should continue to the next resolution state.
pub fn fetch_prebuilt(ctx: &SetupContext, target: BinaryTarget) -> Result<Option<PathBuf>> {
    let profile = cpu::detect();
    let Some(suffix) = profile.asset_suffix() else {
        debug!("no prebuilt tier for this CPU, skipping prebuilt resolution");
        return Ok(None);
    };
    // ydotool archives carry no CPU tier, only the architecture
    let asset_name = match target {
        BinaryTarget::Ydotoold | BinaryTarget::Ydotool => format!(
            "{}_linux_{}.tar.gz",
            target.binary_name(),
            profile.arch.as_asset_str()
        ),
        _ => format!("{}_linux_{}.tar.gz", target.binary_name(), suffix),
    };

    let client = net::client();
    let release = fetch_release(&client, &ctx.release_repo, ctx.release_tag.as_deref())?;
    let Some(asset) = find_asset(&release, &asset_name) else {
        debug!("release has no asset '{asset_name}'");
        return Ok(None);
    };

    let staging = tempfile::tempdir()?;
    let archive = staging.path().join(&asset_name);
    download_to(&client, &asset.browser_download_url, &archive, &asset_name)?;

    if !verify_against_manifest(&client, &release, &profile, &asset_name, &archive)? {
        // Discard and abandon the prebuilt path; never install unverified
        // content when a checksum was advertised.
        drop(staging);
        return Ok(None);
    }

    let bin_dir = paths::managed_bin_dir()?;
    let extracted = extract_tar_gz(&archive, &bin_dir, &[target.binary_name()])?;
    match extracted {
        Some(path) => {
            make_executable(&path)?;
            Ok(Some(path))
        }
        None => {
            warn!("archive '{asset_name}' did not contain {}", target.binary_name());
            Ok(None)
        }
    }
}
