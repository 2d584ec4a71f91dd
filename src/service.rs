//! Service and permission configuration for the input-simulation daemon
//!
//! Ensures the `input` group membership and the uinput udev rule, writes
//! the per-user ydotoold systemd unit (rewritten each run in case the
//! binary moved), and starts it with a liveness-checked retry loop plus a
//! group-context fallback. The final reported state is the observed one,
//! never the assumed one.

use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::error::{Result, SetupError};
use crate::retry;
use crate::{paths, pkgmgr};

pub const SERVICE_NAME: &str = "ydotoold.service";

/// udev rule granting the `input` group access to /dev/uinput
pub const UDEV_RULE_PATH: &str = "/etc/udev/rules.d/99-uinput.rules";
pub const UDEV_RULE: &str =
    "KERNEL==\"uinput\", GROUP=\"input\", MODE=\"0660\", OPTIONS+=\"static_node=uinput\"\n";

/// Final state of the service configuration step
#[derive(Debug, Clone)]
pub struct ServiceOutcome {
    /// systemd reports the unit active
    pub active: bool,
    /// Daemon was launched under `sg input` because systemd start failed
    pub used_group_fallback: bool,
    /// Group membership was added this run; takes effect next login
    pub needs_relogin: bool,
}

fn run_ok(program: &str, args: &[&str]) -> bool {
    debug!("running: {program} {}", args.join(" "));
    Command::new(program)
        .args(args)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

fn command_output(program: &str, args: &[&str]) -> Option<String> {
    let out = Command::new(program).args(args).output().ok()?;
    out.status
        .success()
        .then(|| String::from_utf8_lossy(&out.stdout).into_owned())
}

/// Check whether the invoking user is in the `input` group
pub fn in_input_group() -> bool {
    command_output("id", &["-nG"])
        .map(|groups| groups.split_whitespace().any(|g| g == "input"))
        .unwrap_or(false)
}

fn current_user() -> Option<String> {
    std::env::var("USER")
        .ok()
        .or_else(|| command_output("id", &["-un"]).map(|s| s.trim().to_string()))
}

/// Ensure the `input` group exists and the user is a member.
///
/// Membership added here is only effective after the next login; that is
/// documented to the user, not worked around.
fn ensure_group_membership(elevate: &[String]) -> Result<bool> {
    if in_input_group() {
        return Ok(false);
    }
    let Some(user) = current_user() else {
        warn!("could not determine the invoking user, skipping group setup");
        return Ok(false);
    };
    let mut argv: Vec<String> = elevate.to_vec();
    argv.extend(
        ["groupadd", "-f", "input"]
            .into_iter()
            .map(String::from),
    );
    run_elevated(&argv);

    let mut argv: Vec<String> = elevate.to_vec();
    argv.extend(
        ["usermod", "-aG", "input", user.as_str()]
            .into_iter()
            .map(String::from),
    );
    if run_elevated(&argv) {
        info!("added {user} to 'input' group (effective after next login)");
        Ok(true)
    } else {
        warn!("could not add {user} to 'input' group");
        Ok(false)
    }
}

fn run_elevated(argv: &[String]) -> bool {
    let Some((program, rest)) = argv.split_first() else {
        return false;
    };
    let rest: Vec<&str> = rest.iter().map(String::as_str).collect();
    run_ok(program, &rest)
}

/// Install the uinput udev rule and reload rules. Skipped when the rule
/// file already has the expected content.
fn ensure_udev_rule(elevate: &[String]) -> Result<()> {
    if fs::read_to_string(UDEV_RULE_PATH).is_ok_and(|existing| existing == UDEV_RULE) {
        debug!("udev rule already present");
        return Ok(());
    }
    // Write through elevated tee; the rules directory is root-owned
    let mut argv: Vec<String> = elevate.to_vec();
    argv.extend(["tee", UDEV_RULE_PATH].into_iter().map(String::from));
    let Some((program, rest)) = argv.split_first() else {
        return Ok(());
    };
    let rest: Vec<&str> = rest.iter().map(String::as_str).collect();
    let mut child = Command::new(program)
        .args(&rest)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .spawn()
        .map_err(|e| SetupError::CommandFailed {
            command: argv.join(" "),
            reason: e.to_string(),
        })?;
    if let Some(stdin) = child.stdin.as_mut() {
        stdin.write_all(UDEV_RULE.as_bytes())?;
    }
    let status = child.wait()?;
    if !status.success() {
        warn!("could not write udev rule {UDEV_RULE_PATH}");
        return Ok(());
    }

    let mut reload: Vec<String> = elevate.to_vec();
    reload.extend(
        ["udevadm", "control", "--reload-rules"]
            .into_iter()
            .map(String::from),
    );
    run_elevated(&reload);
    let mut trigger: Vec<String> = elevate.to_vec();
    trigger.extend(["udevadm", "trigger"].into_iter().map(String::from));
    run_elevated(&trigger);
    Ok(())
}

/// Render the per-user unit for the given daemon path
pub fn render_unit(daemon_path: &Path) -> String {
    format!(
        "[Unit]\n\
         Description=ydotool user daemon\n\
         After=default.target\n\n\
         [Service]\n\
         ExecStart={} --socket-path=%h/.ydotool_socket --socket-own=%U:%G\n\
         Restart=on-failure\n\
         RestartSec=1s\n\n\
         [Install]\n\
         WantedBy=default.target\n",
        daemon_path.display()
    )
}

/// Write the unit file, rewritten every run in case the binary moved
fn write_user_unit(daemon_path: &Path) -> Result<()> {
    let unit_dir = paths::user_systemd_dir()?;
    fs::create_dir_all(&unit_dir)?;
    let unit_path = unit_dir.join(SERVICE_NAME);
    let content = render_unit(daemon_path);
    if fs::read_to_string(&unit_path).is_ok_and(|existing| existing == content) {
        return Ok(());
    }
    fs::write(&unit_path, content).map_err(|e| SetupError::FileWriteFailed {
        path: unit_path.display().to_string(),
        reason: e.to_string(),
    })
}

/// Export `YDOTOOL_SOCKET` in shell rc files that do not carry it yet
fn ensure_socket_env() -> Result<()> {
    let export = "export YDOTOOL_SOCKET=\"$HOME/.ydotool_socket\"\n";
    for rc in paths::shell_rc_files()? {
        if let Ok(text) = fs::read_to_string(&rc) {
            if !text.contains("YDOTOOL_SOCKET") {
                let mut file = fs::OpenOptions::new().append(true).open(&rc)?;
                file.write_all(b"\n")?;
                file.write_all(export.as_bytes())?;
            }
        }
    }
    Ok(())
}

/// systemd's view of the unit
pub fn service_is_active() -> bool {
    run_ok("systemctl", &["--user", "is-active", "--quiet", SERVICE_NAME])
}

/// A "started" unit whose process died immediately still reports active
/// briefly on some distros; double-check the process exists.
fn daemon_process_alive() -> bool {
    run_ok("pgrep", &["-x", "ydotoold"])
}

fn start_with_retry() -> bool {
    run_ok("systemctl", &["--user", "daemon-reload"]);
    run_ok("systemctl", &["--user", "enable", SERVICE_NAME]);
    retry::with_backoff::<(), (), _>(3, Duration::from_secs(1), |attempt| {
        debug!("starting {SERVICE_NAME} (attempt {attempt})");
        run_ok("systemctl", &["--user", "start", SERVICE_NAME]);
        std::thread::sleep(Duration::from_millis(500));
        if service_is_active() && daemon_process_alive() {
            Ok(())
        } else {
            Err(())
        }
    })
    .is_ok()
}

/// Last resort: launch the daemon directly under the `input` group
/// context, so typing works in this session without the relogin.
fn start_group_fallback(daemon_path: &Path) -> bool {
    if which::which("sg").is_err() {
        return false;
    }
    let socket = match paths::ydotool_socket_path() {
        Ok(path) => path,
        Err(_) => return false,
    };
    let uid = unsafe { libc::getuid() };
    let gid = unsafe { libc::getgid() };
    let cmd = format!(
        "{} --socket-path='{}' --socket-own={uid}:{gid} &",
        daemon_path.display(),
        socket.display()
    );
    if !run_ok("sg", &["input", "-c", &cmd]) {
        return false;
    }
    std::thread::sleep(Duration::from_millis(500));
    daemon_process_alive()
}

/// Full service/permission configuration for the resolved daemon binary
pub fn configure(profile: &pkgmgr::PackageManagerProfile, daemon_path: &Path) -> Result<ServiceOutcome> {
    let elevate = profile.elevation().to_vec();
    let needs_relogin = ensure_group_membership(&elevate)?;
    ensure_udev_rule(&elevate)?;
    ensure_socket_env()?;
    write_user_unit(daemon_path)?;

    let mut used_group_fallback = false;
    let mut active = start_with_retry();
    if !active {
        warn!("systemd start did not reach a running state, trying 'sg input' fallback");
        used_group_fallback = start_group_fallback(daemon_path);
        active = used_group_fallback;
    }

    Ok(ServiceOutcome {
        active,
        used_group_fallback,
        needs_relogin,
    })
}
