// fvl-aio/src/process.rs
use std::collections::HashMap;
use std::ffi::OsString;
use std::fmt;
use std::process::Stdio;

use fvl_common::error::{FvlError, Result};
use tracing::{debug, error};

/// Outcome of a best-effort kill. Never an error: a view that already exited
/// is the common case when a window is closed by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationStatus {
    /// The signal was delivered.
    Signaled,
    /// No process with that pid exists any more.
    NotFound,
    /// The pid was unusable or the OS refused for another reason.
    Unknown,
}

impl fmt::Display for TerminationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminationStatus::Signaled => write!(f, "signaled"),
            TerminationStatus::NotFound => write!(f, "not found"),
            TerminationStatus::Unknown => write!(f, "unknown"),
        }
    }
}

fn log_spawn(kind: &str, program: &OsString, args: &[OsString], envs: &HashMap<OsString, OsString>) {
    let mut env_keys: Vec<_> = envs.keys().map(|k| k.to_string_lossy()).collect();
    env_keys.sort();
    debug!(
        "{} spawning: {:?} {:?} (envs: {:?})",
        kind, program, args, env_keys
    );
}

/// Spawns `program` with exactly `envs` as its environment. The child keeps
/// running after the handle is dropped.
pub fn spawn_command_sync(
    program: &OsString,
    args: &[OsString],
    envs: &HashMap<OsString, OsString>,
) -> Result<std::process::Child> {
    log_spawn("Sync", program, args, envs);
    let mut cmd = std::process::Command::new(program);
    cmd.args(args);
    cmd.env_clear();
    cmd.envs(envs);
    cmd.stdin(Stdio::null());

    cmd.spawn().map_err(|e| {
        error!("Sync Failed to spawn {:?}: {}", program, e);
        FvlError::CommandExecError(format!("Failed to spawn {}: {e}", program.to_string_lossy()))
    })
}

/// Async counterpart of [`spawn_command_sync`]; returns a `tokio` child so the
/// caller can await its exit.
pub async fn spawn_command_async(
    program: &OsString,
    args: &[OsString],
    envs: &HashMap<OsString, OsString>,
) -> Result<tokio::process::Child> {
    log_spawn("Async", program, args, envs);
    let mut cmd = tokio::process::Command::new(program);
    cmd.args(args);
    cmd.env_clear();
    cmd.envs(envs);
    cmd.stdin(Stdio::null());
    cmd.kill_on_drop(false);

    cmd.spawn().map_err(|e| {
        error!("Async Failed to spawn {:?}: {}", program, e);
        FvlError::CommandExecError(format!("Failed to spawn {}: {e}", program.to_string_lossy()))
    })
}

/// Forcibly terminates `pid`.
#[cfg(unix)]
pub fn kill_pid(pid: u32) -> TerminationStatus {
    // 0 and negative values address process groups.
    let Ok(raw_pid) = libc::pid_t::try_from(pid) else {
        debug!("Refusing to signal out-of-range pid {}", pid);
        return TerminationStatus::Unknown;
    };
    if raw_pid <= 0 {
        debug!("Refusing to signal pid {}", pid);
        return TerminationStatus::Unknown;
    }

    // SAFETY: kill(2) has no memory-safety preconditions.
    let rc = unsafe { libc::kill(raw_pid, libc::SIGKILL) };
    if rc == 0 {
        debug!("Sent SIGKILL to {}", pid);
        return TerminationStatus::Signaled;
    }
    let err = std::io::Error::last_os_error();
    match err.raw_os_error() {
        Some(libc::ESRCH) => {
            debug!("Process {} already exited", pid);
            TerminationStatus::NotFound
        }
        _ => {
            debug!("Could not signal process {}: {}", pid, err);
            TerminationStatus::Unknown
        }
    }
}

/// Forcibly terminates `pid`.
#[cfg(windows)]
pub fn kill_pid(pid: u32) -> TerminationStatus {
    // taskkill exits with 128 when the pid does not exist.
    const TASKKILL_NOT_FOUND: i32 = 128;

    if pid == 0 {
        return TerminationStatus::Unknown;
    }
    let output = std::process::Command::new("taskkill")
        .args(["/F", "/PID", &pid.to_string()])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();
    match output {
        Ok(status) if status.success() => TerminationStatus::Signaled,
        Ok(status) if status.code() == Some(TASKKILL_NOT_FOUND) => TerminationStatus::NotFound,
        Ok(status) => {
            debug!("taskkill for {} exited with {}", pid, status);
            TerminationStatus::Unknown
        }
        Err(e) => {
            debug!("Could not run taskkill for {}: {}", pid, e);
            TerminationStatus::Unknown
        }
    }
}

#[cfg(not(any(unix, windows)))]
pub fn kill_pid(pid: u32) -> TerminationStatus {
    debug!("Killing processes is not supported on this platform (pid {})", pid);
    TerminationStatus::Unknown
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pid_zero_is_never_signalled() {
        assert_eq!(kill_pid(0), TerminationStatus::Unknown);
    }

    #[cfg(unix)]
    #[test]
    fn out_of_range_pid_is_never_signalled() {
        assert_eq!(kill_pid(u32::MAX), TerminationStatus::Unknown);
    }

    #[cfg(unix)]
    #[test]
    fn missing_process_is_not_found() {
        // Valid pid_t, far above any pid_max, so no process can own it.
        assert_eq!(kill_pid(2_147_483_000), TerminationStatus::NotFound);
    }

    #[cfg(unix)]
    #[test]
    fn running_process_is_signaled() {
        let envs: HashMap<OsString, OsString> = std::env::vars_os().collect();
        let mut child = spawn_command_sync(
            &OsString::from("sleep"),
            &[OsString::from("30")],
            &envs,
        )
        .unwrap();
        assert_eq!(kill_pid(child.id()), TerminationStatus::Signaled);
        let status = child.wait().unwrap();
        assert!(!status.success());
    }

    #[test]
    fn spawn_failure_is_typed() {
        let err = spawn_command_sync(
            &OsString::from("fvl-definitely-not-a-real-binary"),
            &[],
            &HashMap::new(),
        )
        .unwrap_err();
        assert!(matches!(err, FvlError::CommandExecError(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn async_spawn_uses_given_environment() {
        let mut envs: HashMap<OsString, OsString> = std::env::vars_os().collect();
        envs.insert("FVL_TEST_MARKER".into(), "1".into());
        let mut child = spawn_command_async(
            &OsString::from("sh"),
            &[
                OsString::from("-c"),
                OsString::from("test \"$FVL_TEST_MARKER\" = 1"),
            ],
            &envs,
        )
        .await
        .unwrap();
        assert!(child.wait().await.unwrap().success());
    }
}
