// fvl-core/src/supervisor.rs
//! Spawn and terminate the view process.
//!
//! `open` resolves a bundle, creates a launch token, and spawns the view with
//! the token path on its command line. `close` takes the token back, kills the
//! pid the view wrote into it and deletes the file. Closing never fails.

use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use fvl_aio::fs::remove_file_if_exists;
use fvl_aio::process::{kill_pid, spawn_command_async, spawn_command_sync, TerminationStatus};
use fvl_common::config::Config;
use fvl_common::error::{FvlError, Result};
use fvl_common::fetch::ArchiveFetcher;
use fvl_common::platform::PlatformTarget;
use tracing::{debug, error, info, warn};

use crate::launch::{LaunchCommand, LaunchParams};
use crate::resolve::{ResolvedBundle, Resolver};
use crate::token::{create_token, read_pid};

const STD_WAIT_POLL: Duration = Duration::from_millis(100);

/// What to show in the view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenRequest {
    pub page_url: String,
    pub assets_dir: Option<PathBuf>,
    pub hidden: bool,
}

impl OpenRequest {
    pub fn new(page_url: impl Into<String>) -> Self {
        Self {
            page_url: page_url.into(),
            assets_dir: None,
            hidden: false,
        }
    }

    pub fn assets_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.assets_dir = Some(dir.into());
        self
    }

    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }
}

/// Handle to a spawned view, from either the blocking or the async entry point.
#[derive(Debug)]
pub enum ViewProcess {
    Std(std::process::Child),
    Tokio(tokio::process::Child),
}

impl ViewProcess {
    pub fn id(&self) -> Option<u32> {
        match self {
            ViewProcess::Std(child) => Some(child.id()),
            ViewProcess::Tokio(child) => child.id(),
        }
    }

    pub fn try_wait(&mut self) -> Result<Option<std::process::ExitStatus>> {
        let status = match self {
            ViewProcess::Std(child) => child.try_wait()?,
            ViewProcess::Tokio(child) => child.try_wait()?,
        };
        Ok(status)
    }

    /// Waits for the view to exit. A `Std` child is polled so the runtime
    /// thread is never blocked.
    pub async fn wait(&mut self) -> Result<std::process::ExitStatus> {
        match self {
            ViewProcess::Std(child) => loop {
                if let Some(status) = child.try_wait()? {
                    return Ok(status);
                }
                tokio::time::sleep(STD_WAIT_POLL).await;
            },
            ViewProcess::Tokio(child) => Ok(child.wait().await?),
        }
    }

    /// Kills the direct child. On macOS this is the `open` helper, not the
    /// view itself; use [`ViewSupervisor::close`] with the token for that.
    pub fn kill(&mut self) -> Result<()> {
        match self {
            ViewProcess::Std(child) => child.kill()?,
            ViewProcess::Tokio(child) => child.start_kill()?,
        }
        Ok(())
    }
}

pub struct ViewSupervisor {
    resolver: Arc<Resolver>,
}

impl ViewSupervisor {
    pub fn new(config: Config, platform: PlatformTarget, fetcher: Arc<dyn ArchiveFetcher>) -> Self {
        Self {
            resolver: Arc::new(Resolver::new(config, platform, fetcher)),
        }
    }

    pub fn config(&self) -> &Config {
        self.resolver.config()
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// Resolves, spawns and returns the view with its token path.
    ///
    /// May download with a blocking HTTP client, so do not call this from
    /// inside an async runtime; use [`ViewSupervisor::open_async`] there.
    pub fn open(&self, request: &OpenRequest) -> Result<(ViewProcess, PathBuf)> {
        info!("Starting view app...");
        let bundle = self.resolver.resolve()?;
        let token = create_token(&self.config().temp_dir)?;
        let command = self.command_for(&bundle, &token, request);

        match spawn_command_sync(command.program(), command.args(), command.envs()) {
            Ok(child) => {
                debug!("View started with pid {}", child.id());
                Ok((ViewProcess::Std(child), token))
            }
            Err(e) => Err(discard_token_after(e, &token)),
        }
    }

    /// Async counterpart of [`ViewSupervisor::open`]. Resolution runs on the
    /// blocking pool; the view is spawned through `tokio::process`.
    pub async fn open_async(&self, request: &OpenRequest) -> Result<(ViewProcess, PathBuf)> {
        info!("Starting view app...");
        let bundle = self.resolve_async().await?;
        let token = create_token(&self.config().temp_dir)?;
        let command = self.command_for(&bundle, &token, request);

        match spawn_command_async(command.program(), command.args(), command.envs()).await {
            Ok(child) => {
                debug!("View started with pid {:?}", child.id());
                Ok((ViewProcess::Tokio(child), token))
            }
            Err(e) => Err(discard_token_after(e, &token)),
        }
    }

    /// Runs the resolver on the blocking pool; may install into the cache.
    pub async fn resolve_async(&self) -> Result<ResolvedBundle> {
        let resolver = Arc::clone(&self.resolver);
        tokio::task::spawn_blocking(move || resolver.resolve())
            .await
            .map_err(|e| FvlError::Generic(format!("View resolution task failed: {e}")))?
    }

    /// See [`close_view`].
    pub fn close(&self, token: Option<&Path>) -> Option<TerminationStatus> {
        close_view(token)
    }

    /// Waits for the view to exit on its own, then deletes its token. Nothing
    /// is signalled: once the view is reaped its pid may belong to another
    /// process.
    pub async fn wait_for_exit(
        &self,
        process: &mut ViewProcess,
        token: &Path,
    ) -> Result<std::process::ExitStatus> {
        let status = process.wait().await?;
        debug!("View exited with {}", status);
        discard_token(token);
        Ok(status)
    }

    fn command_for(&self, bundle: &ResolvedBundle, token: &Path, request: &OpenRequest) -> LaunchCommand {
        let hide_var = self.config().hide_window_env_var();
        let params = LaunchParams {
            page_url: &request.page_url,
            token_path: token,
            assets_dir: request.assets_dir.as_deref(),
            hidden: request.hidden,
            hide_window_var: &hide_var,
        };
        LaunchCommand::build(self.resolver.platform(), &bundle.path, &params, env::vars_os())
    }
}

fn discard_token_after(err: FvlError, token: &Path) -> FvlError {
    if let Err(cleanup) = remove_file_if_exists(token) {
        warn!("Failed to remove token {}: {}", token.display(), cleanup);
    }
    err
}

/// Deletes `token` without touching the pid inside it. Returns whether a
/// file was removed.
pub fn discard_token(token: &Path) -> bool {
    match remove_file_if_exists(token) {
        Ok(removed) => removed,
        Err(e) => {
            error!("Failed to remove token {}: {}", token.display(), e);
            false
        }
    }
}

/// Terminates the view owning `token` and deletes the token file.
///
/// Returns `None` when there is nothing to close: no token was given or the
/// file no longer exists. A token the view never wrote to yields `Unknown`.
pub fn close_view(token: Option<&Path>) -> Option<TerminationStatus> {
    let token = token?;
    if !token.exists() {
        debug!("Token {} does not exist, nothing to close", token.display());
        return None;
    }

    let status = match read_pid(token) {
        Some(pid) => {
            debug!("View process {}", pid);
            kill_pid(pid)
        }
        None => TerminationStatus::Unknown,
    };

    discard_token(token);
    Some(status)
}
