// Daemonization protocol for Unix systems

use super::env::{ProcessEnv, SystemEnv};
use super::platform::Platform;
use super::stdio::redirect_to_null;
use crate::config::DaemonOptions;
use crate::error::{DetachError, Result};
use nix::unistd::ForkResult;
use tracing::{debug, error};

/// Detach the calling process from its terminal and session.
///
/// On success the caller continues in a grandchild (or child, where the
/// platform does not need the second fork) that has no controlling terminal.
/// The original process and any intermediate process exit with status 0 and
/// never return from this call.
///
/// Must be called before any other threads or async runtimes are started:
/// only the calling thread survives a fork.
pub fn daemonize(skip_chdir: bool, skip_redirect: bool) -> Result<()> {
    daemonize_with(&DaemonOptions::new(skip_chdir, skip_redirect))
}

/// Same as [`daemonize`], with explicit paths for the root and null device
pub fn daemonize_with(options: &DaemonOptions) -> Result<()> {
    Daemonizer::new(SystemEnv, Platform::HOST).run(options)
}

/// Runs the detach protocol against a process environment
pub struct Daemonizer<E: ProcessEnv> {
    env: E,
    platform: Platform,
}

impl<E: ProcessEnv> Daemonizer<E> {
    pub fn new(env: E, platform: Platform) -> Self {
        Self { env, platform }
    }

    /// Execute every step in order, stopping at the first failure
    pub fn run(&mut self, options: &DaemonOptions) -> Result<()> {
        self.background().map_err(DetachError::ForkFailed)?;

        self.new_session()?;

        if self.platform.refork_after_setsid {
            self.background().map_err(DetachError::TerminalDetachFailed)?;
        }

        if !options.skip_chdir {
            self.change_to_root(options);
        }

        if !options.skip_redirect {
            debug!(
                "Redirecting standard streams to {}",
                options.null_device.display()
            );
            redirect_to_null(
                &mut self.env,
                &options.null_device,
                self.platform.verify_null_device,
            )
            .inspect_err(|e| error!("{}", e))?;
        }

        Ok(())
    }

    /// Fork and let only the child return
    fn background(&mut self) -> nix::Result<()> {
        match self.env.fork() {
            Ok(ForkResult::Parent { child }) => {
                debug!("Forked {}, parent {} exiting", child, self.env.pid());
                self.env.exit_parent()
            }
            Ok(ForkResult::Child) => Ok(()),
            Err(e) => {
                error!("fork failed in {}: {}", self.env.pid(), e);
                Err(e)
            }
        }
    }

    fn new_session(&mut self) -> Result<()> {
        let sid = self.env.setsid().map_err(|e| {
            error!("setsid failed in {}: {}", self.env.pid(), e);
            DetachError::SessionCreateFailed(e)
        })?;
        debug!("Created session {}", sid);
        Ok(())
    }

    /// Best effort: a daemon left in its start directory still works
    fn change_to_root(&mut self, options: &DaemonOptions) {
        if let Err(e) = self.env.chdir(&options.root_dir) {
            debug!(
                "Staying in current directory, chdir to {} failed: {}",
                options.root_dir.display(),
                e
            );
        }
    }

    /// Give back the environment, mostly useful for inspecting fakes
    pub fn into_env(self) -> E {
        self.env
    }
}
