// CLI module - Run a command as a detached daemon

pub mod output;

use crate::config::DaemonOptions;
use crate::daemon::daemonize_with;
use crate::error::{DetachError, Result};
use clap::Parser;
use std::ffi::OsString;
use std::os::unix::process::CommandExt;
use std::path::PathBuf;
use std::process::Command;
use tracing::info;

/// Detach - run a command in the background, free of the terminal
#[derive(Parser, Debug)]
#[command(name = "detach")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Keep the current working directory instead of changing to /
    #[arg(short = 'n', long)]
    no_chdir: bool,

    /// Keep stdin, stdout and stderr instead of redirecting them to the null device
    #[arg(short = 'c', long)]
    no_close: bool,

    /// Discard device to redirect standard streams onto
    #[arg(long, value_name = "PATH")]
    null_device: Option<PathBuf>,

    /// Read default options from a TOML or JSON file
    #[arg(short = 'f', long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Command to run once detached, followed by its arguments
    #[arg(
        required = true,
        trailing_var_arg = true,
        allow_hyphen_values = true,
        value_name = "COMMAND"
    )]
    command: Vec<OsString>,
}

impl Cli {
    /// Run the CLI application
    pub fn run() -> Result<()> {
        let cli = Cli::parse();
        cli.execute()
    }

    /// Daemonize, then replace this process with the requested command
    fn execute(&self) -> Result<()> {
        let options = self.build_options()?;
        let (program, args) = self
            .command
            .split_first()
            .ok_or_else(|| DetachError::ExecFailed("no command given".to_string()))?;

        info!(
            "Detaching {} (chdir: {}, redirect: {})",
            program.to_string_lossy(),
            !options.skip_chdir,
            !options.skip_redirect
        );

        daemonize_with(&options)?;

        // exec only returns on failure
        let err = Command::new(program).args(args).exec();
        Err(DetachError::ExecFailed(format!(
            "{}: {}",
            program.to_string_lossy(),
            err
        )))
    }

    /// Merge the config file (if any) with flags; flags win
    fn build_options(&self) -> Result<DaemonOptions> {
        let mut options = match &self.config {
            Some(path) => DaemonOptions::from_file(path)?,
            None => DaemonOptions::default(),
        };

        if self.no_chdir {
            options.skip_chdir = true;
        }
        if self.no_close {
            options.skip_redirect = true;
        }
        if let Some(null_device) = &self.null_device {
            options.null_device = null_device.clone();
        }

        options.validate()?;
        Ok(options)
    }
}
