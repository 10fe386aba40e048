// Configuration module - Daemonization options and config file loading

use crate::error::{DetachError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default discard device
pub const DEFAULT_NULL_DEVICE: &str = "/dev/null";

/// Default working directory of a daemon
pub const DEFAULT_ROOT_DIR: &str = "/";

/// Options controlling the optional steps of daemonization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DaemonOptions {
    /// Keep the current working directory instead of moving to `root_dir`
    #[serde(default)]
    pub skip_chdir: bool,

    /// Keep stdin, stdout and stderr instead of pointing them at `null_device`
    #[serde(default)]
    pub skip_redirect: bool,

    /// Device the standard streams are redirected onto
    #[serde(default = "default_null_device")]
    pub null_device: PathBuf,

    /// Directory the daemon moves into
    #[serde(default = "default_root_dir")]
    pub root_dir: PathBuf,
}

// Default value functions for serde
fn default_null_device() -> PathBuf {
    PathBuf::from(DEFAULT_NULL_DEVICE)
}

fn default_root_dir() -> PathBuf {
    PathBuf::from(DEFAULT_ROOT_DIR)
}

impl Default for DaemonOptions {
    fn default() -> Self {
        Self::new(false, false)
    }
}

impl DaemonOptions {
    /// Options with the standard root and null device paths
    pub fn new(skip_chdir: bool, skip_redirect: bool) -> Self {
        Self {
            skip_chdir,
            skip_redirect,
            null_device: default_null_device(),
            root_dir: default_root_dir(),
        }
    }

    /// Load options from a file (supports TOML and JSON)
    pub fn from_file(path: &Path) -> Result<DaemonOptions> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| DetachError::ConfigError(format!("Failed to read config file: {}", e)))?;

        // Determine format based on file extension
        let extension = path.extension().and_then(|s| s.to_str()).unwrap_or("");

        let mut options = match extension {
            "toml" => Self::parse_toml(&contents)?,
            "json" => Self::parse_json(&contents)?,
            _ => {
                return Err(DetachError::InvalidConfig(format!(
                    "Unsupported file format: {}. Use .toml or .json",
                    extension
                )))
            }
        };

        options.expand_env_vars();
        options.validate()?;

        Ok(options)
    }

    fn parse_toml(contents: &str) -> Result<DaemonOptions> {
        toml::from_str(contents)
            .map_err(|e| DetachError::InvalidConfig(format!("Failed to parse TOML: {}", e)))
    }

    fn parse_json(contents: &str) -> Result<DaemonOptions> {
        serde_json::from_str(contents)
            .map_err(|e| DetachError::InvalidConfig(format!("Failed to parse JSON: {}", e)))
    }

    /// Validate the options
    pub fn validate(&self) -> Result<()> {
        if !self.skip_redirect {
            if self.null_device.as_os_str().is_empty() {
                return Err(DetachError::ConfigValidationError(
                    "null_device must not be empty".to_string(),
                ));
            }
            if !self.null_device.is_absolute() {
                return Err(DetachError::ConfigValidationError(format!(
                    "null_device must be an absolute path: {}",
                    self.null_device.display()
                )));
            }
        }

        if !self.skip_chdir && !self.root_dir.is_absolute() {
            return Err(DetachError::ConfigValidationError(format!(
                "root_dir must be an absolute path: {}",
                self.root_dir.display()
            )));
        }

        Ok(())
    }

    /// Expand `$VAR` and `${VAR}` in the configured paths
    fn expand_env_vars(&mut self) {
        self.null_device = expand_env_in_path(&self.null_device);
        self.root_dir = expand_env_in_path(&self.root_dir);
    }
}

fn expand_env_in_string(s: &str) -> String {
    let mut result = s.to_string();

    // Longest names first so $HOME does not clobber $HOMEDIR
    let mut vars: Vec<(String, String)> = std::env::vars().collect();
    vars.sort_by(|a, b| b.0.len().cmp(&a.0.len()));

    for (key, value) in vars {
        result = result.replace(&format!("${{{}}}", key), &value);
        result = result.replace(&format!("${}", key), &value);
    }

    result
}

fn expand_env_in_path(path: &Path) -> PathBuf {
    PathBuf::from(expand_env_in_string(&path.to_string_lossy()))
}
