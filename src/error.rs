use nix::errno::Errno;
use std::os::unix::io::RawFd;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for detach
#[derive(Debug, Error)]
pub enum DetachError {
    // Daemonization protocol errors
    #[error("Failed to fork into the background: {0}")]
    ForkFailed(#[source] Errno),

    #[error("Failed to create a new session: {0}")]
    SessionCreateFailed(#[source] Errno),

    #[error("Failed to fork away from session leadership: {0}")]
    TerminalDetachFailed(#[source] Errno),

    #[error("Failed to open null device {}: {source}", .path.display())]
    NullDeviceOpenFailed { path: PathBuf, source: Errno },

    #[error("Null device {} failed character device verification", .path.display())]
    NullDeviceInvalid {
        path: PathBuf,
        #[source]
        source: Option<Errno>,
    },

    #[error("Failed to redirect descriptor {fd} to the null device: {source}")]
    StreamRedirectFailed { fd: RawFd, source: Errno },

    // Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid configuration file: {0}")]
    InvalidConfig(String),

    #[error("Configuration validation failed: {0}")]
    ConfigValidationError(String),

    // Command execution errors
    #[error("Failed to execute command: {0}")]
    ExecFailed(String),

    // IO errors (automatically converted from std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DetachError {
    /// OS error code equivalent to this failure, if it came from the protocol
    pub fn raw_os_error(&self) -> Option<i32> {
        match self {
            DetachError::ForkFailed(errno)
            | DetachError::SessionCreateFailed(errno)
            | DetachError::TerminalDetachFailed(errno)
            | DetachError::NullDeviceOpenFailed { source: errno, .. }
            | DetachError::StreamRedirectFailed { source: errno, .. } => Some(*errno as i32),
            // No call failed when the type check rejects the device
            DetachError::NullDeviceInvalid { source, .. } => {
                Some(source.unwrap_or(Errno::ENODEV) as i32)
            }
            DetachError::Io(e) => e.raw_os_error(),
            _ => None,
        }
    }
}

/// Result type alias for detach operations
pub type Result<T> = std::result::Result<T, DetachError>;
