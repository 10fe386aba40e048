// Library exports for detach

#[cfg(not(unix))]
compile_error!("detach only supports Unix systems");

pub mod cli;
pub mod config;
pub mod daemon;
pub mod error;

pub use daemon::daemonize;
