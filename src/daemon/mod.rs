// Daemon module - Detaching a process from its terminal and session

pub mod daemonize;
pub mod env;
pub mod platform;
pub mod stdio;

#[cfg(test)]
mod fake;

pub use daemonize::{daemonize, daemonize_with, Daemonizer};
pub use env::{ProcessEnv, SystemEnv};
pub use platform::Platform;
