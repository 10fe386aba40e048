// Host capabilities that shape the detach protocol

/// Fixed properties of the target platform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Platform {
    /// Fork once more after `setsid` so the daemon is not a session leader
    pub refork_after_setsid: bool,
    /// `fstat` the opened null device and require a character device
    pub verify_null_device: bool,
}

impl Platform {
    /// Capabilities of the platform this crate was compiled for
    pub const HOST: Platform = Platform {
        refork_after_setsid: session_leader_acquires_tty() && !cfg!(feature = "single-fork"),
        verify_null_device: true,
    };
}

impl Default for Platform {
    fn default() -> Self {
        Self::HOST
    }
}

/// Whether a session leader gains a controlling terminal just by opening one.
///
/// System V semantics (Linux, illumos) attach the first terminal opened without
/// `O_NOCTTY`. BSD-derived kernels only do so on an explicit `TIOCSCTTY`.
const fn session_leader_acquires_tty() -> bool {
    !cfg!(any(
        target_os = "macos",
        target_os = "ios",
        target_os = "freebsd",
        target_os = "openbsd",
        target_os = "netbsd",
        target_os = "dragonfly"
    ))
}
