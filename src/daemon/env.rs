// Process environment used by the detach protocol

use nix::fcntl::{fcntl, open, FcntlArg, OFlag};
use nix::sys::stat::{fstat, Mode, SFlag};
use nix::unistd::{self, ForkResult, Pid};
use std::os::unix::io::RawFd;
use std::path::Path;

/// The ambient process state the protocol reads and mutates.
///
/// Every OS primitive the daemonizer needs goes through this trait, so each
/// mutation point is explicit and happens in protocol order.
pub trait ProcessEnv {
    /// Duplicate the calling process
    fn fork(&mut self) -> nix::Result<ForkResult>;

    /// Terminate the calling process immediately with a success status
    fn exit_parent(&mut self) -> !;

    /// Become leader of a new session and process group
    fn setsid(&mut self) -> nix::Result<Pid>;

    /// Change the working directory
    fn chdir(&mut self, dir: &Path) -> nix::Result<()>;

    /// Open the discard device read-write, returning its descriptor
    fn open_null(&mut self, path: &Path) -> nix::Result<RawFd>;

    /// Whether the descriptor refers to a character-special file
    fn is_char_device(&mut self, fd: RawFd) -> nix::Result<bool>;

    /// Make `target` refer to the same open file as `fd`
    fn dup2(&mut self, fd: RawFd, target: RawFd) -> nix::Result<()>;

    /// Copy `fd` to a close-on-exec descriptor above the standard slots
    fn save(&mut self, fd: RawFd) -> nix::Result<RawFd>;

    /// Close a descriptor
    fn close(&mut self, fd: RawFd) -> nix::Result<()>;

    /// Current process id, for diagnostics
    fn pid(&self) -> Pid;
}

/// The real process environment backed by system calls
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemEnv;

impl ProcessEnv for SystemEnv {
    fn fork(&mut self) -> nix::Result<ForkResult> {
        // SAFETY: the parent only calls `_exit` after this returns, and the
        // child continues on the single thread that called fork.
        unsafe { unistd::fork() }
    }

    fn exit_parent(&mut self) -> ! {
        // SAFETY: `_exit` only ends the process; atexit handlers and stdio
        // buffers are skipped because they belong to the child now.
        unsafe { nix::libc::_exit(0) }
    }

    fn setsid(&mut self) -> nix::Result<Pid> {
        unistd::setsid()
    }

    fn chdir(&mut self, dir: &Path) -> nix::Result<()> {
        unistd::chdir(dir)
    }

    fn open_null(&mut self, path: &Path) -> nix::Result<RawFd> {
        // No O_CLOEXEC: the descriptor may itself become stdin, stdout or stderr
        open(path, OFlag::O_RDWR, Mode::empty())
    }

    fn is_char_device(&mut self, fd: RawFd) -> nix::Result<bool> {
        let stat = fstat(fd)?;
        let kind = SFlag::from_bits_truncate(stat.st_mode) & SFlag::S_IFMT;
        Ok(kind == SFlag::S_IFCHR)
    }

    fn dup2(&mut self, fd: RawFd, target: RawFd) -> nix::Result<()> {
        unistd::dup2(fd, target).map(drop)
    }

    fn save(&mut self, fd: RawFd) -> nix::Result<RawFd> {
        fcntl(fd, FcntlArg::F_DUPFD_CLOEXEC(3))
    }

    fn close(&mut self, fd: RawFd) -> nix::Result<()> {
        unistd::close(fd)
    }

    fn pid(&self) -> Pid {
        unistd::getpid()
    }
}
