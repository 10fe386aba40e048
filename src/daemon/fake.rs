// Recording process environment for protocol tests

use super::env::ProcessEnv;
use nix::errno::Errno;
use nix::unistd::{ForkResult, Pid};
use std::collections::{BTreeMap, VecDeque};
use std::os::unix::io::RawFd;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Fork,
    ExitParent,
    Setsid,
    Chdir(PathBuf),
    OpenNull(PathBuf),
    IsCharDevice(RawFd),
    Dup2(RawFd, RawFd),
    Save(RawFd),
    Close(RawFd),
}

/// Fake environment that records every primitive and fails on demand
#[derive(Debug)]
pub struct FakeEnv {
    pub calls: Vec<Call>,
    /// Outcomes for successive forks; `Ok(ForkResult::Child)` once exhausted
    pub forks: VecDeque<nix::Result<ForkResult>>,
    pub setsid_error: Option<Errno>,
    pub chdir_error: Option<Errno>,
    pub open_error: Option<Errno>,
    pub stat_error: Option<Errno>,
    pub dup2_error: Option<(RawFd, Errno)>,
    pub save_error: Option<(RawFd, Errno)>,
    pub null_fd: RawFd,
    pub char_device: bool,
    /// What each open descriptor refers to
    pub table: BTreeMap<RawFd, String>,
}

impl FakeEnv {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            forks: VecDeque::new(),
            setsid_error: None,
            chdir_error: None,
            open_error: None,
            stat_error: None,
            dup2_error: None,
            save_error: None,
            null_fd: 7,
            char_device: true,
            table: (0..=2).map(|fd| (fd, format!("tty{}", fd))).collect(),
        }
    }

    /// Targets of descriptors 0, 1 and 2; `None` for a closed slot
    pub fn stdio(&self) -> Vec<Option<&str>> {
        (0..=2)
            .map(|fd| self.table.get(&fd).map(String::as_str))
            .collect()
    }

    /// Descriptor a saved copy of `fd` lands on
    pub fn saved(fd: RawFd) -> RawFd {
        fd + 20
    }

    /// Whether any call touched descriptors 0, 1 or 2
    pub fn touched_stdio(&self) -> bool {
        self.calls.iter().any(|call| match call {
            Call::Dup2(_, target) => (0..=2).contains(target),
            Call::Close(fd) => (0..=2).contains(fd),
            _ => false,
        })
    }

    pub fn count(&self, wanted: &Call) -> usize {
        self.calls.iter().filter(|call| *call == wanted).count()
    }
}

impl ProcessEnv for FakeEnv {
    fn fork(&mut self) -> nix::Result<ForkResult> {
        self.calls.push(Call::Fork);
        self.forks.pop_front().unwrap_or(Ok(ForkResult::Child))
    }

    fn exit_parent(&mut self) -> ! {
        self.calls.push(Call::ExitParent);
        panic!("parent exited");
    }

    fn setsid(&mut self) -> nix::Result<Pid> {
        self.calls.push(Call::Setsid);
        match self.setsid_error {
            Some(errno) => Err(errno),
            None => Ok(Pid::from_raw(4242)),
        }
    }

    fn chdir(&mut self, dir: &Path) -> nix::Result<()> {
        self.calls.push(Call::Chdir(dir.to_path_buf()));
        self.chdir_error.map_or(Ok(()), Err)
    }

    fn open_null(&mut self, path: &Path) -> nix::Result<RawFd> {
        self.calls.push(Call::OpenNull(path.to_path_buf()));
        match self.open_error {
            Some(errno) => Err(errno),
            None => {
                self.table.insert(self.null_fd, "null".to_string());
                Ok(self.null_fd)
            }
        }
    }

    fn is_char_device(&mut self, fd: RawFd) -> nix::Result<bool> {
        self.calls.push(Call::IsCharDevice(fd));
        match self.stat_error {
            Some(errno) => Err(errno),
            None => Ok(self.char_device),
        }
    }

    fn dup2(&mut self, fd: RawFd, target: RawFd) -> nix::Result<()> {
        self.calls.push(Call::Dup2(fd, target));
        match self.dup2_error {
            Some((failing, errno)) if failing == target => Err(errno),
            _ => {
                let source = self.table.get(&fd).cloned().ok_or(Errno::EBADF)?;
                self.table.insert(target, source);
                Ok(())
            }
        }
    }

    fn save(&mut self, fd: RawFd) -> nix::Result<RawFd> {
        self.calls.push(Call::Save(fd));
        match self.save_error {
            Some((failing, errno)) if failing == fd => Err(errno),
            _ => {
                let source = self.table.get(&fd).cloned().ok_or(Errno::EBADF)?;
                self.table.insert(Self::saved(fd), source);
                Ok(Self::saved(fd))
            }
        }
    }

    fn close(&mut self, fd: RawFd) -> nix::Result<()> {
        self.calls.push(Call::Close(fd));
        self.table.remove(&fd).map(drop).ok_or(Errno::EBADF)
    }

    fn pid(&self) -> Pid {
        Pid::from_raw(4242)
    }
}
