// Standard stream redirection onto the null device

use super::env::ProcessEnv;
use crate::error::{DetachError, Result};
use nix::errno::Errno;
use nix::libc::{STDERR_FILENO, STDIN_FILENO, STDOUT_FILENO};
use std::os::unix::io::RawFd;
use std::path::Path;
use tracing::debug;

const STDIO: [RawFd; 3] = [STDIN_FILENO, STDOUT_FILENO, STDERR_FILENO];

/// A standard slot about to be overwritten and its saved copy (`None` if it was closed)
type Saved = (RawFd, Option<RawFd>);

/// Point stdin, stdout and stderr at the discard device at `path`.
///
/// Either all three descriptors end up on the device or none are touched: the
/// device is opened and (when `verify` is set) checked to be a character
/// device before the first `dup2`, and the slots are saved beforehand so a
/// failing `dup2` puts back the ones already moved. The opened descriptor is
/// closed afterwards unless it already landed on one of the three standard
/// slots.
pub fn redirect_to_null<E: ProcessEnv>(env: &mut E, path: &Path, verify: bool) -> Result<()> {
    let fd = env
        .open_null(path)
        .map_err(|source| DetachError::NullDeviceOpenFailed {
            path: path.to_path_buf(),
            source,
        })?;

    if verify {
        let verified = match env.is_char_device(fd) {
            Ok(true) => Ok(()),
            Ok(false) => Err(None),
            Err(errno) => Err(Some(errno)),
        };
        if let Err(source) = verified {
            release(env, fd);
            return Err(DetachError::NullDeviceInvalid {
                path: path.to_path_buf(),
                source,
            });
        }
    }

    let mut saved: Vec<Saved> = Vec::with_capacity(STDIO.len());
    for target in STDIO {
        if target == fd {
            continue;
        }
        match env.save(target) {
            Ok(copy) => saved.push((target, Some(copy))),
            Err(Errno::EBADF) => saved.push((target, None)),
            Err(source) => {
                discard(env, &saved);
                release(env, fd);
                return Err(DetachError::StreamRedirectFailed { fd: target, source });
            }
        }
    }

    for (moved, &(target, _)) in saved.iter().enumerate() {
        if let Err(source) = env.dup2(fd, target) {
            restore(env, &saved[..moved]);
            discard(env, &saved);
            // A handle on slot 0-2 means that slot was closed before the call
            release(env, fd);
            return Err(DetachError::StreamRedirectFailed { fd: target, source });
        }
    }

    discard(env, &saved);
    if fd > STDERR_FILENO {
        release(env, fd);
    }

    Ok(())
}

/// Put redirected slots back the way they were
fn restore<E: ProcessEnv>(env: &mut E, redirected: &[Saved]) {
    for &(target, copy) in redirected {
        let result = match copy {
            Some(copy) => env.dup2(copy, target),
            None => env.close(target),
        };
        if let Err(e) = result {
            debug!("Failed to restore descriptor {}: {}", target, e);
        }
    }
}

fn discard<E: ProcessEnv>(env: &mut E, saved: &[Saved]) {
    for &(_, copy) in saved {
        if let Some(copy) = copy {
            release(env, copy);
        }
    }
}

fn release<E: ProcessEnv>(env: &mut E, fd: RawFd) {
    if let Err(e) = env.close(fd) {
        debug!("Failed to close descriptor {}: {}", fd, e);
    }
}
