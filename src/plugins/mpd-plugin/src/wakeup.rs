//! Interruptible timed waits.
//!
//! The supervisor sleeps between connection attempts through [`RetryWait`]:
//! "wait up to D, or until woken, whichever comes first". [`FifoWakeup`]
//! realizes the wake channel as a named pipe; writing anything to it ends
//! the current wait early.

use std::fs::{File, OpenOptions};
use std::io::{self, Read};
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::{AsRawFd, RawFd};
use std::path::PathBuf;
use std::time::Duration;

/// Why a wait ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WakeReason {
    /// The full timeout elapsed.
    Elapsed,
    /// The wake channel was signalled.
    Woken,
    /// A signal was delivered to the waiting thread.
    Interrupted,
}

/// A cancellable timed wait.
pub trait RetryWait {
    /// Block for up to `timeout`. An `Err` means the wait itself is broken.
    fn wait(&mut self, timeout: Duration) -> io::Result<WakeReason>;
}

/// Timed wait that a write to a FIFO can cut short.
///
/// The FIFO is (re)opened before every wait; if it cannot be opened the
/// wait degrades to a plain timed sleep.
#[derive(Debug)]
pub struct FifoWakeup {
    path: Option<PathBuf>,
    fifo: Option<File>,
}

impl FifoWakeup {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path, fifo: None }
    }

    fn ensure_open(&mut self) {
        let Some(path) = &self.path else {
            return;
        };
        if self.fifo.is_some() {
            return;
        }
        // std adds O_CLOEXEC on its own.
        match OpenOptions::new()
            .read(true)
            .custom_flags(libc::O_NONBLOCK)
            .open(path)
        {
            Ok(file) => self.fifo = Some(file),
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "failed to open retry fifo");
            }
        }
    }

    fn drain(file: &mut File) {
        let mut buf = [0u8; 512];
        loop {
            match file.read(&mut buf) {
                Ok(0) => break,
                Ok(_) => continue,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(_) => break,
            }
        }
    }
}

impl RetryWait for FifoWakeup {
    fn wait(&mut self, timeout: Duration) -> io::Result<WakeReason> {
        self.ensure_open();
        let Some(file) = self.fifo.as_mut() else {
            std::thread::sleep(timeout);
            return Ok(WakeReason::Elapsed);
        };

        match wait_readable(file.as_raw_fd(), timeout)? {
            Readiness::TimedOut => Ok(WakeReason::Elapsed),
            Readiness::Interrupted => Ok(WakeReason::Interrupted),
            Readiness::Ready => {
                Self::drain(file);
                // Once the writer hangs up the pipe stays readable; reopen next time.
                self.fifo = None;
                tracing::debug!("retry wait woken through fifo");
                Ok(WakeReason::Woken)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Readiness {
    Ready,
    TimedOut,
    Interrupted,
}

/// Wait until `fd` is readable, hung up, or `timeout` passes.
///
/// `poll(2)` has no descriptor-number ceiling, unlike `select(2)`.
pub(crate) fn wait_readable(fd: RawFd, timeout: Duration) -> io::Result<Readiness> {
    let mut pfd = libc::pollfd {
        fd,
        events: libc::POLLIN,
        revents: 0,
    };
    let millis = timeout.as_nanos().saturating_add(999_999) / 1_000_000;
    let millis = libc::c_int::try_from(millis).unwrap_or(libc::c_int::MAX);

    // SAFETY: pfd is a valid pollfd and the count matches.
    let r = unsafe { libc::poll(&mut pfd, 1, millis) };
    match r {
        0 => Ok(Readiness::TimedOut),
        r if r > 0 => Ok(Readiness::Ready),
        _ => {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                Ok(Readiness::Interrupted)
            } else {
                Err(err)
            }
        }
    }
}
