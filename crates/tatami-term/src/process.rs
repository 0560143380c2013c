//! Child process plumbing for the embedded terminal.
//!
//! The child runs in its own session (via `setsid`) with stdin on a pipe
//! and stdout+stderr merged onto a second pipe. No pseudoterminal is
//! allocated, so programs that insist on a real TTY will not behave; the
//! seam where a PTY would slot in is exactly this module.

use std::io::{self, Write};
use std::os::fd::OwnedFd;
use std::process::{Child, ChildStdin, Command, Stdio};

use nix::errno::Errno;
use nix::fcntl::{FcntlArg, OFlag, fcntl};
use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid;
use tracing::{debug, warn};

/// Cap on bytes consumed from the child per idle tick, to keep the UI
/// responsive under a flooding child.
pub const READ_LIMIT: usize = 1024;

/// What a poll of the child's output produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildOutput {
    /// `n` bytes were read (possibly zero when nothing is pending).
    Bytes(usize),
    /// The child closed its side; no further output will arrive.
    Eof,
}

/// A child process on pipes: piped stdin, merged stdout+stderr.
pub struct ChildProcess {
    child: Child,
    stdin: Option<ChildStdin>,
    /// Read end of the merged output pipe, non-blocking.
    output: OwnedFd,
    eof: bool,
}

impl std::fmt::Debug for ChildProcess {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChildProcess")
            .field("pid", &self.child.id())
            .field("eof", &self.eof)
            .finish_non_exhaustive()
    }
}

impl ChildProcess {
    /// Spawn the default interactive shell.
    pub fn spawn_shell() -> io::Result<Self> {
        Self::spawn("/bin/bash", &["-i"])
    }

    /// Spawn `program` with `args` in a new session.
    pub fn spawn(program: &str, args: &[&str]) -> io::Result<Self> {
        let (read_end, write_end) = nix::unistd::pipe().map_err(io::Error::other)?;
        let write_for_stderr = write_end.try_clone()?;

        // The read side must never block the UI loop.
        let flags = fcntl(&read_end, FcntlArg::F_GETFL).map_err(io::Error::other)?;
        let flags = OFlag::from_bits_retain(flags) | OFlag::O_NONBLOCK;
        fcntl(&read_end, FcntlArg::F_SETFL(flags)).map_err(io::Error::other)?;

        let child = Command::new("setsid")
            .arg(program)
            .args(args)
            .env("TERM", "vt102")
            .stdin(Stdio::piped())
            .stdout(Stdio::from(write_end))
            .stderr(Stdio::from(write_for_stderr))
            .spawn()?;

        debug!(pid = child.id(), program, "child process spawned");
        let mut child = child;
        let stdin = child.stdin.take();
        Ok(Self {
            child,
            stdin,
            output: read_end,
            eof: false,
        })
    }

    /// Process id of the direct child.
    #[must_use]
    pub fn pid(&self) -> u32 {
        self.child.id()
    }

    /// Non-blocking read of available output into `buf`.
    pub fn read_available(&mut self, buf: &mut [u8]) -> ChildOutput {
        if self.eof {
            return ChildOutput::Eof;
        }
        match nix::unistd::read(&self.output, buf) {
            Ok(0) => {
                self.eof = true;
                ChildOutput::Eof
            }
            Ok(n) => ChildOutput::Bytes(n),
            Err(Errno::EAGAIN) => ChildOutput::Bytes(0),
            Err(err) => {
                warn!(%err, "child output read failed");
                self.eof = true;
                ChildOutput::Eof
            }
        }
    }

    /// Best-effort write to the child's stdin; errors are swallowed since a
    /// dying child already surfaces through `read_available`.
    pub fn write_input(&mut self, bytes: &[u8]) {
        if bytes.is_empty() {
            return;
        }
        if let Some(stdin) = &mut self.stdin
            && let Err(err) = stdin.write_all(bytes).and_then(|()| stdin.flush())
        {
            warn!(%err, "write to child stdin dropped");
            self.stdin = None;
        }
    }

    /// Whether the child has not yet been reaped.
    pub fn is_alive(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }

    /// Terminate and reap the child.
    pub fn terminate(&mut self) {
        self.stdin = None;
        if let Ok(Some(_)) = self.child.try_wait() {
            return;
        }
        let _ = kill(Pid::from_raw(self.child.id() as i32), Signal::SIGTERM);
        let _ = self.child.wait();
        debug!(pid = self.child.id(), "child process reaped");
    }
}

impl Drop for ChildProcess {
    fn drop(&mut self) {
        self.terminate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    /// Poll until some output or EOF arrives, with a deadline.
    fn read_all(child: &mut ChildProcess, deadline: Duration) -> Vec<u8> {
        let start = Instant::now();
        let mut out = Vec::new();
        let mut buf = [0u8; READ_LIMIT];
        while start.elapsed() < deadline {
            match child.read_available(&mut buf) {
                ChildOutput::Bytes(0) => std::thread::sleep(Duration::from_millis(10)),
                ChildOutput::Bytes(n) => out.extend_from_slice(&buf[..n]),
                ChildOutput::Eof => break,
            }
        }
        out
    }

    #[test]
    fn captures_stdout() {
        let mut child = ChildProcess::spawn("/bin/sh", &["-c", "printf hello"]).unwrap();
        let out = read_all(&mut child, Duration::from_secs(5));
        assert_eq!(out, b"hello");
    }

    #[test]
    fn stderr_is_merged() {
        let mut child =
            ChildProcess::spawn("/bin/sh", &["-c", "printf err 1>&2"]).unwrap();
        let out = read_all(&mut child, Duration::from_secs(5));
        assert_eq!(out, b"err");
    }

    #[test]
    fn eof_after_exit() {
        let mut child = ChildProcess::spawn("/bin/sh", &["-c", "exit 0"]).unwrap();
        let _ = read_all(&mut child, Duration::from_secs(5));
        let mut buf = [0u8; 8];
        assert_eq!(child.read_available(&mut buf), ChildOutput::Eof);
        // Eof is sticky.
        assert_eq!(child.read_available(&mut buf), ChildOutput::Eof);
    }

    #[test]
    fn stdin_round_trip() {
        let mut child = ChildProcess::spawn("/bin/sh", &["-c", "read line; printf '%s' \"$line\""])
            .unwrap();
        child.write_input(b"ping\n");
        let out = read_all(&mut child, Duration::from_secs(5));
        assert_eq!(out, b"ping");
    }

    #[test]
    fn terminate_reaps() {
        let mut child = ChildProcess::spawn("/bin/sh", &["-c", "sleep 30"]).unwrap();
        assert!(child.is_alive());
        child.terminate();
        assert!(!child.is_alive());
    }

    #[test]
    fn write_after_close_is_ignored() {
        let mut child = ChildProcess::spawn("/bin/sh", &["-c", "exit 0"]).unwrap();
        let _ = read_all(&mut child, Duration::from_secs(5));
        // The shell is gone; writes must not panic or error out.
        child.write_input(b"anyone there?\n");
        child.write_input(b"still fine\n");
    }
}
