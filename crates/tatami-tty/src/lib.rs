#![forbid(unsafe_code)]

//! Raw-mode terminal session for the tatami toolkit.
//!
//! Owns the controlling terminal for the lifetime of the application:
//! termios raw mode with RAII restore, the xterm mode handshake on open and
//! teardown on drop, window-size queries, SIGWINCH delivery, and one-code-
//! point-at-a-time input reads.
//!
//! ## Escape sequences
//!
//! | Purpose            | Enable                          | Disable                |
//! |--------------------|---------------------------------|------------------------|
//! | Mouse + alt screen | `CSI ?1003;1005 h CSI >2p CSI ?1049 h` | `CSI ?1003;1005 l CSI ?1049 l` |
//! | Meta sends escape  | `CSI ?1036 h CSI ?1034 l`       | —                      |
//! | Cursor visibility  | `CSI ?25 h`                     | `CSI ?25 l`            |

use std::io::{self, Read, Write};
use std::sync::mpsc;
use std::time::Duration;

use nix::poll::{PollFd, PollFlags, PollTimeout};
use nix::sys::termios::{self, SetArg, SpecialCharacterIndices};
use signal_hook::consts::signal::SIGWINCH;
use signal_hook::iterator::Signals;
use tatami_core::utf8::Utf8Decoder;
use tracing::{debug, warn};

/// Any-event mouse tracking (1003), UTF-8 coordinates (1005), xterm mouse
/// resource, and the alternate screen.
pub const MOUSE_ENABLE: &str = "\x1b[?1003;1005h\x1b[>2p\x1b[?1049h";

/// Undo [`MOUSE_ENABLE`].
pub const MOUSE_DISABLE: &str = "\x1b[?1003;1005l\x1b[?1049l";

/// Meta key prefixes ESC rather than setting the high bit.
pub const META_SENDS_ESCAPE: &str = "\x1b[?1036h\x1b[?1034l";

/// Show the cursor.
pub const CURSOR_SHOW: &str = "\x1b[?25h";

/// Hide the cursor.
pub const CURSOR_HIDE: &str = "\x1b[?25l";

/// Largest chunk read from the terminal per poll.
const READ_CHUNK: usize = 1024;

// ── Raw mode ─────────────────────────────────────────────────────────────

/// RAII guard that snapshots termios on entry and restores it on drop.
///
/// This is the only piece of process-wide terminal state; holding the
/// restore in `Drop` keeps the terminal sane on every exit path including
/// panic unwinds.
pub struct RawModeGuard {
    original: termios::Termios,
    tty: std::fs::File,
}

impl RawModeGuard {
    /// Put the controlling terminal into raw mode: no canonical input, no
    /// echo, no signal generation, no output processing, 8-bit characters,
    /// one-byte minimum reads.
    pub fn enter() -> io::Result<Self> {
        let tty = std::fs::File::open("/dev/tty")?;
        let original = termios::tcgetattr(&tty).map_err(io::Error::other)?;

        let mut raw = original.clone();
        termios::cfmakeraw(&mut raw);
        raw.control_chars[SpecialCharacterIndices::VMIN as usize] = 1;
        raw.control_chars[SpecialCharacterIndices::VTIME as usize] = 0;
        termios::tcsetattr(&tty, SetArg::TCSAFLUSH, &raw).map_err(io::Error::other)?;

        debug!("entered raw mode");
        Ok(Self { original, tty })
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        // Best-effort restore; nowhere to report an error during teardown.
        let _ = termios::tcsetattr(&self.tty, SetArg::TCSAFLUSH, &self.original);
    }
}

// ── SIGWINCH ─────────────────────────────────────────────────────────────

/// Owns the SIGWINCH listener thread; dropping it stops the thread.
struct ResizeSignalGuard {
    handle: signal_hook::iterator::Handle,
    thread: Option<std::thread::JoinHandle<()>>,
}

impl ResizeSignalGuard {
    fn new(tx: mpsc::SyncSender<()>) -> io::Result<Self> {
        let mut signals = Signals::new([SIGWINCH]).map_err(io::Error::other)?;
        let handle = signals.handle();
        let thread = std::thread::spawn(move || {
            for _ in signals.forever() {
                // One pending notification is enough; the authoritative size
                // comes from the winsize ioctl when the event is generated.
                let _ = tx.try_send(());
            }
        });
        Ok(Self {
            handle,
            thread: Some(thread),
        })
    }
}

impl Drop for ResizeSignalGuard {
    fn drop(&mut self) {
        self.handle.close();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

// ── Session ──────────────────────────────────────────────────────────────

/// An open raw-mode session on the controlling terminal.
pub struct TtySession {
    // Field order matters: teardown sequences must go out while the
    // terminal is still in a known state, so `raw` drops last.
    tty: std::fs::File,
    utf8: Utf8Decoder,
    width: u16,
    height: u16,
    resize_rx: Option<mpsc::Receiver<()>>,
    _resize_guard: Option<ResizeSignalGuard>,
    raw: RawModeGuard,
}

impl TtySession {
    /// Enter raw mode, enable mouse reporting and the alternate screen, and
    /// start listening for window-size changes.
    pub fn open() -> io::Result<Self> {
        let raw = RawModeGuard::enter()?;
        let tty = std::fs::File::open("/dev/tty")?;

        let (width, height) = query_winsize(&tty).unwrap_or((80, 24));

        let (resize_guard, resize_rx) = {
            let (tx, rx) = mpsc::sync_channel(1);
            match ResizeSignalGuard::new(tx) {
                Ok(guard) => (Some(guard), Some(rx)),
                Err(err) => {
                    warn!(%err, "SIGWINCH listener unavailable; resize disabled");
                    (None, None)
                }
            }
        };

        let mut session = Self {
            tty,
            utf8: Utf8Decoder::new(),
            width,
            height,
            resize_rx,
            _resize_guard: resize_guard,
            raw,
        };
        session.write_str(MOUSE_ENABLE)?;
        session.write_str(META_SENDS_ESCAPE)?;
        session.write_str(CURSOR_HIDE)?;
        session.flush_output()?;
        debug!(width, height, "tty session open");
        Ok(session)
    }

    /// Current terminal size in columns and rows.
    #[must_use]
    pub fn size(&self) -> (u16, u16) {
        (self.width, self.height)
    }

    /// Wait up to `timeout` for input and return the code points read.
    ///
    /// Returns an empty vec on timeout. An error is unrecoverable; the main
    /// loop is expected to shut down.
    pub fn poll_input(&mut self, timeout: Duration) -> io::Result<Vec<char>> {
        let ready = {
            use std::os::fd::AsFd;
            let mut fds = [PollFd::new(self.tty.as_fd(), PollFlags::POLLIN)];
            let timeout_ms: u16 = timeout.as_millis().try_into().unwrap_or(u16::MAX);
            match nix::poll::poll(&mut fds, PollTimeout::from(timeout_ms)) {
                Ok(n) => n,
                Err(nix::errno::Errno::EINTR) => 0,
                Err(err) => return Err(io::Error::other(err)),
            }
        };
        if ready == 0 {
            return Ok(Vec::new());
        }

        let mut buf = [0u8; READ_CHUNK];
        let n = match self.tty.read(&mut buf) {
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "controlling terminal closed",
                ));
            }
            Ok(n) => n,
            Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => 0,
            Err(e) => return Err(e),
        };

        Ok(buf[..n].iter().filter_map(|&b| self.utf8.push(b)).collect())
    }

    /// A pending resize, if SIGWINCH fired since the last call.
    ///
    /// Re-queries the window size so the returned dimensions are current.
    pub fn take_resize(&mut self) -> Option<(u16, u16)> {
        let rx = self.resize_rx.as_ref()?;
        rx.try_recv().ok()?;
        if let Some((w, h)) = query_winsize(&self.tty) {
            self.width = w;
            self.height = h;
        }
        debug!(width = self.width, height = self.height, "terminal resized");
        Some((self.width, self.height))
    }

    /// Write bytes to the terminal.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<()> {
        io::stdout().write_all(bytes)
    }

    /// Write a string to the terminal.
    pub fn write_str(&mut self, s: &str) -> io::Result<()> {
        self.write_bytes(s.as_bytes())
    }

    /// Flush buffered output to the terminal.
    pub fn flush_output(&mut self) -> io::Result<()> {
        io::stdout().flush()
    }
}

impl Drop for TtySession {
    fn drop(&mut self) {
        let _ = self.write_str("\x1b[0m");
        let _ = self.write_str(CURSOR_SHOW);
        let _ = self.write_str(MOUSE_DISABLE);
        let _ = self.flush_output();
        debug!("tty session closed");
        // `raw` drops after this, restoring the original termios.
    }
}

/// Physical terminal size via the window-size ioctl.
fn query_winsize(tty: &std::fs::File) -> Option<(u16, u16)> {
    let ws = rustix::termios::tcgetwinsize(tty).ok()?;
    if ws.ws_col > 0 && ws.ws_row > 0 {
        Some((ws.ws_col, ws.ws_row))
    } else {
        None
    }
}
