// SPDX-License-Identifier: MIT
//
// Terminal control: line discipline, non-blocking stdin, and RAII cleanup.
//
// Safety: this module uses `unsafe` for termios (tcgetattr, tcsetattr),
// fcntl, isatty, and raw fd writes. These are the POSIX
// interfaces for terminal control. Each unsafe block is minimal.
#![allow(unsafe_code)]
//
// The renderer keeps the normal screen (frames are redrawn in place with a
// clear + home) and only needs two things from the tty: keystrokes delivered
// immediately without echo, and reads that never block. `TtySession` turns
// off ECHO and ICANON and sets O_NONBLOCK on stdin, then puts everything back
// on drop, or from the panic hook if the frame loop panics.
//
// On most terminals stdin and stdout share one open file description, so
// O_NONBLOCK leaks onto stdout too. `StdoutFd` therefore writes with a raw
// `write(2)` and surfaces EAGAIN as `WouldBlock`, which the output buffer
// retries.

use std::io::{self, Write};
use std::sync::{Mutex, Once};

// ─── Queries ─────────────────────────────────────────────────────────────────

/// Check whether stdin is connected to a terminal.
#[cfg(unix)]
#[must_use]
pub fn is_tty() -> bool {
    unsafe { libc::isatty(libc::STDIN_FILENO) != 0 }
}

#[cfg(not(unix))]
#[must_use]
pub fn is_tty() -> bool {
    false
}

// ─── Panic-Safe Restore ──────────────────────────────────────────────────────

/// Saved stdin state for the panic hook, which cannot reach the session.
#[cfg(unix)]
static SAVED_STATE: Mutex<Option<Saved>> = Mutex::new(None);

#[cfg(unix)]
#[derive(Clone, Copy)]
struct Saved {
    termios: libc::termios,
    status_flags: libc::c_int,
}

#[cfg(unix)]
fn restore_saved() {
    if let Ok(guard) = SAVED_STATE.lock() {
        if let Some(saved) = *guard {
            unsafe {
                let _ = libc::fcntl(libc::STDIN_FILENO, libc::F_SETFL, saved.status_flags);
                let _ = libc::tcsetattr(libc::STDIN_FILENO, libc::TCSANOW, &raw const saved.termios);
            }
        }
    }
}

/// End synchronized output, reset SGR attributes, show the cursor.
///
/// A frame interrupted mid-write leaves the terminal holding back output
/// and the cursor hidden; these three undo that.
const EMERGENCY_RESTORE: &[u8] = b"\x1b[?2026l\x1b[0m\x1b[?25h\n";

static PANIC_HOOK_INSTALLED: Once = Once::new();

/// Install a panic hook that restores the tty before the message prints.
fn install_panic_hook() {
    PANIC_HOOK_INSTALLED.call_once(|| {
        let original = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            #[cfg(unix)]
            restore_saved();

            emergency_restore();
            original(info);
        }));
    });
}

/// Write the restore sequence straight to fd 1, bypassing any lock.
fn emergency_restore() {
    #[cfg(unix)]
    unsafe {
        let _ = libc::write(
            libc::STDOUT_FILENO,
            EMERGENCY_RESTORE.as_ptr().cast::<libc::c_void>(),
            EMERGENCY_RESTORE.len(),
        );
    }

    #[cfg(not(unix))]
    {
        let _ = io::stdout().write_all(EMERGENCY_RESTORE);
        let _ = io::stdout().flush();
    }
}

// ─── TtySession ──────────────────────────────────────────────────────────────

/// Stdin configured for per-key, non-blocking, echo-free input.
///
/// Restored when dropped. When stdin is not a terminal the session is
/// inert: nothing is changed and nothing is restored.
pub struct TtySession {
    #[cfg(unix)]
    saved: Option<Saved>,
}

impl TtySession {
    /// Disable echo and canonical mode and make stdin non-blocking.
    ///
    /// # Errors
    ///
    /// Returns the OS error if the terminal attributes or file status
    /// flags cannot be read or changed.
    #[cfg(unix)]
    pub fn enter() -> io::Result<Self> {
        install_panic_hook();

        if !is_tty() {
            tracing::info!("stdin is not a terminal, leaving it untouched");
            return Ok(Self { saved: None });
        }

        let fd = libc::STDIN_FILENO;
        let saved = unsafe {
            let mut termios: libc::termios = std::mem::zeroed();
            if libc::tcgetattr(fd, &raw mut termios) != 0 {
                return Err(io::Error::last_os_error());
            }
            let status_flags = libc::fcntl(fd, libc::F_GETFL);
            if status_flags < 0 {
                return Err(io::Error::last_os_error());
            }
            Saved {
                termios,
                status_flags,
            }
        };

        if let Ok(mut guard) = SAVED_STATE.lock() {
            *guard = Some(saved);
        }

        unsafe {
            let mut termios = saved.termios;
            termios.c_lflag &= !(libc::ECHO | libc::ICANON);
            if libc::tcsetattr(fd, libc::TCSANOW, &raw const termios) != 0 {
                return Err(io::Error::last_os_error());
            }
            if libc::fcntl(fd, libc::F_SETFL, saved.status_flags | libc::O_NONBLOCK) != 0 {
                let err = io::Error::last_os_error();
                let _ = libc::tcsetattr(fd, libc::TCSANOW, &raw const saved.termios);
                return Err(err);
            }
        }

        tracing::info!("terminal input set to non-blocking, echo off");
        Ok(Self { saved: Some(saved) })
    }

    #[cfg(not(unix))]
    pub fn enter() -> io::Result<Self> {
        install_panic_hook();
        Ok(Self {})
    }

    /// Whether the session actually changed the terminal.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        #[cfg(unix)]
        {
            self.saved.is_some()
        }
        #[cfg(not(unix))]
        {
            false
        }
    }
}

impl Drop for TtySession {
    fn drop(&mut self) {
        #[cfg(unix)]
        if let Some(saved) = self.saved.take() {
            unsafe {
                let _ = libc::fcntl(libc::STDIN_FILENO, libc::F_SETFL, saved.status_flags);
                let _ = libc::tcsetattr(libc::STDIN_FILENO, libc::TCSANOW, &raw const saved.termios);
            }
            if let Ok(mut guard) = SAVED_STATE.lock() {
                *guard = None;
            }
            emergency_restore();
        }
    }
}

// ─── StdoutFd ────────────────────────────────────────────────────────────────

/// Unbuffered writer on fd 1 that reports EAGAIN instead of hiding it.
///
/// Pair with [`OutputBuffer::flush_to`](crate::output::OutputBuffer::flush_to),
/// which retries `WouldBlock`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutFd;

impl Write for StdoutFd {
    #[cfg(unix)]
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = unsafe {
            libc::write(
                libc::STDOUT_FILENO,
                buf.as_ptr().cast::<libc::c_void>(),
                buf.len(),
            )
        };
        if n < 0 {
            return Err(io::Error::last_os_error());
        }
        #[allow(clippy::cast_sign_loss)] // n >= 0 checked above.
        Ok(n as usize)
    }

    #[cfg(not(unix))]
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::stdout().write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
