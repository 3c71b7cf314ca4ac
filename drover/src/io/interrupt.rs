//! Interruptible wait between sessions.
//!
//! Opens a bounded window in which any keypress stops the loop. Raw mode is
//! scoped to the wait and restored on every exit path, including panics, via
//! an RAII guard.

use std::io::{IsTerminal, Write};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyEventKind};
use crossterm::terminal;

/// Granularity of the keypress poll.
pub const INPUT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Seam between the loop controller and the operator's terminal.
pub trait StopPrompt {
    /// Block for up to `timeout`, returning true iff the operator requested a
    /// stop. Must never block when no interactive input is available.
    fn wait_for_stop(&self, timeout: Duration) -> Result<bool>;
}

/// Production prompt: bell, raw mode, single consumed keypress.
pub struct KeypressPrompt;

impl StopPrompt for KeypressPrompt {
    fn wait_for_stop(&self, timeout: Duration) -> Result<bool> {
        if timeout.is_zero() || !std::io::stdin().is_terminal() {
            return Ok(false);
        }

        ring_bell();
        let _guard = RawModeGuard::enable()?;
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok(false);
            }
            if event::poll(remaining.min(INPUT_POLL_INTERVAL)).context("poll terminal input")? {
                match event::read().context("read terminal input")? {
                    // Any key counts as "stop"; exactly this one event is consumed.
                    Event::Key(key) if key.kind == KeyEventKind::Press => return Ok(true),
                    // Key releases, resizes, focus changes: not a stop request.
                    _ => {}
                }
            }
        }
    }
}

/// Signal that the stop window has opened.
fn ring_bell() {
    let mut stderr = std::io::stderr();
    let _ = stderr.write_all(b"\x07");
    let _ = stderr.flush();
}

struct RawModeGuard;

impl RawModeGuard {
    fn enable() -> Result<Self> {
        terminal::enable_raw_mode().context("enable raw terminal mode")?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Without a TTY on stdin (the test environment) the wait must return
    /// immediately rather than blocking a non-interactive run.
    #[test]
    fn returns_false_immediately_without_a_terminal() {
        if std::io::stdin().is_terminal() {
            // Interactive dev shell: the non-interactive path is not in play.
            return;
        }
        let start = Instant::now();
        let stopped = KeypressPrompt
            .wait_for_stop(Duration::from_secs(10))
            .expect("wait");
        assert!(!stopped);
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn zero_window_never_waits() {
        let stopped = KeypressPrompt.wait_for_stop(Duration::ZERO).expect("wait");
        assert!(!stopped);
    }
}
