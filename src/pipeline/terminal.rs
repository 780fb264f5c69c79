//! Terminal mode setup and restoration.
//!
//! Raw mode comes from crossterm; screen state (alternate buffer, cursor,
//! mouse reporting) is emitted directly as escape sequences. When stdout is
//! not a terminal (tests, pipes) everything degrades to a no-op and the
//! engine still renders.

use std::io::{self, Write};

use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::tty::IsTty;

use crate::renderer::ansi;

pub struct TerminalGuard {
    active: bool,
}

impl TerminalGuard {
    pub fn new() -> Self {
        Self { active: false }
    }

    /// Current terminal size in cells, if stdout is a terminal.
    pub fn size() -> Option<(u16, u16)> {
        crossterm::terminal::size().ok()
    }

    /// Enter raw mode + alternate screen + mouse reporting. No-op when
    /// stdout is not a TTY.
    pub fn enter(&mut self) -> io::Result<()> {
        let mut stdout = io::stdout();
        if !stdout.is_tty() {
            return Ok(());
        }
        enable_raw_mode()?;
        ansi::enter_alt_screen(&mut stdout)?;
        ansi::cursor_hide(&mut stdout)?;
        ansi::clear_screen(&mut stdout)?;
        ansi::enable_mouse(&mut stdout)?;
        stdout.flush()?;
        self.active = true;
        Ok(())
    }

    /// Restore the terminal: neutral SGR, cursor, main screen, cooked mode.
    pub fn exit(&mut self) -> io::Result<()> {
        if !self.active {
            return Ok(());
        }
        let mut stdout = io::stdout();
        ansi::disable_mouse(&mut stdout)?;
        ansi::reset(&mut stdout)?;
        ansi::cursor_show(&mut stdout)?;
        ansi::exit_alt_screen(&mut stdout)?;
        stdout.flush()?;
        disable_raw_mode()?;
        self.active = false;
        Ok(())
    }
}

impl Default for TerminalGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = self.exit();
    }
}
