//! ANSI/VT escape sequence emission.
//!
//! Cursor addressing, colors (terminal default, 256-color palette,
//! truecolor), text attributes, screen and mode control. Everything writes
//! into a `io::Write` sink so sequences batch into the frame's output
//! buffer.

use std::io::{self, Write};

use crate::types::{Attr, Rgba};

/// Move the cursor to a 0-indexed cell position (emitted 1-indexed).
#[inline]
pub fn cursor_to<W: Write>(w: &mut W, x: u16, y: u16) -> io::Result<()> {
    write!(w, "\x1b[{};{}H", y + 1, x + 1)
}

#[inline]
pub fn cursor_hide<W: Write>(w: &mut W) -> io::Result<()> {
    write!(w, "\x1b[?25l")
}

#[inline]
pub fn cursor_show<W: Write>(w: &mut W) -> io::Result<()> {
    write!(w, "\x1b[?25h")
}

/// Clear screen and scrollback, cursor home.
#[inline]
pub fn clear_screen<W: Write>(w: &mut W) -> io::Result<()> {
    write!(w, "\x1b[2J\x1b[3J\x1b[H")
}

#[inline]
pub fn enter_alt_screen<W: Write>(w: &mut W) -> io::Result<()> {
    write!(w, "\x1b[?1049h")
}

#[inline]
pub fn exit_alt_screen<W: Write>(w: &mut W) -> io::Result<()> {
    write!(w, "\x1b[?1049l")
}

/// Enable SGR-extended mouse reporting (clicks + motion).
#[inline]
pub fn enable_mouse<W: Write>(w: &mut W) -> io::Result<()> {
    write!(w, "\x1b[?1000h\x1b[?1002h\x1b[?1006h")
}

#[inline]
pub fn disable_mouse<W: Write>(w: &mut W) -> io::Result<()> {
    write!(w, "\x1b[?1006l\x1b[?1002l\x1b[?1000l")
}

/// Reset all attributes and colors to the terminal's neutral state.
#[inline]
pub fn reset<W: Write>(w: &mut W) -> io::Result<()> {
    write!(w, "\x1b[0m")
}

/// Set the foreground color.
pub fn fg<W: Write>(w: &mut W, color: Rgba) -> io::Result<()> {
    if color.is_terminal_default() {
        write!(w, "\x1b[39m")
    } else if color.is_ansi() {
        let index = color.ansi_index();
        if index < 8 {
            write!(w, "\x1b[{}m", 30 + index)
        } else if index < 16 {
            write!(w, "\x1b[{}m", 90 + index - 8)
        } else {
            write!(w, "\x1b[38;5;{}m", index)
        }
    } else {
        write!(w, "\x1b[38;2;{};{};{}m", color.r, color.g, color.b)
    }
}

/// Set the background color.
pub fn bg<W: Write>(w: &mut W, color: Rgba) -> io::Result<()> {
    if color.is_terminal_default() {
        write!(w, "\x1b[49m")
    } else if color.is_ansi() {
        let index = color.ansi_index();
        if index < 8 {
            write!(w, "\x1b[{}m", 40 + index)
        } else if index < 16 {
            write!(w, "\x1b[{}m", 100 + index - 8)
        } else {
            write!(w, "\x1b[48;5;{}m", index)
        }
    } else {
        write!(w, "\x1b[48;2;{};{};{}m", color.r, color.g, color.b)
    }
}

/// Emit the SGR codes for a set of attribute bits (the wide-continuation
/// marker is not an SGR and is masked out).
pub fn attrs<W: Write>(w: &mut W, attr: Attr) -> io::Result<()> {
    let attr = attr.sgr_bits();
    if attr.is_empty() {
        return Ok(());
    }

    write!(w, "\x1b[")?;
    let mut first = true;
    let mut emit = |w: &mut W, code: u8| -> io::Result<()> {
        if !first {
            write!(w, ";")?;
        }
        first = false;
        write!(w, "{}", code)
    };
    if attr.contains(Attr::BOLD) {
        emit(w, 1)?;
    }
    if attr.contains(Attr::DIM) {
        emit(w, 2)?;
    }
    if attr.contains(Attr::ITALIC) {
        emit(w, 3)?;
    }
    if attr.contains(Attr::UNDERLINE) {
        emit(w, 4)?;
    }
    if attr.contains(Attr::INVERSE) {
        emit(w, 7)?;
    }
    if attr.contains(Attr::STRIKETHROUGH) {
        emit(w, 9)?;
    }
    write!(w, "m")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capture<F: FnOnce(&mut Vec<u8>) -> io::Result<()>>(f: F) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn cursor_is_one_indexed() {
        assert_eq!(capture(|w| cursor_to(w, 0, 0)), "\x1b[1;1H");
        assert_eq!(capture(|w| cursor_to(w, 5, 3)), "\x1b[4;6H");
    }

    #[test]
    fn fg_encodings() {
        assert_eq!(capture(|w| fg(w, Rgba::TERMINAL_DEFAULT)), "\x1b[39m");
        assert_eq!(capture(|w| fg(w, Rgba::ansi(1))), "\x1b[31m");
        assert_eq!(capture(|w| fg(w, Rgba::ansi(9))), "\x1b[91m");
        assert_eq!(capture(|w| fg(w, Rgba::ansi(196))), "\x1b[38;5;196m");
        assert_eq!(capture(|w| fg(w, Rgba::rgb(255, 0, 0))), "\x1b[38;2;255;0;0m");
    }

    #[test]
    fn bg_encodings() {
        assert_eq!(capture(|w| bg(w, Rgba::TERMINAL_DEFAULT)), "\x1b[49m");
        assert_eq!(capture(|w| bg(w, Rgba::ansi(4))), "\x1b[44m");
        assert_eq!(capture(|w| bg(w, Rgba::rgb(0, 128, 255))), "\x1b[48;2;0;128;255m");
    }

    #[test]
    fn attr_combinations() {
        assert_eq!(capture(|w| attrs(w, Attr::BOLD)), "\x1b[1m");
        assert_eq!(capture(|w| attrs(w, Attr::BOLD | Attr::UNDERLINE)), "\x1b[1;4m");
        assert_eq!(capture(|w| attrs(w, Attr::NONE)), "");
    }

    #[test]
    fn wide_continuation_never_reaches_sgr() {
        assert_eq!(capture(|w| attrs(w, Attr::WIDE_CONT)), "");
        assert_eq!(capture(|w| attrs(w, Attr::BOLD | Attr::WIDE_CONT)), "\x1b[1m");
    }
}
