//! Output batching and stateful cell emission.
//!
//! `OutputBuffer` accumulates a whole frame's escape stream so it reaches
//! the terminal in one write. `CellWriter` tracks the terminal's active
//! state (cursor position, colors, attributes) across the whole session,
//! not per frame, so a cell whose color is already active costs only its
//! glyph bytes and identical consecutive frames cost zero bytes.

use std::io::{self, Write};

use crate::types::{Attr, Cell};

use super::ansi;

// =============================================================================
// OutputBuffer
// =============================================================================

/// Accumulates frame output for a single flush.
#[derive(Debug, Default)]
pub struct OutputBuffer {
    data: Vec<u8>,
}

impl OutputBuffer {
    pub fn new() -> Self {
        Self { data: Vec::with_capacity(16 * 1024) }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn clear(&mut self) {
        self.data.clear();
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    pub fn write_codepoint(&mut self, cp: u32) {
        if let Some(c) = char::from_u32(cp) {
            let mut buf = [0u8; 4];
            self.data.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
        }
    }

    /// Flush accumulated bytes to a sink in one write. Returns the byte
    /// count; the buffer is cleared either way.
    pub fn flush_to<W: Write + ?Sized>(&mut self, sink: &mut W) -> io::Result<usize> {
        if self.data.is_empty() {
            return Ok(0);
        }
        sink.write_all(&self.data)?;
        sink.flush()?;
        let n = self.data.len();
        self.data.clear();
        Ok(n)
    }
}

impl Write for OutputBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.data.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

// =============================================================================
// CellWriter
// =============================================================================

/// Emits cells while tracking the terminal's active state.
///
/// State survives across frames: the attribute/color bytes a previous frame
/// left active are not re-emitted. `frame_end` restores the neutral SGR
/// state only when attribute bits are active, so plain-color runs persist.
#[derive(Debug)]
pub struct CellWriter {
    cursor_x: i32,
    cursor_y: i32,
    fg: Option<u32>,
    bg: Option<u32>,
    attrs: Attr,
}

impl CellWriter {
    pub fn new() -> Self {
        Self { cursor_x: -1, cursor_y: -1, fg: None, bg: None, attrs: Attr::NONE }
    }

    /// Forget everything; the next cell re-emits cursor, colors, attributes.
    /// Call after anything else may have touched the terminal.
    pub fn reset(&mut self) {
        self.cursor_x = -1;
        self.cursor_y = -1;
        self.fg = None;
        self.bg = None;
        self.attrs = Attr::NONE;
    }

    /// Emit one cell at (x, y), writing only the state that differs from
    /// what the terminal already has active.
    pub fn emit(&mut self, out: &mut OutputBuffer, x: u16, y: u16, cell: &Cell) {
        // The trailing half of a wide glyph was painted by its leading half.
        if cell.is_wide_continuation() {
            self.cursor_x = x as i32;
            self.cursor_y = y as i32;
            return;
        }

        if y as i32 != self.cursor_y || x as i32 != self.cursor_x + 1 {
            ansi::cursor_to(out, x, y).ok();
        }

        let cell_attrs = cell.attr_flags().sgr_bits();
        if cell_attrs != self.attrs {
            // SGR attribute bits cannot be cleared individually in a portable
            // way: reset, then rebuild, which also invalidates colors.
            ansi::reset(out).ok();
            if !cell_attrs.is_empty() {
                ansi::attrs(out, cell_attrs).ok();
            }
            self.fg = None;
            self.bg = None;
            self.attrs = cell_attrs;
        }

        if self.fg != Some(cell.fg) {
            ansi::fg(out, cell.fg_rgba()).ok();
            self.fg = Some(cell.fg);
        }
        if self.bg != Some(cell.bg) {
            ansi::bg(out, cell.bg_rgba()).ok();
            self.bg = Some(cell.bg);
        }

        out.write_codepoint(if cell.glyph == 0 { b' ' as u32 } else { cell.glyph });

        // A wide glyph advances the cursor two columns.
        let advance = if crate::layout::char_width(char::from_u32(cell.glyph).unwrap_or(' ')) == 2 {
            2
        } else {
            1
        };
        self.cursor_x = x as i32 + advance - 1;
        self.cursor_y = y as i32;
    }

    /// End-of-frame: drop back to neutral SGR only if attribute bits are
    /// active (color-only state persists and keeps future frames small).
    pub fn frame_end(&mut self, out: &mut OutputBuffer) {
        if !self.attrs.is_empty() {
            ansi::reset(out).ok();
            self.fg = None;
            self.bg = None;
            self.attrs = Attr::NONE;
        }
    }
}

impl Default for CellWriter {
    fn default() -> Self {
        Self::new()
    }
}
