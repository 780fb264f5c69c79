//! Differential frame emission.
//!
//! Compares the composited frame against the last-emitted one cell by cell
//! and produces the minimal escape stream: cursor re-addressing only at
//! discontinuities, SGR only when the terminal's active state differs, no
//! bytes at all for identical frames. The whole stream reaches the sink in
//! a single write.

use std::io::{self, Write};

use super::frame::Frame;
use super::output::{CellWriter, OutputBuffer};

/// Diff renderer state: the batch buffer and the terminal-state tracker,
/// both persistent across frames.
pub struct DiffRenderer {
    output: OutputBuffer,
    writer: CellWriter,
}

impl DiffRenderer {
    pub fn new() -> Self {
        Self { output: OutputBuffer::new(), writer: CellWriter::new() }
    }

    /// Emit the delta between `current` and `previous` to `sink`.
    ///
    /// Returns the number of bytes written; zero when the frames are
    /// identical. The caller owns the current/previous role swap.
    pub fn render<W: Write + ?Sized>(
        &mut self,
        current: &Frame<'_>,
        previous: &Frame<'_>,
        sink: &mut W,
    ) -> io::Result<usize> {
        debug_assert_eq!(current.width(), previous.width());
        debug_assert_eq!(current.height(), previous.height());

        let width = current.width();
        let height = current.height();
        for y in 0..height {
            for x in 0..width {
                let cell = current.get(x, y).expect("in bounds");
                if previous.get(x, y) == Some(cell) {
                    continue;
                }
                self.writer.emit(&mut self.output, x, y, cell);
            }
        }
        self.writer.frame_end(&mut self.output);
        self.output.flush_to(sink)
    }

    /// Forget tracked terminal state (cursor, colors, attributes). Call when
    /// something outside the diff stream touched the terminal, e.g. after a
    /// resize repaint or re-entering the alternate screen.
    pub fn reset_terminal_state(&mut self) {
        self.writer.reset();
    }
}

impl Default for DiffRenderer {
    fn default() -> Self {
        Self::new()
    }
}
