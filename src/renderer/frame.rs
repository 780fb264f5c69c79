//! The drawing surface: a 2D cell grid over region-resident storage.
//!
//! Two grids live inside the shared region (current and previous); the
//! compositor borrows the current one each frame through
//! [`SharedRegion::frame`]. All drawing primitives clip against an optional
//! [`ClipRect`] and alpha-blend translucent backgrounds over the existing
//! cell.
//!
//! [`SharedRegion::frame`]: crate::region::SharedRegion

use crate::layout::char_width;
use crate::region::SharedRegion;
use crate::types::{Attr, BorderStyle, Cell, ClipRect, Rgba};

/// A mutable view over one framebuffer: flat row-major cells.
pub struct Frame<'a> {
    cells: &'a mut [Cell],
    width: u16,
    height: u16,
}

impl<'a> Frame<'a> {
    /// Wrap a cell slice. `cells.len()` must cover `width * height`.
    pub fn new(cells: &'a mut [Cell], width: u16, height: u16) -> Self {
        assert!(cells.len() >= width as usize * height as usize);
        Self { cells, width, height }
    }

    /// Borrow framebuffer slot 0 or 1 of a region at the given viewport.
    /// The viewport must fit the reserved area (the engine clamps first).
    pub fn in_region(region: &'a SharedRegion, slot: usize, width: u16, height: u16) -> Self {
        let needed = width as usize * height as usize;
        assert!(needed <= region.framebuffer_capacity());
        // SAFETY: the slot covers framebuffer_capacity cells inside the
        // region; slots 0 and 1 are disjoint. Only the renderer thread
        // touches framebuffer memory.
        let cells = unsafe { std::slice::from_raw_parts_mut(region.framebuffer_ptr(slot), needed) };
        Self { cells, width, height }
    }

    #[inline]
    pub fn width(&self) -> u16 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u16 {
        self.height
    }

    #[inline]
    fn index(&self, x: u16, y: u16) -> usize {
        y as usize * self.width as usize + x as usize
    }

    #[inline]
    pub fn in_bounds(&self, x: u16, y: u16) -> bool {
        x < self.width && y < self.height
    }

    #[inline]
    pub fn get(&self, x: u16, y: u16) -> Option<&Cell> {
        if self.in_bounds(x, y) {
            Some(&self.cells[self.index(x, y)])
        } else {
            None
        }
    }

    #[inline]
    pub fn cells(&self) -> &[Cell] {
        self.cells
    }

    /// Reset every cell to the default (empty glyph, terminal colors).
    pub fn clear(&mut self) {
        self.cells[..self.width as usize * self.height as usize].fill(Cell::EMPTY);
    }

    /// Fill with the sentinel that matches no composited cell, forcing the
    /// next diff to repaint everything.
    pub fn invalidate(&mut self) {
        self.cells[..self.width as usize * self.height as usize].fill(Cell::INVALID);
    }

    /// Write one cell, honoring the clip rect and blending a translucent
    /// background over what is already there.
    pub fn set_cell(
        &mut self,
        x: u16,
        y: u16,
        glyph: u32,
        fg: Rgba,
        bg: Rgba,
        attrs: Attr,
        clip: Option<&ClipRect>,
    ) -> bool {
        if !self.in_bounds(x, y) {
            return false;
        }
        if let Some(clip) = clip {
            if !clip.contains(x, y) {
                return false;
            }
        }

        let idx = self.index(x, y);
        let cell = &mut self.cells[idx];
        let blended_bg = if bg.is_opaque() || bg.is_terminal_default() || bg.is_ansi() {
            bg
        } else {
            Rgba::blend(bg, cell.bg_rgba())
        };
        *cell = Cell::new(glyph, fg, blended_bg, attrs);
        true
    }

    /// Fill a rectangle's background, clearing glyphs.
    pub fn fill_rect(
        &mut self,
        x: u16,
        y: u16,
        width: u16,
        height: u16,
        bg: Rgba,
        clip: Option<&ClipRect>,
    ) {
        let mut x1 = x;
        let mut y1 = y;
        let mut x2 = x.saturating_add(width).min(self.width);
        let mut y2 = y.saturating_add(height).min(self.height);

        if let Some(clip) = clip {
            let Some((cx, cy, cw, ch)) = clip.visible_on_screen() else { return };
            x1 = x1.max(cx);
            y1 = y1.max(cy);
            x2 = x2.min(cx + cw);
            y2 = y2.min(cy + ch);
        }
        if x2 <= x1 || y2 <= y1 {
            return;
        }

        let opaque = bg.is_opaque() || bg.is_terminal_default() || bg.is_ansi();
        for row in y1..y2 {
            let start = self.index(x1, row);
            let end = self.index(x2, row);
            for cell in &mut self.cells[start..end] {
                let new_bg = if opaque { bg } else { Rgba::blend(bg, cell.bg_rgba()) };
                *cell = Cell::new(b' ' as u32, Rgba::TERMINAL_DEFAULT, new_bg, Attr::NONE);
            }
        }
    }

    /// Draw a single character.
    pub fn draw_char(
        &mut self,
        x: u16,
        y: u16,
        c: char,
        fg: Rgba,
        bg: Rgba,
        attrs: Attr,
        clip: Option<&ClipRect>,
    ) -> bool {
        self.set_cell(x, y, c as u32, fg, bg, attrs, clip)
    }

    /// Draw a text run starting at (x, y). Wide glyphs take two cells, the
    /// trailing one marked as continuation. Returns cells consumed.
    pub fn draw_text(
        &mut self,
        x: u16,
        y: u16,
        text: &str,
        fg: Rgba,
        bg: Rgba,
        attrs: Attr,
        clip: Option<&ClipRect>,
    ) -> u16 {
        let mut col = x;
        for c in text.chars() {
            if col >= self.width {
                break;
            }
            let w = char_width(c);
            if w == 0 {
                continue;
            }

            if self.set_cell(col, y, c as u32, fg, bg, attrs, clip) && w == 2 {
                if col + 1 < self.width {
                    self.set_cell(col + 1, y, 0, fg, bg, attrs | Attr::WIDE_CONT, clip);
                }
            }
            col = col.saturating_add(w as u16);
        }
        col.saturating_sub(x)
    }

    /// Draw a rectangular border with the style's box-drawing characters.
    /// Sides with zero width are skipped.
    #[allow(clippy::too_many_arguments)]
    pub fn draw_border(
        &mut self,
        rect: ClipRect,
        style: BorderStyle,
        sides: (bool, bool, bool, bool), // top, right, bottom, left
        color: Rgba,
        bg: Rgba,
        clip: Option<&ClipRect>,
    ) {
        if style == BorderStyle::None || rect.width == 0 || rect.height == 0 {
            return;
        }
        let (horiz, vert, tl, tr, br, bl) = style.chars();
        let (top, right, bottom, left) = sides;
        let x1 = rect.x;
        let y1 = rect.y;
        let x2 = rect.x + rect.width as i32 - 1;
        let y2 = rect.y + rect.height as i32 - 1;

        let put = |fx: i32, fy: i32, c: char, frame: &mut Self| {
            if fx >= 0 && fy >= 0 {
                frame.draw_char(fx as u16, fy as u16, c, color, bg, Attr::NONE, clip);
            }
        };

        if top {
            for x in (x1 + 1)..x2 {
                put(x, y1, horiz, self);
            }
        }
        if bottom {
            for x in (x1 + 1)..x2 {
                put(x, y2, horiz, self);
            }
        }
        if left {
            for y in (y1 + 1)..y2 {
                put(x1, y, vert, self);
            }
        }
        if right {
            for y in (y1 + 1)..y2 {
                put(x2, y, vert, self);
            }
        }
        if top || left {
            put(x1, y1, tl, self);
        }
        if top || right {
            put(x2, y1, tr, self);
        }
        if bottom || right {
            put(x2, y2, br, self);
        }
        if bottom || left {
            put(x1, y2, bl, self);
        }
    }

    /// Vertical scrollbar along one column: '░' track, '█' thumb.
    #[allow(clippy::too_many_arguments)]
    pub fn draw_scrollbar(
        &mut self,
        x: u16,
        y: u16,
        height: u16,
        scroll_pos: f32,
        viewport_ratio: f32,
        color: Rgba,
        clip: Option<&ClipRect>,
    ) {
        if height == 0 {
            return;
        }
        let thumb_h = ((height as f32 * viewport_ratio).max(1.0) as u16).min(height);
        let track = height - thumb_h;
        let thumb_start = (track as f32 * scroll_pos.clamp(0.0, 1.0)).round() as u16;

        for row in 0..height {
            let is_thumb = row >= thumb_start && row < thumb_start + thumb_h;
            let (c, fg) = if is_thumb { ('█', color) } else { ('░', color.dim(0.4)) };
            self.draw_char(x, y + row, c, fg, Rgba::TRANSPARENT, Attr::NONE, clip);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(cells: &mut Vec<Cell>, w: u16, h: u16) -> Frame<'_> {
        cells.resize(w as usize * h as usize, Cell::EMPTY);
        Frame::new(cells, w, h)
    }

    #[test]
    fn set_and_get() {
        let mut cells = Vec::new();
        let mut f = frame(&mut cells, 10, 4);
        assert!(f.set_cell(3, 2, 'X' as u32, Rgba::RED, Rgba::BLACK, Attr::BOLD, None));
        let cell = f.get(3, 2).unwrap();
        assert_eq!(cell.glyph, 'X' as u32);
        assert_eq!(cell.fg_rgba(), Rgba::RED);
        assert!(cell.attr_flags().contains(Attr::BOLD));
        assert!(!f.set_cell(10, 0, 'X' as u32, Rgba::RED, Rgba::BLACK, Attr::NONE, None));
    }

    #[test]
    fn clip_blocks_out_of_rect_writes() {
        let mut cells = Vec::new();
        let mut f = frame(&mut cells, 10, 10);
        let clip = ClipRect::new(2, 2, 3, 3);
        assert!(!f.set_cell(0, 0, 'x' as u32, Rgba::WHITE, Rgba::BLACK, Attr::NONE, Some(&clip)));
        assert!(f.set_cell(2, 2, 'x' as u32, Rgba::WHITE, Rgba::BLACK, Attr::NONE, Some(&clip)));
    }

    #[test]
    fn fill_rect_respects_bounds() {
        let mut cells = Vec::new();
        let mut f = frame(&mut cells, 8, 8);
        f.fill_rect(2, 2, 4, 4, Rgba::BLUE, None);
        assert_eq!(f.get(2, 2).unwrap().bg_rgba(), Rgba::BLUE);
        assert_eq!(f.get(5, 5).unwrap().bg_rgba(), Rgba::BLUE);
        assert_eq!(f.get(1, 2).unwrap().bg_rgba(), Rgba::TERMINAL_DEFAULT);
        assert_eq!(f.get(6, 2).unwrap().bg_rgba(), Rgba::TERMINAL_DEFAULT);
    }

    #[test]
    fn translucent_fill_blends() {
        let mut cells = Vec::new();
        let mut f = frame(&mut cells, 4, 1);
        f.fill_rect(0, 0, 4, 1, Rgba::rgb(0, 0, 200), None);
        f.fill_rect(0, 0, 4, 1, Rgba::new(200, 0, 0, 128), None);
        let bg = f.get(0, 0).unwrap().bg_rgba();
        assert!(bg.r > 0 && bg.b > 0, "expected a blend, got {bg:?}");
    }

    #[test]
    fn wide_text_marks_continuation() {
        let mut cells = Vec::new();
        let mut f = frame(&mut cells, 10, 1);
        let used = f.draw_text(0, 0, "a你b", Rgba::WHITE, Rgba::TRANSPARENT, Attr::NONE, None);
        assert_eq!(used, 4);
        assert_eq!(f.get(0, 0).unwrap().glyph, 'a' as u32);
        assert_eq!(f.get(1, 0).unwrap().glyph, '你' as u32);
        assert!(f.get(2, 0).unwrap().is_wide_continuation());
        assert_eq!(f.get(3, 0).unwrap().glyph, 'b' as u32);
    }

    #[test]
    fn border_corners() {
        let mut cells = Vec::new();
        let mut f = frame(&mut cells, 10, 5);
        f.draw_border(
            ClipRect::new(0, 0, 10, 5),
            BorderStyle::Rounded,
            (true, true, true, true),
            Rgba::WHITE,
            Rgba::TRANSPARENT,
            None,
        );
        assert_eq!(f.get(0, 0).unwrap().glyph, '╭' as u32);
        assert_eq!(f.get(9, 0).unwrap().glyph, '╮' as u32);
        assert_eq!(f.get(9, 4).unwrap().glyph, '╯' as u32);
        assert_eq!(f.get(0, 4).unwrap().glyph, '╰' as u32);
        assert_eq!(f.get(5, 0).unwrap().glyph, '─' as u32);
        assert_eq!(f.get(0, 2).unwrap().glyph, '│' as u32);
    }

    #[test]
    fn region_backed_frames_are_disjoint() {
        let region = SharedRegion::create(crate::region::RegionConfig {
            max_nodes: 8,
            text_pool_size: 64,
            max_viewport_width: 20,
            max_viewport_height: 10,
            event_ring_capacity: 4,
        })
        .unwrap();
        {
            let mut cur = Frame::in_region(&region, 0, 20, 10);
            cur.clear();
            cur.set_cell(1, 1, 'c' as u32, Rgba::WHITE, Rgba::BLACK, Attr::NONE, None);
        }
        {
            let mut prev = Frame::in_region(&region, 1, 20, 10);
            prev.invalidate();
        }
        let cur = Frame::in_region(&region, 0, 20, 10);
        assert_eq!(cur.get(1, 1).unwrap().glyph, 'c' as u32);
    }
}
