//! Core types shared by the layout, compositing, and rendering stages.
//!
//! Everything here is plain data: colors, cell attributes, the framebuffer
//! cell itself, clip rectangles, and the enums mirrored by the node table's
//! byte-sized discriminants.

use bitflags::bitflags;

// =============================================================================
// Color
// =============================================================================

/// RGBA color with 8-bit channels.
///
/// Integer channels so cell comparison is exact. Two sentinel encodings ride
/// on the `r` channel:
/// - `r == -1`: terminal default (let the terminal pick)
/// - `r == -2`: ANSI palette color, index in `g`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgba {
    pub r: i16,
    pub g: i16,
    pub b: i16,
    pub a: i16,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r: r as i16, g: g as i16, b: b as i16, a: a as i16 }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    /// Terminal default color (SGR 39/49).
    pub const TERMINAL_DEFAULT: Self = Self { r: -1, g: -1, b: -1, a: -1 };

    pub const TRANSPARENT: Self = Self { r: 0, g: 0, b: 0, a: 0 };

    pub const BLACK: Self = Self::rgb(0, 0, 0);
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    pub const RED: Self = Self::rgb(255, 0, 0);
    pub const GREEN: Self = Self::rgb(0, 255, 0);
    pub const BLUE: Self = Self::rgb(0, 0, 255);
    pub const YELLOW: Self = Self::rgb(255, 255, 0);
    pub const GRAY: Self = Self::rgb(128, 128, 128);

    /// ANSI palette color (0-255): 0-7 standard, 8-15 bright, 16-231 cube,
    /// 232-255 grayscale.
    pub const fn ansi(index: u8) -> Self {
        Self { r: -2, g: index as i16, b: 0, a: 255 }
    }

    #[inline]
    pub const fn is_terminal_default(&self) -> bool {
        self.r == -1
    }

    #[inline]
    pub const fn is_ansi(&self) -> bool {
        self.r == -2
    }

    #[inline]
    pub const fn ansi_index(&self) -> u8 {
        self.g as u8
    }

    #[inline]
    pub const fn is_opaque(&self) -> bool {
        self.a == 255
    }

    #[inline]
    pub const fn is_transparent(&self) -> bool {
        self.a == 0
    }

    /// Porter-Duff "over". Sentinel colors are treated as opaque.
    #[inline]
    pub fn blend(src: Self, dst: Self) -> Self {
        if src.is_opaque() || src.is_terminal_default() || src.is_ansi() {
            return src;
        }
        if src.is_transparent() {
            return dst;
        }

        let (dr, dg, db, da) = if dst.is_terminal_default() || dst.is_ansi() {
            (0i16, 0i16, 0i16, 255i16)
        } else {
            (dst.r, dst.g, dst.b, dst.a)
        };

        let sa = src.a as i32;
        let inv_sa = 255 - sa;
        let out_a = sa + (da as i32 * inv_sa) / 255;
        if out_a == 0 {
            return Self::TRANSPARENT;
        }

        let out_r = ((src.r as i32 * sa) + (dr as i32 * da as i32 * inv_sa / 255)) / out_a;
        let out_g = ((src.g as i32 * sa) + (dg as i32 * da as i32 * inv_sa / 255)) / out_a;
        let out_b = ((src.b as i32 * sa) + (db as i32 * da as i32 * inv_sa / 255)) / out_a;

        Self {
            r: out_r.clamp(0, 255) as i16,
            g: out_g.clamp(0, 255) as i16,
            b: out_b.clamp(0, 255) as i16,
            a: out_a.clamp(0, 255) as i16,
        }
    }

    /// Dim toward black by a factor (1.0 = unchanged).
    #[inline]
    pub fn dim(self, factor: f32) -> Self {
        if self.is_terminal_default() {
            return Self::GRAY;
        }
        if self.is_ansi() {
            return self;
        }
        Self {
            r: (self.r as f32 * factor).clamp(0.0, 255.0) as i16,
            g: (self.g as f32 * factor).clamp(0.0, 255.0) as i16,
            b: (self.b as f32 * factor).clamp(0.0, 255.0) as i16,
            a: self.a,
        }
    }

    /// Pack into the region's u32 color encoding.
    ///
    /// - terminal default → 0 (the same value the node table uses for inherit)
    /// - ANSI palette → alpha byte 1, index in the red byte
    /// - otherwise 0xAARRGGBB
    pub fn pack(self) -> u32 {
        if self.is_terminal_default() {
            return 0;
        }
        if self.is_ansi() {
            return (1u32 << 24) | ((self.ansi_index() as u32) << 16);
        }
        ((self.a as u32 & 0xFF) << 24)
            | ((self.r as u32 & 0xFF) << 16)
            | ((self.g as u32 & 0xFF) << 8)
            | (self.b as u32 & 0xFF)
    }

    /// Unpack the region's u32 color encoding. 0 means inherit at the node
    /// level and terminal default at the cell level; both map here.
    pub fn unpack(packed: u32) -> Self {
        if packed == 0 {
            return Self::TERMINAL_DEFAULT;
        }
        let a = ((packed >> 24) & 0xFF) as u8;
        if a == 1 {
            return Self::ansi(((packed >> 16) & 0xFF) as u8);
        }
        Self::new(
            ((packed >> 16) & 0xFF) as u8,
            ((packed >> 8) & 0xFF) as u8,
            (packed & 0xFF) as u8,
            a,
        )
    }
}

// =============================================================================
// Cell attributes
// =============================================================================

bitflags! {
    /// Per-cell text attributes. `WIDE_CONT` marks the trailing half of a
    /// width-2 glyph and never reaches the terminal as SGR.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Attr: u8 {
        const NONE = 0;
        const BOLD = 1 << 0;
        const DIM = 1 << 1;
        const ITALIC = 1 << 2;
        const UNDERLINE = 1 << 3;
        const INVERSE = 1 << 4;
        const STRIKETHROUGH = 1 << 5;
        const WIDE_CONT = 1 << 6;
    }
}

impl Attr {
    /// The attribute bits that translate to SGR codes.
    #[inline]
    pub fn sgr_bits(self) -> Attr {
        self & !Attr::WIDE_CONT
    }
}

// =============================================================================
// Cell
// =============================================================================

/// One framebuffer cell. 16-byte POD so the two frame grids can live inside
/// the shared region at stable offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct Cell {
    /// Unicode scalar value; 0 = empty / wide continuation.
    pub glyph: u32,
    /// Packed color (`Rgba::pack`); 0 = terminal default.
    pub fg: u32,
    pub bg: u32,
    pub attrs: u8,
    pub _pad: [u8; 3],
}

impl Cell {
    pub const EMPTY: Self = Self { glyph: b' ' as u32, fg: 0, bg: 0, attrs: 0, _pad: [0; 3] };

    /// Matches nothing a compositor can produce; written into the previous
    /// frame to force a full repaint.
    pub const INVALID: Self =
        Self { glyph: u32::MAX, fg: u32::MAX, bg: u32::MAX, attrs: u8::MAX, _pad: [0; 3] };

    pub fn new(glyph: u32, fg: Rgba, bg: Rgba, attrs: Attr) -> Self {
        Self { glyph, fg: fg.pack(), bg: bg.pack(), attrs: attrs.bits(), _pad: [0; 3] }
    }

    #[inline]
    pub fn fg_rgba(&self) -> Rgba {
        Rgba::unpack(self.fg)
    }

    #[inline]
    pub fn bg_rgba(&self) -> Rgba {
        Rgba::unpack(self.bg)
    }

    #[inline]
    pub fn attr_flags(&self) -> Attr {
        Attr::from_bits_truncate(self.attrs)
    }

    #[inline]
    pub fn is_wide_continuation(&self) -> bool {
        self.glyph == 0 && self.attr_flags().contains(Attr::WIDE_CONT)
    }
}

impl Default for Cell {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Byte stride of one cell inside the region.
pub const CELL_STRIDE: usize = std::mem::size_of::<Cell>();

// =============================================================================
// Clip rectangle
// =============================================================================

/// Clipping rectangle with signed position (content scrolled off-screen goes
/// negative) and unsigned extent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClipRect {
    pub x: i32,
    pub y: i32,
    pub width: u16,
    pub height: u16,
}

impl ClipRect {
    pub fn new(x: i32, y: i32, width: u16, height: u16) -> Self {
        Self { x, y, width, height }
    }

    #[inline]
    pub fn contains(&self, x: u16, y: u16) -> bool {
        self.contains_signed(x as i32, y as i32)
    }

    #[inline]
    pub fn contains_signed(&self, x: i32, y: i32) -> bool {
        x >= self.x
            && y >= self.y
            && x < self.x + self.width as i32
            && y < self.y + self.height as i32
    }

    /// Intersection, or None when the rects don't overlap.
    pub fn intersect(&self, other: &ClipRect) -> Option<ClipRect> {
        let x1 = self.x.max(other.x);
        let y1 = self.y.max(other.y);
        let x2 = (self.x + self.width as i32).min(other.x + other.width as i32);
        let y2 = (self.y + self.height as i32).min(other.y + other.height as i32);
        if x2 <= x1 || y2 <= y1 {
            return None;
        }
        Some(ClipRect::new(x1, y1, (x2 - x1) as u16, (y2 - y1) as u16))
    }

    /// The on-screen (non-negative) part as (x, y, w, h), or None when the
    /// rect is entirely off-screen.
    pub fn visible_on_screen(&self) -> Option<(u16, u16, u16, u16)> {
        let x1 = self.x.max(0);
        let y1 = self.y.max(0);
        let x2 = self.x + self.width as i32;
        let y2 = self.y + self.height as i32;
        if x2 <= x1 || y2 <= y1 {
            return None;
        }
        Some((x1 as u16, y1 as u16, (x2 - x1) as u16, (y2 - y1) as u16))
    }
}

// =============================================================================
// Node table enums
// =============================================================================

/// Border drawing style. Discriminants are the node-table bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum BorderStyle {
    #[default]
    None = 0,
    Single = 1,
    Double = 2,
    Rounded = 3,
    Thick = 4,
}

impl BorderStyle {
    pub fn from_u8(v: u8) -> Self {
        match v {
            1 => Self::Single,
            2 => Self::Double,
            3 => Self::Rounded,
            4 => Self::Thick,
            _ => Self::None,
        }
    }

    /// Box-drawing characters: (horizontal, vertical, tl, tr, br, bl).
    pub fn chars(self) -> (char, char, char, char, char, char) {
        match self {
            Self::None | Self::Single => ('─', '│', '┌', '┐', '┘', '└'),
            Self::Double => ('═', '║', '╔', '╗', '╝', '╚'),
            Self::Rounded => ('─', '│', '╭', '╮', '╯', '╰'),
            Self::Thick => ('━', '┃', '┏', '┓', '┛', '┗'),
        }
    }
}

/// Overflow behavior per axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum Overflow {
    #[default]
    Visible = 0,
    Hidden = 1,
    Scroll = 2,
    Auto = 3,
}

impl Overflow {
    pub fn from_u8(v: u8) -> Self {
        match v {
            1 => Self::Hidden,
            2 => Self::Scroll,
            3 => Self::Auto,
            _ => Self::Visible,
        }
    }

    /// Whether children are clipped to the inner box.
    #[inline]
    pub fn clips(self) -> bool {
        !matches!(self, Self::Visible)
    }
}

/// Horizontal text alignment inside a node's content box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum TextAlign {
    #[default]
    Left = 0,
    Center = 1,
    Right = 2,
}

impl TextAlign {
    pub fn from_u8(v: u8) -> Self {
        match v {
            1 => Self::Center,
            2 => Self::Right,
            _ => Self::Left,
        }
    }
}

/// Text overflow handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum TextWrap {
    /// Split on explicit newlines only; clip the rest.
    #[default]
    Clip = 0,
    /// Word-wrap to the content width.
    Wrap = 1,
    /// Single line, truncated with an ellipsis.
    Truncate = 2,
}

impl TextWrap {
    pub fn from_u8(v: u8) -> Self {
        match v {
            1 => Self::Wrap,
            2 => Self::Truncate,
            _ => Self::Clip,
        }
    }
}
