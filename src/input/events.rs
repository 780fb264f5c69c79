//! Event records posted to the shared region's ring buffer.
//!
//! The renderer's input router writes records; the producer-side event pump
//! consumes them. Records are fixed 32-byte slots:
//!
//! ```text
//! 0   kind (u8)
//! 1   consumed (u8)
//! 2   pad (u16)
//! 4   target node index (u32)
//! 8   timestamp, µs since engine start (u64)
//! 16  payload (16 bytes, kind-specific)
//! ```

use bitflags::bitflags;

/// Event kinds carried through the ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum EventKind {
    None = 0,
    KeyPress = 1,
    KeyRelease = 2,
    KeyRepeat = 3,
    MouseMove = 4,
    MousePress = 5,
    MouseRelease = 6,
    Click = 7,
    MouseEnter = 8,
    MouseLeave = 9,
    Scroll = 10,
    Focus = 11,
    Blur = 12,
    Resize = 13,
    Exit = 14,
}

impl EventKind {
    pub fn from_u8(v: u8) -> Self {
        match v {
            1 => Self::KeyPress,
            2 => Self::KeyRelease,
            3 => Self::KeyRepeat,
            4 => Self::MouseMove,
            5 => Self::MousePress,
            6 => Self::MouseRelease,
            7 => Self::Click,
            8 => Self::MouseEnter,
            9 => Self::MouseLeave,
            10 => Self::Scroll,
            11 => Self::Focus,
            12 => Self::Blur,
            13 => Self::Resize,
            14 => Self::Exit,
            _ => Self::None,
        }
    }
}

bitflags! {
    /// Per-node event subscription bitmap (the `event_mask` node column).
    /// A set bit means the producer registered a handler for that family;
    /// the router uses it to decide consumption. `CAPTURE` marks the node's
    /// handlers as capture-phase.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct EventMask: u32 {
        const KEY = 1 << 0;
        const MOUSE = 1 << 1;
        const CLICK = 1 << 2;
        const SCROLL = 1 << 3;
        const FOCUS = 1 << 4;
        const HOVER = 1 << 5;
        const CAPTURE = 1 << 31;
    }
}

impl EventMask {
    /// The subscription bit checked when dispatching `kind`.
    pub fn for_kind(kind: EventKind) -> EventMask {
        match kind {
            EventKind::KeyPress | EventKind::KeyRelease | EventKind::KeyRepeat => EventMask::KEY,
            EventKind::MouseMove | EventKind::MousePress | EventKind::MouseRelease => EventMask::MOUSE,
            EventKind::Click => EventMask::CLICK,
            EventKind::Scroll => EventMask::SCROLL,
            EventKind::Focus | EventKind::Blur => EventMask::FOCUS,
            EventKind::MouseEnter | EventKind::MouseLeave => EventMask::HOVER,
            _ => EventMask::empty(),
        }
    }
}

/// One ring record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventRecord {
    pub kind: EventKind,
    pub consumed: bool,
    pub target: u32,
    pub timestamp_us: u64,
    pub payload: [u8; 16],
}

impl EventRecord {
    pub fn new(kind: EventKind, target: u32) -> Self {
        Self { kind, consumed: false, target, timestamp_us: 0, payload: [0; 16] }
    }

    /// Key event: scalar key code + modifier bits + repeat flag.
    pub fn key(kind: EventKind, target: u32, code: u32, modifiers: u8) -> Self {
        let mut record = Self::new(kind, target);
        record.payload[0..4].copy_from_slice(&code.to_le_bytes());
        record.payload[4] = modifiers;
        record
    }

    /// Mouse event: cell position + button.
    pub fn mouse(kind: EventKind, target: u32, x: u16, y: u16, button: u8) -> Self {
        let mut record = Self::new(kind, target);
        record.payload[0..2].copy_from_slice(&x.to_le_bytes());
        record.payload[2..4].copy_from_slice(&y.to_le_bytes());
        record.payload[4] = button;
        record
    }

    /// Scroll event: signed cell deltas.
    pub fn scroll(target: u32, dx: i32, dy: i32) -> Self {
        let mut record = Self::new(EventKind::Scroll, target);
        record.payload[0..4].copy_from_slice(&dx.to_le_bytes());
        record.payload[4..8].copy_from_slice(&dy.to_le_bytes());
        record
    }

    /// Terminal resize: new viewport in cells.
    pub fn resize(width: u16, height: u16) -> Self {
        let mut record = Self::new(EventKind::Resize, 0);
        record.payload[0..2].copy_from_slice(&width.to_le_bytes());
        record.payload[2..4].copy_from_slice(&height.to_le_bytes());
        record
    }

    pub fn exit() -> Self {
        Self::new(EventKind::Exit, 0)
    }

    /// Serialize into a 32-byte ring slot.
    ///
    /// # Safety
    /// `dst` must be valid for 32 writable bytes.
    pub unsafe fn encode(&self, dst: *mut u8) {
        unsafe {
            *dst = self.kind as u8;
            *dst.add(1) = self.consumed as u8;
            std::ptr::write_unaligned(dst.add(2) as *mut u16, 0);
            std::ptr::write_unaligned(dst.add(4) as *mut u32, self.target);
            std::ptr::write_unaligned(dst.add(8) as *mut u64, self.timestamp_us);
            std::ptr::copy_nonoverlapping(self.payload.as_ptr(), dst.add(16), 16);
        }
    }

    /// Deserialize from a 32-byte ring slot.
    ///
    /// # Safety
    /// `src` must be valid for 32 readable bytes.
    pub unsafe fn decode(src: *const u8) -> Self {
        unsafe {
            let mut payload = [0u8; 16];
            std::ptr::copy_nonoverlapping(src.add(16), payload.as_mut_ptr(), 16);
            Self {
                kind: EventKind::from_u8(*src),
                consumed: *src.add(1) != 0,
                target: std::ptr::read_unaligned(src.add(4) as *const u32),
                timestamp_us: std::ptr::read_unaligned(src.add(8) as *const u64),
                payload,
            }
        }
    }

    // ---- payload readers ----

    pub fn key_code(&self) -> u32 {
        u32::from_le_bytes([self.payload[0], self.payload[1], self.payload[2], self.payload[3]])
    }

    pub fn mouse_pos(&self) -> (u16, u16) {
        (
            u16::from_le_bytes([self.payload[0], self.payload[1]]),
            u16::from_le_bytes([self.payload[2], self.payload[3]]),
        )
    }

    pub fn scroll_delta(&self) -> (i32, i32) {
        (
            i32::from_le_bytes([self.payload[0], self.payload[1], self.payload[2], self.payload[3]]),
            i32::from_le_bytes([self.payload[4], self.payload[5], self.payload[6], self.payload[7]]),
        )
    }
}
