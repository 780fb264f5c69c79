//! Routes parsed terminal events to nodes and the event ring.
//!
//! Mouse events hit-test against a grid rebuilt from the compositor's hit
//! regions each frame (last writer per cell wins, so the topmost node is
//! found in O(1)). Dispatch runs a capture-phase walk (ancestors first,
//! nodes with the capture bit consume) then a bubble-phase walk
//! (deepest-first); the posted record carries the target and whether any
//! subscriber consumed it. Keyboard events route to the focused node;
//! unconsumed arrows/page keys and wheel events become clamped scroll
//! mutations.

use std::time::Instant;

use crossterm::event::{
    Event as TermEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent,
    MouseEventKind,
};

use crate::framebuffer::HitRegion;
use crate::region::{SharedRegion, NO_INDEX};

use super::events::{EventKind, EventMask, EventRecord};
use super::focus::FocusManager;
use super::scroll;

/// Cells the wheel moves per notch.
const WHEEL_STEP: f32 = 3.0;

// Modifier bits in key event payloads.
const MOD_SHIFT: u8 = 1 << 0;
const MOD_CTRL: u8 = 1 << 1;
const MOD_ALT: u8 = 1 << 2;

// =============================================================================
// HitGrid
// =============================================================================

/// Screen-cell → topmost node index, -1 for none.
pub struct HitGrid {
    grid: Vec<i32>,
    width: u16,
    height: u16,
}

impl HitGrid {
    pub fn new(width: u16, height: u16) -> Self {
        Self { grid: vec![NO_INDEX; width as usize * height as usize], width, height }
    }

    pub fn rebuild(&mut self, regions: &[HitRegion], width: u16, height: u16) {
        self.width = width;
        self.height = height;
        self.grid.clear();
        self.grid.resize(width as usize * height as usize, NO_INDEX);
        for r in regions {
            let x2 = r.x.saturating_add(r.width).min(width);
            let y2 = r.y.saturating_add(r.height).min(height);
            for row in r.y..y2 {
                let base = row as usize * width as usize;
                for col in r.x..x2 {
                    self.grid[base + col as usize] = r.node as i32;
                }
            }
        }
    }

    pub fn hit(&self, x: u16, y: u16) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let v = self.grid[y as usize * self.width as usize + x as usize];
        (v >= 0).then_some(v as usize)
    }
}

// =============================================================================
// InputRouter
// =============================================================================

pub struct InputRouter {
    pub focus: FocusManager,
    hit_grid: HitGrid,
    hovered: Option<usize>,
    pressed: Option<(usize, u8)>,
    epoch: Instant,
}

impl InputRouter {
    pub fn new() -> Self {
        Self {
            focus: FocusManager::new(),
            hit_grid: HitGrid::new(0, 0),
            hovered: None,
            pressed: None,
            epoch: Instant::now(),
        }
    }

    fn now_us(&self) -> u64 {
        self.epoch.elapsed().as_micros() as u64
    }

    /// Refresh the hit grid after a frame composited.
    pub fn update_hit_regions(&mut self, regions: &[HitRegion], width: u16, height: u16) {
        self.hit_grid.rebuild(regions, width, height);
    }

    /// Route one terminal event. Returns true when region state changed in
    /// a way that needs a repaint (scroll, focus, resize).
    pub fn handle(&mut self, region: &SharedRegion, event: &TermEvent) -> bool {
        match event {
            TermEvent::Key(key) => self.handle_key(region, key),
            TermEvent::Mouse(mouse) => self.handle_mouse(region, mouse),
            TermEvent::Resize(w, h) => {
                region.set_terminal_size(*w as u32, *h as u32);
                let mut record = EventRecord::resize(*w, *h);
                record.timestamp_us = self.now_us();
                region.push_event(&record);
                true
            }
            _ => false,
        }
    }

    // ---- keyboard ----

    fn handle_key(&mut self, region: &SharedRegion, key: &KeyEvent) -> bool {
        let ts = self.now_us();

        if key.code == KeyCode::Char('c')
            && key.modifiers.contains(KeyModifiers::CONTROL)
            && key.kind != KeyEventKind::Release
        {
            let mut record = EventRecord::exit();
            record.timestamp_us = ts;
            region.push_event(&record);
            region.request_exit();
            return false;
        }

        let kind = match key.kind {
            KeyEventKind::Press => EventKind::KeyPress,
            KeyEventKind::Repeat => EventKind::KeyRepeat,
            KeyEventKind::Release => EventKind::KeyRelease,
        };
        let is_press = kind != EventKind::KeyRelease;

        // Tab navigation consumes before anything else sees the key.
        if is_press
            && (key.code == KeyCode::BackTab
                || (key.code == KeyCode::Tab && key.modifiers.contains(KeyModifiers::SHIFT)))
        {
            return self.focus.focus_previous(region, ts);
        }
        if is_press && key.code == KeyCode::Tab {
            return self.focus.focus_next(region, ts);
        }

        let target = self.focus.focused().unwrap_or(0);
        let mut record =
            EventRecord::key(kind, target as u32, key_code_u32(&key.code), modifier_bits(key.modifiers));
        record.timestamp_us = ts;
        let consumed = self.dispatch(region, target, &mut record);
        region.push_event(&record);

        if consumed || !is_press {
            return false;
        }

        // Framework default: unconsumed navigation keys scroll the focused
        // node. Keyboard scrolling never chains to ancestors.
        if let Some(focused) = self.focus.focused() {
            let viewport = region.computed_height(focused).max(1.0);
            return match key.code {
                KeyCode::Up => scroll::scroll_by(region, focused, 0.0, -1.0, false),
                KeyCode::Down => scroll::scroll_by(region, focused, 0.0, 1.0, false),
                KeyCode::Left => scroll::scroll_by(region, focused, -1.0, 0.0, false),
                KeyCode::Right => scroll::scroll_by(region, focused, 1.0, 0.0, false),
                KeyCode::PageUp => scroll::scroll_by(region, focused, 0.0, -viewport, false),
                KeyCode::PageDown => scroll::scroll_by(region, focused, 0.0, viewport, false),
                KeyCode::Home => {
                    scroll::scroll_to(region, focused, region.scroll_x(focused), 0.0);
                    region.is_scrollable(focused)
                }
                KeyCode::End => {
                    scroll::scroll_to(
                        region,
                        focused,
                        region.scroll_x(focused),
                        region.scroll_extent_y(focused),
                    );
                    region.is_scrollable(focused)
                }
                _ => false,
            };
        }
        false
    }

    // ---- mouse ----

    fn handle_mouse(&mut self, region: &SharedRegion, mouse: &MouseEvent) -> bool {
        let ts = self.now_us();
        let (x, y) = (mouse.column, mouse.row);
        let target = self.hit_grid.hit(x, y);

        match mouse.kind {
            MouseEventKind::Moved | MouseEventKind::Drag(_) => {
                self.update_hover(region, target, ts);
                false
            }
            MouseEventKind::Down(button) => {
                self.update_hover(region, target, ts);
                let Some(node) = target else { return false };
                let btn = button_u8(button);
                self.pressed = Some((node, btn));
                let mut record = EventRecord::mouse(EventKind::MousePress, node as u32, x, y, btn);
                record.timestamp_us = ts;
                self.dispatch(region, node, &mut record);
                region.push_event(&record);
                self.focus.focus_by_click(region, node, ts)
            }
            MouseEventKind::Up(button) => {
                let btn = button_u8(button);
                if let Some(node) = target {
                    let mut record =
                        EventRecord::mouse(EventKind::MouseRelease, node as u32, x, y, btn);
                    record.timestamp_us = ts;
                    self.dispatch(region, node, &mut record);
                    region.push_event(&record);

                    // Press and release on the same node synthesizes a click.
                    if self.pressed == Some((node, btn)) {
                        let mut click = EventRecord::mouse(EventKind::Click, node as u32, x, y, btn);
                        click.timestamp_us = ts;
                        self.dispatch(region, node, &mut click);
                        region.push_event(&click);
                    }
                }
                self.pressed = None;
                false
            }
            MouseEventKind::ScrollUp => self.wheel(region, target, 0.0, -WHEEL_STEP, ts),
            MouseEventKind::ScrollDown => self.wheel(region, target, 0.0, WHEEL_STEP, ts),
            MouseEventKind::ScrollLeft => self.wheel(region, target, -WHEEL_STEP, 0.0, ts),
            MouseEventKind::ScrollRight => self.wheel(region, target, WHEEL_STEP, 0.0, ts),
        }
    }

    fn wheel(
        &mut self,
        region: &SharedRegion,
        target: Option<usize>,
        dx: f32,
        dy: f32,
        ts: u64,
    ) -> bool {
        let Some(node) = target.or_else(|| self.focus.focused()) else { return false };
        let mut record = EventRecord::scroll(node as u32, dx as i32, dy as i32);
        record.timestamp_us = ts;
        let consumed = self.dispatch(region, node, &mut record);
        region.push_event(&record);
        if consumed {
            return false;
        }
        // Wheel scrolling chains to the nearest scrollable ancestor.
        scroll::scroll_by(region, node, dx, dy, true)
    }

    fn update_hover(&mut self, region: &SharedRegion, target: Option<usize>, ts: u64) {
        if target == self.hovered {
            return;
        }
        if let Some(prev) = self.hovered.take() {
            let mut record = EventRecord::new(EventKind::MouseLeave, prev as u32);
            record.timestamp_us = ts;
            region.push_event(&record);
        }
        if let Some(node) = target {
            let mut record = EventRecord::new(EventKind::MouseEnter, node as u32);
            record.timestamp_us = ts;
            region.push_event(&record);
            self.hovered = Some(node);
        }
        region.set_hovered_index(self.hovered.map_or(NO_INDEX, |n| n as i32));
    }

    // ---- dispatch ----

    /// Capture phase over the target's ancestors (root first), then bubble
    /// phase from the target upward. Sets `record.consumed` when a
    /// subscribed node claims the event, and returns it.
    fn dispatch(&self, region: &SharedRegion, target: usize, record: &mut EventRecord) -> bool {
        let bit = EventMask::for_kind(record.kind);
        if bit.is_empty() {
            return false;
        }

        let mut chain = Vec::new();
        let mut current = Some(target);
        let mut budget = region.max_nodes();
        while let Some(node) = current {
            if budget == 0 {
                break;
            }
            budget -= 1;
            chain.push(node);
            current = region.parent_index(node);
        }

        // Capture: ancestors first, capture-flagged subscribers only.
        for &node in chain.iter().rev() {
            if node == target {
                continue;
            }
            let mask = EventMask::from_bits_truncate(region.event_mask(node));
            if mask.contains(EventMask::CAPTURE) && mask.contains(bit) {
                record.consumed = true;
                return true;
            }
        }
        // Bubble: deepest first.
        for &node in &chain {
            let mask = EventMask::from_bits_truncate(region.event_mask(node));
            if mask.contains(bit) && !mask.contains(EventMask::CAPTURE) {
                record.consumed = true;
                return true;
            }
        }
        false
    }
}

impl Default for InputRouter {
    fn default() -> Self {
        Self::new()
    }
}

fn modifier_bits(mods: KeyModifiers) -> u8 {
    let mut bits = 0;
    if mods.contains(KeyModifiers::SHIFT) {
        bits |= MOD_SHIFT;
    }
    if mods.contains(KeyModifiers::CONTROL) {
        bits |= MOD_CTRL;
    }
    if mods.contains(KeyModifiers::ALT) {
        bits |= MOD_ALT;
    }
    bits
}

fn button_u8(button: MouseButton) -> u8 {
    match button {
        MouseButton::Left => 0,
        MouseButton::Right => 1,
        MouseButton::Middle => 2,
    }
}

fn key_code_u32(code: &KeyCode) -> u32 {
    match code {
        KeyCode::Char(c) => *c as u32,
        KeyCode::Enter => 13,
        KeyCode::Tab | KeyCode::BackTab => 9,
        KeyCode::Backspace => 8,
        KeyCode::Esc => 27,
        KeyCode::Delete => 127,
        KeyCode::Up => 0x1001,
        KeyCode::Down => 0x1002,
        KeyCode::Left => 0x1003,
        KeyCode::Right => 0x1004,
        KeyCode::Home => 0x1005,
        KeyCode::End => 0x1006,
        KeyCode::PageUp => 0x1007,
        KeyCode::PageDown => 0x1008,
        KeyCode::Insert => 0x1009,
        KeyCode::F(n) => 0x2000 + *n as u32,
        _ => 0,
    }
}
