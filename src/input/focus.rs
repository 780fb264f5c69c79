//! Keyboard focus management.
//!
//! The focused node index lives in the region header so the producer can
//! observe it. Tab order is `tab_index >= 0` nodes ascending, ties broken by
//! depth-first pre-order; focus changes post Focus/Blur records to the ring.

use crate::input::events::{EventKind, EventRecord};
use crate::region::{SharedRegion, COMPONENT_NONE, NO_INDEX};

pub struct FocusManager {
    focused: i32,
}

impl FocusManager {
    pub fn new() -> Self {
        Self { focused: NO_INDEX }
    }

    pub fn focused(&self) -> Option<usize> {
        (self.focused >= 0).then_some(self.focused as usize)
    }

    /// Focus a node (must be focusable and visible). Posts Blur for the old
    /// focus and Focus for the new one.
    pub fn focus(&mut self, region: &SharedRegion, node: usize, timestamp_us: u64) {
        if node >= region.node_count() || !region.focusable(node) || !region.visible(node) {
            return;
        }
        if self.focused == node as i32 {
            return;
        }
        if let Some(prev) = self.focused() {
            let mut blur = EventRecord::new(EventKind::Blur, prev as u32);
            blur.timestamp_us = timestamp_us;
            region.push_event(&blur);
        }
        self.focused = node as i32;
        region.set_focused_index(self.focused);
        let mut focus = EventRecord::new(EventKind::Focus, node as u32);
        focus.timestamp_us = timestamp_us;
        region.push_event(&focus);
    }

    pub fn blur(&mut self, region: &SharedRegion, timestamp_us: u64) {
        if let Some(prev) = self.focused() {
            let mut blur = EventRecord::new(EventKind::Blur, prev as u32);
            blur.timestamp_us = timestamp_us;
            region.push_event(&blur);
        }
        self.focused = NO_INDEX;
        region.set_focused_index(NO_INDEX);
    }

    /// Tab: advance to the next focusable in tab order, wrapping.
    pub fn focus_next(&mut self, region: &SharedRegion, timestamp_us: u64) -> bool {
        let order = self.tab_order(region);
        if order.is_empty() {
            return false;
        }
        let next = match self.focused().and_then(|f| order.iter().position(|&n| n == f)) {
            Some(i) => order[(i + 1) % order.len()],
            None => order[0],
        };
        self.focus(region, next, timestamp_us);
        true
    }

    /// Shift+Tab: previous focusable in tab order, wrapping.
    pub fn focus_previous(&mut self, region: &SharedRegion, timestamp_us: u64) -> bool {
        let order = self.tab_order(region);
        if order.is_empty() {
            return false;
        }
        let prev = match self.focused().and_then(|f| order.iter().position(|&n| n == f)) {
            Some(0) | None => order[order.len() - 1],
            Some(i) => order[i - 1],
        };
        self.focus(region, prev, timestamp_us);
        true
    }

    /// Click focusing: the clicked node or its nearest focusable ancestor.
    pub fn focus_by_click(&mut self, region: &SharedRegion, node: usize, timestamp_us: u64) -> bool {
        let mut current = Some(node);
        let mut budget = region.max_nodes();
        while let Some(idx) = current {
            if budget == 0 {
                break;
            }
            budget -= 1;
            if region.focusable(idx) && region.visible(idx) {
                let before = self.focused;
                self.focus(region, idx, timestamp_us);
                return self.focused != before;
            }
            current = region.parent_index(idx);
        }
        false
    }

    /// Focusable nodes sorted by tab_index ascending; the stable sort keeps
    /// pre-order for equal indices.
    fn tab_order(&self, region: &SharedRegion) -> Vec<usize> {
        let count = region.node_count();
        let mut order: Vec<(i32, usize)> = Vec::new();
        for root in 0..count {
            if region.component_type(root) == COMPONENT_NONE
                || !region.visible(root)
                || region.parent_index(root).is_some()
            {
                continue;
            }
            region.for_each_descendant(root, |n| {
                if region.component_type(n) != COMPONENT_NONE
                    && region.visible(n)
                    && region.focusable(n)
                    && region.tab_index(n) >= 0
                {
                    order.push((region.tab_index(n), n));
                }
            });
        }
        order.sort_by_key(|&(tab, _)| tab);
        order.into_iter().map(|(_, n)| n).collect()
    }
}

impl Default for FocusManager {
    fn default() -> Self {
        Self::new()
    }
}
