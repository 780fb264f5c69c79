//! Flexbox layout over the shared region via taffy's low-level trait API.
//!
//! Zero-copy integration: `SlotStyle` reads style bytes straight from the
//! node table on every accessor call, and taffy `NodeId`s ARE slot indices —
//! no mirror tree, no per-frame style structs.
//!
//! ```text
//! SharedRegion node table
//!     │
//!     ├── SlotStyle<'a>  ──► CoreStyle + FlexboxContainerStyle + ItemStyle
//!     │   (zero-copy)        reads node bytes per call
//!     │
//!     └── RegionTree<'a> ──► TraversePartialTree / LayoutPartialTree /
//!         (scratch ctx)      LayoutFlexboxContainer / CacheTree / RoundTree
//! ```
//!
//! The hierarchy is rebuilt each layout pass from the sibling links; parent
//! chains that do not terminate (cycles) or point outside the table are
//! detached and reported as diagnostics instead of aborting the frame.

use std::sync::Arc;

use taffy::prelude::*;
use taffy::{
    compute_cached_layout, compute_flexbox_layout, compute_hidden_layout, compute_leaf_layout,
    compute_root_layout, round_layout, Cache, CacheTree, Layout, LayoutFlexboxContainer,
    LayoutInput, LayoutOutput, LayoutPartialTree, NodeId, RoundTree, TraversePartialTree,
    TraverseTree,
};

use crate::region::{self, SharedRegion, COMPONENT_NONE, COMPONENT_TEXT};
use crate::types::Overflow;

use super::flow::wrapped_height;
use super::measure::display_width;

// =============================================================================
// SCRATCH CONTEXT
// =============================================================================

/// A node the hierarchy rebuild had to detach (cycle, dangling parent, or an
/// out-of-range link). The compositor paints a diagnostic for each.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutDiagnostic {
    pub node: usize,
}

/// Reusable per-frame scratch: children lists, taffy caches, layouts.
pub struct LayoutContext {
    children: Vec<Vec<usize>>,
    cache: Vec<Cache>,
    unrounded: Vec<Layout>,
    final_layout: Vec<Layout>,
    roots: Vec<usize>,
    pub diagnostics: Vec<LayoutDiagnostic>,
}

impl LayoutContext {
    pub fn new() -> Self {
        Self {
            children: Vec::new(),
            cache: Vec::new(),
            unrounded: Vec::new(),
            final_layout: Vec::new(),
            roots: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    fn ensure_capacity(&mut self, count: usize) {
        if count > self.cache.len() {
            self.children.resize_with(count, Vec::new);
            self.cache.resize_with(count, Cache::new);
            self.unrounded.resize_with(count, || Layout::with_order(0));
            self.final_layout.resize_with(count, || Layout::with_order(0));
        }
    }

    /// Clear all caches. Text changes resize ancestors, so per-node
    /// invalidation would have to walk parent chains anyway.
    fn clear_caches(&mut self, count: usize) {
        for cache in self.cache.iter_mut().take(count) {
            cache.clear();
        }
    }

    /// Rebuild children lists and roots from the sibling links.
    ///
    /// Only live + visible nodes participate. Nodes reachable twice (cycles),
    /// links outside `[0, node_count)`, and live nodes whose parent chain
    /// never reaches a root are detached and reported.
    fn rebuild_hierarchy(&mut self, region: &SharedRegion, count: usize) {
        self.roots.clear();
        self.diagnostics.clear();
        for children in self.children.iter_mut().take(count) {
            children.clear();
        }

        let mut visited = vec![false; count];
        for i in 0..count {
            let live = region.component_type(i) != COMPONENT_NONE;
            if live && region.visible(i) && region.node_i32(i, region::I_PARENT) < 0 {
                self.roots.push(i);
            }
        }

        let roots = self.roots.clone();
        for &root in &roots {
            visited[root] = true;
            self.collect_children(region, root, count, &mut visited);
        }

        // Live, visible, attached to a live visible parent, yet unreachable
        // from any root: the parent chain cycles.
        for i in 0..count {
            if region.component_type(i) == COMPONENT_NONE || !region.visible(i) || visited[i] {
                continue;
            }
            if let Some(p) = region.parent_index(i) {
                if region.component_type(p) != COMPONENT_NONE && region.visible(p) {
                    log::warn!("layout: node {i} unreachable from any root, detaching");
                    self.diagnostics.push(LayoutDiagnostic { node: i });
                }
            }
        }
    }

    fn collect_children(
        &mut self,
        region: &SharedRegion,
        node: usize,
        count: usize,
        visited: &mut [bool],
    ) {
        let mut stack = vec![node];
        while let Some(parent) = stack.pop() {
            for child in region.children(parent) {
                if child >= count || region.component_type(child) == COMPONENT_NONE {
                    log::warn!("layout: node {parent} links to invalid child {child}");
                    self.diagnostics.push(LayoutDiagnostic { node: parent });
                    continue;
                }
                if !region.visible(child) {
                    continue;
                }
                if visited[child] {
                    log::warn!("layout: node {child} reachable twice, cycle detached");
                    self.diagnostics.push(LayoutDiagnostic { node: child });
                    continue;
                }
                visited[child] = true;
                self.children[parent].push(child);
                stack.push(child);
            }
        }
    }
}

impl Default for LayoutContext {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// ZERO-COPY STYLE
// =============================================================================

/// Style view over one node slot.
#[derive(Clone, Copy)]
pub struct SlotStyle<'a> {
    region: &'a SharedRegion,
    idx: usize,
}

impl<'a> SlotStyle<'a> {
    #[inline]
    fn new(region: &'a SharedRegion, idx: usize) -> Self {
        Self { region, idx }
    }

    #[inline]
    fn f32(&self, field: usize) -> f32 {
        self.region.node_f32(self.idx, field)
    }

    #[inline]
    fn u8(&self, field: usize) -> u8 {
        self.region.node_u8(self.idx, field)
    }

    /// Dimension encoding: NaN = auto, negative = percent (−50 → 50 %),
    /// positive = cells.
    #[inline]
    fn to_dim(val: f32) -> Dimension {
        if val.is_nan() {
            Dimension::auto()
        } else if val < 0.0 {
            Dimension::percent(-val / 100.0)
        } else {
            Dimension::length(val)
        }
    }

    #[inline]
    fn to_lpa(val: f32) -> LengthPercentageAuto {
        if val.is_nan() {
            LengthPercentageAuto::auto()
        } else if val < 0.0 {
            LengthPercentageAuto::percent(-val / 100.0)
        } else {
            LengthPercentageAuto::length(val)
        }
    }

    #[inline]
    fn to_lp(val: f32) -> LengthPercentage {
        if val.is_nan() {
            LengthPercentage::length(0.0)
        } else if val < 0.0 {
            LengthPercentage::percent(-val / 100.0)
        } else {
            LengthPercentage::length(val)
        }
    }
}

impl taffy::CoreStyle for SlotStyle<'_> {
    type CustomIdent = Arc<str>;

    fn box_generation_mode(&self) -> taffy::BoxGenerationMode {
        if self.region.component_type(self.idx) == COMPONENT_NONE || !self.region.visible(self.idx)
        {
            taffy::BoxGenerationMode::None
        } else {
            taffy::BoxGenerationMode::Normal
        }
    }

    fn is_block(&self) -> bool {
        false
    }

    fn box_sizing(&self) -> taffy::BoxSizing {
        taffy::BoxSizing::BorderBox
    }

    fn overflow(&self) -> taffy::Point<taffy::Overflow> {
        let map = |v: u8| match Overflow::from_u8(v) {
            Overflow::Hidden => taffy::Overflow::Clip,
            Overflow::Scroll | Overflow::Auto => taffy::Overflow::Scroll,
            Overflow::Visible => taffy::Overflow::Visible,
        };
        taffy::Point {
            x: map(self.u8(region::U_OVERFLOW_X)),
            y: map(self.u8(region::U_OVERFLOW_Y)),
        }
    }

    fn scrollbar_width(&self) -> f32 {
        0.0
    }

    fn position(&self) -> taffy::Position {
        taffy::Position::Relative
    }

    fn inset(&self) -> taffy::Rect<LengthPercentageAuto> {
        taffy::Rect {
            top: LengthPercentageAuto::auto(),
            right: LengthPercentageAuto::auto(),
            bottom: LengthPercentageAuto::auto(),
            left: LengthPercentageAuto::auto(),
        }
    }

    fn size(&self) -> taffy::Size<Dimension> {
        // Text leaves size from their measure function.
        if self.region.component_type(self.idx) == COMPONENT_TEXT {
            return taffy::Size { width: Dimension::auto(), height: Dimension::auto() };
        }
        taffy::Size {
            width: Self::to_dim(self.f32(region::F_WIDTH)),
            height: Self::to_dim(self.f32(region::F_HEIGHT)),
        }
    }

    fn min_size(&self) -> taffy::Size<Dimension> {
        taffy::Size {
            width: Self::to_dim(self.f32(region::F_MIN_WIDTH)),
            height: Self::to_dim(self.f32(region::F_MIN_HEIGHT)),
        }
    }

    fn max_size(&self) -> taffy::Size<Dimension> {
        taffy::Size {
            width: Self::to_dim(self.f32(region::F_MAX_WIDTH)),
            height: Self::to_dim(self.f32(region::F_MAX_HEIGHT)),
        }
    }

    fn aspect_ratio(&self) -> Option<f32> {
        None
    }

    fn margin(&self) -> taffy::Rect<LengthPercentageAuto> {
        taffy::Rect {
            top: Self::to_lpa(self.f32(region::F_MARGIN_TOP)),
            right: Self::to_lpa(self.f32(region::F_MARGIN_RIGHT)),
            bottom: Self::to_lpa(self.f32(region::F_MARGIN_BOTTOM)),
            left: Self::to_lpa(self.f32(region::F_MARGIN_LEFT)),
        }
    }

    fn padding(&self) -> taffy::Rect<LengthPercentage> {
        taffy::Rect {
            top: Self::to_lp(self.f32(region::F_PADDING_TOP)),
            right: Self::to_lp(self.f32(region::F_PADDING_RIGHT)),
            bottom: Self::to_lp(self.f32(region::F_PADDING_BOTTOM)),
            left: Self::to_lp(self.f32(region::F_PADDING_LEFT)),
        }
    }

    fn border(&self) -> taffy::Rect<LengthPercentage> {
        taffy::Rect {
            top: LengthPercentage::length(self.u8(region::U_BORDER_TOP) as f32),
            right: LengthPercentage::length(self.u8(region::U_BORDER_RIGHT) as f32),
            bottom: LengthPercentage::length(self.u8(region::U_BORDER_BOTTOM) as f32),
            left: LengthPercentage::length(self.u8(region::U_BORDER_LEFT) as f32),
        }
    }
}

impl taffy::FlexboxContainerStyle for SlotStyle<'_> {
    // Byte contract: 0 = column (the default), 1 = row, 2 = row-reverse,
    // 3 = column-reverse.
    fn flex_direction(&self) -> FlexDirection {
        match self.u8(region::U_FLEX_DIRECTION) {
            1 => FlexDirection::Row,
            2 => FlexDirection::RowReverse,
            3 => FlexDirection::ColumnReverse,
            _ => FlexDirection::Column,
        }
    }

    fn flex_wrap(&self) -> FlexWrap {
        match self.u8(region::U_FLEX_WRAP) {
            1 => FlexWrap::Wrap,
            2 => FlexWrap::WrapReverse,
            _ => FlexWrap::NoWrap,
        }
    }

    fn gap(&self) -> taffy::Size<LengthPercentage> {
        let gap = self.f32(region::F_GAP);
        let row_gap = self.f32(region::F_ROW_GAP);
        let column_gap = self.f32(region::F_COLUMN_GAP);
        let pick = |axis: f32| if axis != 0.0 && !axis.is_nan() { axis } else if gap.is_nan() { 0.0 } else { gap };
        taffy::Size {
            width: LengthPercentage::length(pick(column_gap)),
            height: LengthPercentage::length(pick(row_gap)),
        }
    }

    fn align_content(&self) -> Option<AlignContent> {
        match self.u8(region::U_ALIGN_CONTENT) {
            1 => Some(AlignContent::Center),
            2 => Some(AlignContent::FlexEnd),
            3 => Some(AlignContent::Stretch),
            4 => Some(AlignContent::SpaceBetween),
            5 => Some(AlignContent::SpaceAround),
            6 => Some(AlignContent::SpaceEvenly),
            _ => Some(AlignContent::FlexStart),
        }
    }

    fn align_items(&self) -> Option<AlignItems> {
        match self.u8(region::U_ALIGN_ITEMS) {
            1 => Some(AlignItems::Center),
            2 => Some(AlignItems::FlexEnd),
            3 => Some(AlignItems::Stretch),
            _ => Some(AlignItems::FlexStart),
        }
    }

    fn justify_content(&self) -> Option<JustifyContent> {
        match self.u8(region::U_JUSTIFY_CONTENT) {
            1 => Some(JustifyContent::Center),
            2 => Some(JustifyContent::FlexEnd),
            3 => Some(JustifyContent::SpaceBetween),
            4 => Some(JustifyContent::SpaceAround),
            5 => Some(JustifyContent::SpaceEvenly),
            _ => Some(JustifyContent::FlexStart),
        }
    }
}

impl taffy::FlexboxItemStyle for SlotStyle<'_> {
    fn flex_basis(&self) -> Dimension {
        Self::to_dim(self.f32(region::F_BASIS))
    }

    fn flex_grow(&self) -> f32 {
        let v = self.f32(region::F_GROW);
        if v.is_nan() { 0.0 } else { v }
    }

    fn flex_shrink(&self) -> f32 {
        let v = self.f32(region::F_SHRINK);
        if v.is_nan() { 1.0 } else { v }
    }

    fn align_self(&self) -> Option<AlignSelf> {
        match self.u8(region::U_ALIGN_SELF) {
            1 => Some(AlignSelf::FlexStart),
            2 => Some(AlignSelf::Center),
            3 => Some(AlignSelf::FlexEnd),
            4 => Some(AlignSelf::Stretch),
            _ => None,
        }
    }
}

// =============================================================================
// LAYOUT TREE
// =============================================================================

pub struct RegionTree<'a> {
    region: &'a SharedRegion,
    ctx: &'a mut LayoutContext,
}

pub struct ChildIter<'a> {
    inner: std::slice::Iter<'a, usize>,
}

impl Iterator for ChildIter<'_> {
    type Item = NodeId;
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|&idx| NodeId::from(idx))
    }
}

impl ExactSizeIterator for ChildIter<'_> {
    fn len(&self) -> usize {
        self.inner.len()
    }
}

impl TraversePartialTree for RegionTree<'_> {
    type ChildIter<'a>
        = ChildIter<'a>
    where
        Self: 'a;

    fn child_ids(&self, parent: NodeId) -> Self::ChildIter<'_> {
        let idx = usize::from(parent);
        let children =
            if idx < self.ctx.children.len() { &self.ctx.children[idx] } else { &[] as &[usize] };
        ChildIter { inner: children.iter() }
    }

    fn child_count(&self, parent: NodeId) -> usize {
        let idx = usize::from(parent);
        if idx < self.ctx.children.len() { self.ctx.children[idx].len() } else { 0 }
    }

    fn get_child_id(&self, parent: NodeId, child_index: usize) -> NodeId {
        NodeId::from(self.ctx.children[usize::from(parent)][child_index])
    }
}

impl TraverseTree for RegionTree<'_> {}

impl LayoutPartialTree for RegionTree<'_> {
    type CoreContainerStyle<'a>
        = SlotStyle<'a>
    where
        Self: 'a;
    type CustomIdent = Arc<str>;

    fn get_core_container_style(&self, node: NodeId) -> Self::CoreContainerStyle<'_> {
        SlotStyle::new(self.region, usize::from(node))
    }

    fn set_unrounded_layout(&mut self, node: NodeId, layout: &Layout) {
        let idx = usize::from(node);
        if idx < self.ctx.unrounded.len() {
            self.ctx.unrounded[idx] = *layout;
        }
    }

    fn compute_child_layout(&mut self, node: NodeId, inputs: LayoutInput) -> LayoutOutput {
        compute_cached_layout(self, node, inputs, |tree, node, inputs| {
            let idx = usize::from(node);
            match tree.region.component_type(idx) {
                COMPONENT_TEXT => {
                    let style = SlotStyle::new(tree.region, idx);
                    let text = tree.region.text(idx);
                    compute_leaf_layout(
                        inputs,
                        &style,
                        |_, _| 0.0,
                        |known, available| {
                            if text.is_empty() {
                                return taffy::Size::ZERO;
                            }
                            let max_w = match known.width {
                                Some(w) => w as usize,
                                None => match available.width {
                                    AvailableSpace::Definite(w) => w as usize,
                                    AvailableSpace::MinContent => 1,
                                    AvailableSpace::MaxContent => usize::MAX,
                                },
                            };
                            measure_text(text, tree.region.node_u8(idx, region::U_TEXT_WRAP), max_w)
                        },
                    )
                }
                COMPONENT_NONE => compute_hidden_layout(tree, node),
                _ => compute_flexbox_layout(tree, node, inputs),
            }
        })
    }
}

impl CacheTree for RegionTree<'_> {
    fn cache_get(
        &self,
        node: NodeId,
        known: taffy::Size<Option<f32>>,
        available: taffy::Size<AvailableSpace>,
        mode: taffy::RunMode,
    ) -> Option<LayoutOutput> {
        let idx = usize::from(node);
        self.ctx.cache.get(idx).and_then(|cache| cache.get(known, available, mode))
    }

    fn cache_store(
        &mut self,
        node: NodeId,
        known: taffy::Size<Option<f32>>,
        available: taffy::Size<AvailableSpace>,
        mode: taffy::RunMode,
        output: LayoutOutput,
    ) {
        let idx = usize::from(node);
        if let Some(cache) = self.ctx.cache.get_mut(idx) {
            cache.store(known, available, mode, output);
        }
    }

    fn cache_clear(&mut self, node: NodeId) {
        let idx = usize::from(node);
        if let Some(cache) = self.ctx.cache.get_mut(idx) {
            cache.clear();
        }
    }
}

impl LayoutFlexboxContainer for RegionTree<'_> {
    type FlexboxContainerStyle<'a>
        = SlotStyle<'a>
    where
        Self: 'a;
    type FlexboxItemStyle<'a>
        = SlotStyle<'a>
    where
        Self: 'a;

    fn get_flexbox_container_style(&self, node: NodeId) -> Self::FlexboxContainerStyle<'_> {
        SlotStyle::new(self.region, usize::from(node))
    }

    fn get_flexbox_child_style(&self, child: NodeId) -> Self::FlexboxItemStyle<'_> {
        SlotStyle::new(self.region, usize::from(child))
    }
}

impl RoundTree for RegionTree<'_> {
    fn get_unrounded_layout(&self, node: NodeId) -> Layout {
        self.ctx.unrounded[usize::from(node)]
    }

    fn set_final_layout(&mut self, node: NodeId, layout: &Layout) {
        let idx = usize::from(node);
        if idx < self.ctx.final_layout.len() {
            self.ctx.final_layout[idx] = *layout;
        }
    }
}

/// Measure a text leaf: width = widest line, height = line count under the
/// node's wrap mode.
fn measure_text(text: &str, wrap: u8, max_w: usize) -> taffy::Size<f32> {
    let width = text.split('\n').map(display_width).max().unwrap_or(0);
    let height = match crate::types::TextWrap::from_u8(wrap) {
        crate::types::TextWrap::Wrap => wrapped_height(text, max_w),
        _ => text.split('\n').count(),
    };
    taffy::Size { width: width as f32, height: height as f32 }
}

// =============================================================================
// OUTPUT
// =============================================================================

impl RegionTree<'_> {
    /// Write `computed_*` columns and auto-scroll extents, clear the dirty
    /// bits the pass consumed.
    fn write_output(&mut self, count: usize) {
        for i in 0..count {
            if self.region.component_type(i) == COMPONENT_NONE {
                continue;
            }
            let layout = self.ctx.final_layout[i];
            self.region.set_computed(
                i,
                layout.location.x,
                layout.location.y,
                layout.size.width,
                layout.size.height,
            );
            self.region.set_node_f32(i, region::F_CONTENT_WIDTH, layout.content_size.width);
            self.region.set_node_f32(i, region::F_CONTENT_HEIGHT, layout.content_size.height);

            let extent_x = (layout.content_size.width - layout.size.width).max(0.0);
            let extent_y = (layout.content_size.height - layout.size.height).max(0.0);
            let has_children = self.ctx.children.get(i).is_some_and(|c| !c.is_empty());
            let axis_scrollable = |overflow: u8, extent: f32| match Overflow::from_u8(overflow) {
                Overflow::Scroll => true,
                Overflow::Hidden => false,
                // Unset or auto: implicit scroll when content exceeds the box.
                Overflow::Visible | Overflow::Auto => has_children && extent > 0.0,
            };
            let scroll_x = axis_scrollable(self.region.node_u8(i, region::U_OVERFLOW_X), extent_x);
            let scroll_y = axis_scrollable(self.region.node_u8(i, region::U_OVERFLOW_Y), extent_y);
            self.region.set_computed_scroll(
                i,
                scroll_x || scroll_y,
                if scroll_x { extent_x } else { 0.0 },
                if scroll_y { extent_y } else { 0.0 },
            );
            self.region.clear_dirty(i);
        }
    }
}

// =============================================================================
// ENTRY POINT
// =============================================================================

/// Run one layout pass over every root tree in the region.
///
/// `viewport` is the terminal size in cells (already clamped to the reserved
/// framebuffer area). Returns the number of slots processed; detached
/// subtrees are reported in `ctx.diagnostics`.
pub fn compute_layout(region: &SharedRegion, ctx: &mut LayoutContext, viewport: (u32, u32)) -> u32 {
    let count = region.node_count();
    ctx.ensure_capacity(count);
    ctx.clear_caches(count);
    ctx.rebuild_hierarchy(region, count);

    if ctx.roots.is_empty() {
        return 0;
    }

    let available = taffy::Size {
        width: AvailableSpace::Definite(viewport.0 as f32),
        height: AvailableSpace::Definite(viewport.1 as f32),
    };

    let roots = ctx.roots.clone();
    let mut tree = RegionTree { region, ctx };
    for &root in &roots {
        compute_root_layout(&mut tree, NodeId::from(root), available);
    }
    for &root in &roots {
        round_layout(&mut tree, NodeId::from(root));
    }
    tree.write_output(count);

    count as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::{RegionConfig, COMPONENT_BOX};

    fn test_region() -> SharedRegion {
        SharedRegion::create(RegionConfig {
            max_nodes: 64,
            text_pool_size: 4096,
            max_viewport_width: 120,
            max_viewport_height: 48,
            event_ring_capacity: 16,
        })
        .unwrap()
    }

    #[test]
    fn row_layout_with_grow() {
        let region = test_region();
        let root = region.alloc().unwrap();
        region.set_layout_f32(root, region::F_WIDTH, 80.0);
        region.set_layout_f32(root, region::F_HEIGHT, 10.0);
        region.set_layout_u8(root, region::U_FLEX_DIRECTION, 1);
        region.set_layout_f32(root, region::F_PADDING_TOP, 1.0);
        region.set_layout_f32(root, region::F_PADDING_LEFT, 2.0);

        let a = region.alloc().unwrap();
        region.set_layout_f32(a, region::F_WIDTH, 20.0);
        region.set_layout_f32(a, region::F_HEIGHT, 5.0);
        region.append_child(root, a);

        let b = region.alloc().unwrap();
        region.set_layout_f32(b, region::F_GROW, 1.0);
        region.set_layout_f32(b, region::F_HEIGHT, 5.0);
        region.append_child(root, b);

        let mut ctx = LayoutContext::new();
        compute_layout(&region, &mut ctx, (80, 24));

        assert_eq!(
            (region.computed_x(root), region.computed_y(root)),
            (0.0, 0.0)
        );
        assert_eq!(
            (region.computed_width(root), region.computed_height(root)),
            (80.0, 10.0)
        );
        assert_eq!((region.computed_x(a), region.computed_y(a)), (2.0, 1.0));
        assert_eq!((region.computed_width(a), region.computed_height(a)), (20.0, 5.0));
        assert_eq!((region.computed_x(b), region.computed_y(b)), (22.0, 1.0));
        assert_eq!((region.computed_width(b), region.computed_height(b)), (58.0, 5.0));
    }

    #[test]
    fn percent_resolves_against_parent_inner_box() {
        let region = test_region();
        let parent = region.alloc().unwrap();
        region.set_layout_f32(parent, region::F_WIDTH, 50.0);
        region.set_layout_f32(parent, region::F_HEIGHT, 10.0);
        for side in [region::U_BORDER_TOP, region::U_BORDER_RIGHT, region::U_BORDER_BOTTOM, region::U_BORDER_LEFT] {
            region.set_layout_u8(parent, side, 1);
        }
        let child = region.alloc().unwrap();
        region.set_layout_f32(child, region::F_WIDTH, -100.0); // 100%
        region.set_layout_f32(child, region::F_HEIGHT, 3.0);
        region.append_child(parent, child);

        let mut ctx = LayoutContext::new();
        compute_layout(&region, &mut ctx, (80, 24));

        assert_eq!(region.computed_width(child), 48.0);
        assert_eq!(region.computed_x(child), 1.0);
    }

    #[test]
    fn auto_scroll_extent_from_overflowing_children() {
        let region = test_region();
        let parent = region.alloc().unwrap();
        region.set_layout_f32(parent, region::F_WIDTH, 20.0);
        region.set_layout_f32(parent, region::F_HEIGHT, 6.0);
        for _ in 0..15 {
            let child = region.alloc().unwrap();
            region.set_component_type(child, COMPONENT_TEXT);
            region.set_text(child, "line").unwrap();
            region.append_child(parent, child);
        }

        let mut ctx = LayoutContext::new();
        compute_layout(&region, &mut ctx, (80, 24));

        assert!(region.is_scrollable(parent));
        assert_eq!(region.scroll_extent_y(parent), 9.0);
        assert_eq!(region.scroll_extent_x(parent), 0.0);
    }

    #[test]
    fn overflow_hidden_never_scrolls() {
        let region = test_region();
        let parent = region.alloc().unwrap();
        region.set_layout_f32(parent, region::F_WIDTH, 10.0);
        region.set_layout_f32(parent, region::F_HEIGHT, 2.0);
        region.set_layout_u8(parent, region::U_OVERFLOW_Y, Overflow::Hidden as u8);
        region.set_layout_u8(parent, region::U_OVERFLOW_X, Overflow::Hidden as u8);
        for _ in 0..5 {
            let child = region.alloc().unwrap();
            region.set_layout_f32(child, region::F_HEIGHT, 1.0);
            region.set_layout_f32(child, region::F_WIDTH, 5.0);
            region.append_child(parent, child);
        }
        let mut ctx = LayoutContext::new();
        compute_layout(&region, &mut ctx, (80, 24));
        assert!(!region.is_scrollable(parent));
        assert_eq!(region.scroll_extent_y(parent), 0.0);
    }

    #[test]
    fn layout_is_deterministic() {
        let region = test_region();
        let root = region.alloc().unwrap();
        region.set_layout_u8(root, region::U_FLEX_DIRECTION, 1);
        region.set_layout_f32(root, region::F_GAP, 1.0);
        for i in 0..7 {
            let child = region.alloc().unwrap();
            region.set_layout_f32(child, region::F_GROW, (i % 3) as f32 + 0.5);
            region.set_layout_f32(child, region::F_HEIGHT, 3.0);
            region.append_child(root, child);
        }

        let mut ctx = LayoutContext::new();
        compute_layout(&region, &mut ctx, (80, 24));
        let first: Vec<u32> = (0..region.node_count())
            .flat_map(|n| {
                [
                    region.computed_x(n).to_bits(),
                    region.computed_y(n).to_bits(),
                    region.computed_width(n).to_bits(),
                    region.computed_height(n).to_bits(),
                ]
            })
            .collect();

        // Re-dirty and run again on a fresh context.
        for n in 0..region.node_count() {
            region.mark_dirty(n, crate::region::DIRTY_LAYOUT);
        }
        let mut ctx2 = LayoutContext::new();
        compute_layout(&region, &mut ctx2, (80, 24));
        let second: Vec<u32> = (0..region.node_count())
            .flat_map(|n| {
                [
                    region.computed_x(n).to_bits(),
                    region.computed_y(n).to_bits(),
                    region.computed_width(n).to_bits(),
                    region.computed_height(n).to_bits(),
                ]
            })
            .collect();
        assert_eq!(first, second);
    }

    #[test]
    fn cycle_is_detached_and_reported() {
        let region = test_region();
        let root = region.alloc().unwrap();
        let a = region.alloc().unwrap();
        let b = region.alloc().unwrap();
        region.append_child(root, a);
        region.append_child(a, b);
        // Corrupt the links: b's child list points back at a.
        region.set_node_i32(b, region::I_FIRST_CHILD, a as i32);

        let mut ctx = LayoutContext::new();
        compute_layout(&region, &mut ctx, (80, 24));
        assert!(ctx.diagnostics.iter().any(|d| d.node == a));
        assert_eq!(region.component_type(root), COMPONENT_BOX);
    }
}
