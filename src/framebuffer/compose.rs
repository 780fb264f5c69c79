//! Composites the laid-out node tree into the current frame.
//!
//! Two passes per frame:
//!
//! 1. A DFS over the sibling links caches, per node, its absolute screen
//!    position (parent position + taffy location − parent scroll), the clip
//!    rect inherited from its nearest clipping ancestor, and whether its
//!    whole ancestor chain is visible.
//! 2. Nodes paint in global z-order: the DFS pre-order list stably sorted by
//!    `z_index` ascending, so equal z paints parents before children and
//!    earlier siblings first.
//!
//! Hit regions are collected in paint order; the router's hit grid keeps the
//! last (topmost) writer per cell.

use crate::layout::{display_width, truncate_text, wrap_text, LayoutDiagnostic};
use crate::region::{self, SharedRegion, COMPONENT_NONE, COMPONENT_TEXT};
use crate::renderer::Frame;
use crate::types::{Attr, BorderStyle, ClipRect, Overflow, Rgba, TextAlign, TextWrap};

use super::inheritance::{apply_opacity, effective_opacity, inherited_bg, inherited_fg};

/// Screen rectangle a node occupies, for mouse hit-testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HitRegion {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
    pub node: usize,
}

/// Reusable per-frame compositing scratch.
pub struct ComposeContext {
    screen_x: Vec<i32>,
    screen_y: Vec<i32>,
    clip: Vec<ClipRect>,
    shown: Vec<bool>,
    order: Vec<usize>,
}

impl ComposeContext {
    pub fn new() -> Self {
        Self {
            screen_x: Vec::new(),
            screen_y: Vec::new(),
            clip: Vec::new(),
            shown: Vec::new(),
            order: Vec::new(),
        }
    }

    fn reset(&mut self, count: usize, screen: ClipRect) {
        self.screen_x.clear();
        self.screen_x.resize(count, 0);
        self.screen_y.clear();
        self.screen_y.resize(count, 0);
        self.clip.clear();
        self.clip.resize(count, screen);
        self.shown.clear();
        self.shown.resize(count, false);
        self.order.clear();
    }
}

impl Default for ComposeContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Paint every visible node into `frame` and collect hit regions.
pub fn compose_frame(
    region: &SharedRegion,
    frame: &mut Frame<'_>,
    diagnostics: &[LayoutDiagnostic],
    ctx: &mut ComposeContext,
    hits: &mut Vec<HitRegion>,
) {
    frame.clear();
    hits.clear();

    let count = region.node_count();
    let screen = ClipRect::new(0, 0, frame.width(), frame.height());
    ctx.reset(count, screen);
    if count == 0 {
        return;
    }

    // Pass 1: positions, clips, visibility, pre-order.
    for root in 0..count {
        if region.component_type(root) == COMPONENT_NONE
            || !region.visible(root)
            || region.node_i32(root, region::I_PARENT) >= 0
        {
            continue;
        }
        place_subtree(region, root, count, screen, ctx);
    }

    // Pass 2: paint in z-order.
    let mut paint_order = ctx.order.clone();
    paint_order.sort_by_key(|&n| region.z_index(n));
    for &node in &paint_order {
        paint_node(region, frame, node, ctx, hits);
    }

    paint_diagnostics(region, frame, diagnostics, ctx);
}

/// DFS placing a root's subtree: absolute positions and inherited clips.
///
/// `ctx.order` is appended at visit time, not discovery time, so it is true
/// pre-order; the paint pass's stable z sort depends on that for the
/// "parents before children, earlier siblings first" tie-break.
fn place_subtree(
    region: &SharedRegion,
    root: usize,
    count: usize,
    screen: ClipRect,
    ctx: &mut ComposeContext,
) {
    ctx.screen_x[root] = region.computed_x(root) as i32;
    ctx.screen_y[root] = region.computed_y(root) as i32;
    ctx.clip[root] = screen;
    ctx.shown[root] = true;

    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        ctx.order.push(node);

        let child_clip = child_clip_for(region, node, ctx);
        let scroll_x = region.scroll_x(node) as i32;
        let scroll_y = region.scroll_y(node) as i32;
        let scrolls = region.is_scrollable(node);

        let children: Vec<usize> = region
            .children(node)
            .filter(|&child| {
                child < count
                    && region.component_type(child) != COMPONENT_NONE
                    && region.visible(child)
            })
            .collect();
        for &child in &children {
            let mut x = ctx.screen_x[node] + region.computed_x(child) as i32;
            let mut y = ctx.screen_y[node] + region.computed_y(child) as i32;
            if scrolls {
                x -= scroll_x;
                y -= scroll_y;
            }
            ctx.screen_x[child] = x;
            ctx.screen_y[child] = y;
            ctx.clip[child] = child_clip;
            ctx.shown[child] = true;
        }
        // Reversed so the first child pops, and therefore visits, first.
        for &child in children.iter().rev() {
            stack.push(child);
        }
    }
}

/// The clip rect `parent` imposes on its children: its inner box when it
/// clips (hidden/scroll, or implicit scroll), otherwise its own clip.
fn child_clip_for(region: &SharedRegion, parent: usize, ctx: &ComposeContext) -> ClipRect {
    let inherited = ctx.clip[parent];
    let overflow_x = Overflow::from_u8(region.node_u8(parent, region::U_OVERFLOW_X));
    let overflow_y = Overflow::from_u8(region.node_u8(parent, region::U_OVERFLOW_Y));
    let clips = overflow_x.clips() || overflow_y.clips() || region.is_scrollable(parent);
    if !clips {
        return inherited;
    }
    let inner = inner_box(region, parent, ctx.screen_x[parent], ctx.screen_y[parent]);
    inner.intersect(&inherited).unwrap_or(ClipRect::new(0, 0, 0, 0))
}

/// A node's inner box: computed box minus border and padding.
fn inner_box(region: &SharedRegion, node: usize, screen_x: i32, screen_y: i32) -> ClipRect {
    let w = region.computed_width(node) as i32;
    let h = region.computed_height(node) as i32;
    let left = region.node_u8(node, region::U_BORDER_LEFT) as i32
        + region.node_f32(node, region::F_PADDING_LEFT) as i32;
    let right = region.node_u8(node, region::U_BORDER_RIGHT) as i32
        + region.node_f32(node, region::F_PADDING_RIGHT) as i32;
    let top = region.node_u8(node, region::U_BORDER_TOP) as i32
        + region.node_f32(node, region::F_PADDING_TOP) as i32;
    let bottom = region.node_u8(node, region::U_BORDER_BOTTOM) as i32
        + region.node_f32(node, region::F_PADDING_BOTTOM) as i32;
    ClipRect::new(
        screen_x + left,
        screen_y + top,
        (w - left - right).max(0) as u16,
        (h - top - bottom).max(0) as u16,
    )
}

fn paint_node(
    region: &SharedRegion,
    frame: &mut Frame<'_>,
    node: usize,
    ctx: &ComposeContext,
    hits: &mut Vec<HitRegion>,
) {
    if !ctx.shown[node] {
        return;
    }
    let w = region.computed_width(node) as i32;
    let h = region.computed_height(node) as i32;
    if w <= 0 || h <= 0 {
        return;
    }

    let x = ctx.screen_x[node];
    let y = ctx.screen_y[node];
    let bounds = ClipRect::new(x, y, w as u16, h as u16);
    let Some(effective) = bounds.intersect(&ctx.clip[node]) else { return };
    let Some((vis_x, vis_y, vis_w, vis_h)) = effective.visible_on_screen() else { return };

    let opacity = effective_opacity(region, node);
    let fg = apply_opacity(inherited_fg(region, node), opacity);
    let bg = apply_opacity(inherited_bg(region, node), opacity);

    // Background. Terminal default leaves whatever is underneath.
    if !bg.is_terminal_default() && !bg.is_transparent() {
        frame.fill_rect(vis_x, vis_y, vis_w, vis_h, bg, Some(&effective));
    }

    hits.push(HitRegion { x: vis_x, y: vis_y, width: vis_w, height: vis_h, node });

    // Border.
    let style = BorderStyle::from_u8(region.node_u8(node, region::U_BORDER_STYLE));
    let sides = (
        region.node_u8(node, region::U_BORDER_TOP) > 0,
        region.node_u8(node, region::U_BORDER_RIGHT) > 0,
        region.node_u8(node, region::U_BORDER_BOTTOM) > 0,
        region.node_u8(node, region::U_BORDER_LEFT) > 0,
    );
    if style != BorderStyle::None && (sides.0 || sides.1 || sides.2 || sides.3) {
        let packed = region.node_u32(node, region::C_BORDER_COLOR);
        let border_color =
            apply_opacity(if packed != 0 { Rgba::unpack(packed) } else { fg }, opacity);
        frame.draw_border(bounds, style, sides, border_color, Rgba::TRANSPARENT, Some(&effective));
    }

    if region.component_type(node) == COMPONENT_TEXT {
        paint_text(region, frame, node, ctx, fg, &effective);
    }

    // Scrollbar on implicit/explicit vertical scrollers.
    if region.is_scrollable(node) && region.scroll_extent_y(node) > 0.0 {
        let inner = inner_box(region, node, x, y);
        let bar_x = x + w - 1 - region.node_u8(node, region::U_BORDER_RIGHT) as i32;
        if bar_x >= 0 && inner.height > 0 {
            let extent = region.scroll_extent_y(node);
            let pos = (region.scroll_y(node) / extent).clamp(0.0, 1.0);
            let ratio = inner.height as f32 / (extent + inner.height as f32);
            frame.draw_scrollbar(
                bar_x as u16,
                inner.y.max(0) as u16,
                inner.height,
                pos,
                ratio,
                fg,
                Some(&effective),
            );
        }
    }
}

fn paint_text(
    region: &SharedRegion,
    frame: &mut Frame<'_>,
    node: usize,
    ctx: &ComposeContext,
    fg: Rgba,
    clip: &ClipRect,
) {
    let text = region.text(node);
    if text.is_empty() {
        return;
    }

    let content = inner_box(region, node, ctx.screen_x[node], ctx.screen_y[node]);
    if content.width == 0 || content.height == 0 {
        return;
    }
    let Some(content_clip) = content.intersect(clip) else { return };

    let attrs = Attr::from_bits_truncate(region.node_u8(node, region::U_TEXT_ATTRS));
    let align = TextAlign::from_u8(region.node_u8(node, region::U_TEXT_ALIGN));
    let wrap = TextWrap::from_u8(region.node_u8(node, region::U_TEXT_WRAP));

    let lines: Vec<String> = match wrap {
        TextWrap::Wrap => wrap_text(text, content.width as usize),
        TextWrap::Truncate => vec![truncate_text(text, content.width as usize, "…")],
        TextWrap::Clip => text.lines().map(str::to_string).collect(),
    };

    for (i, line) in lines.iter().enumerate() {
        let line_y = content.y + i as i32;
        if line_y >= content.y + content.height as i32 {
            break;
        }
        if line_y < 0 {
            continue;
        }
        let line_w = display_width(line) as i32;
        let line_x = match align {
            TextAlign::Left => content.x,
            TextAlign::Center => content.x + (content.width as i32 - line_w).max(0) / 2,
            TextAlign::Right => content.x + (content.width as i32 - line_w).max(0),
        };
        if line_x >= 0 {
            frame.draw_text(
                line_x as u16,
                line_y as u16,
                line,
                fg,
                Rgba::TRANSPARENT,
                attrs,
                Some(&content_clip),
            );
        }
    }
}

/// Paint a "!" warning marker for each subtree the layout pass detached.
/// The marker lands at the offending node's parent (its nearest laid-out
/// position), falling back to the screen origin.
fn paint_diagnostics(
    region: &SharedRegion,
    frame: &mut Frame<'_>,
    diagnostics: &[LayoutDiagnostic],
    ctx: &ComposeContext,
) {
    for diag in diagnostics {
        let (mut x, mut y) = (0u16, 0u16);
        if let Some(parent) = region.parent_index(diag.node) {
            if parent < ctx.shown.len() && ctx.shown[parent] {
                x = ctx.screen_x[parent].max(0) as u16;
                y = ctx.screen_y[parent].max(0) as u16;
            }
        }
        let x = x.min(frame.width().saturating_sub(1));
        let y = y.min(frame.height().saturating_sub(1));
        frame.set_cell(x, y, '!' as u32, Rgba::YELLOW, Rgba::TERMINAL_DEFAULT, Attr::BOLD, None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{compute_layout, LayoutContext};
    use crate::region::{RegionConfig, COMPONENT_TEXT};
    use crate::types::Cell;

    fn setup() -> (SharedRegion, LayoutContext, ComposeContext, Vec<Cell>) {
        let region = SharedRegion::create(RegionConfig {
            max_nodes: 64,
            text_pool_size: 4096,
            max_viewport_width: 80,
            max_viewport_height: 24,
            event_ring_capacity: 8,
        })
        .unwrap();
        (region, LayoutContext::new(), ComposeContext::new(), vec![Cell::EMPTY; 80 * 24])
    }

    fn run(
        region: &SharedRegion,
        lctx: &mut LayoutContext,
        cctx: &mut ComposeContext,
        cells: &mut [Cell],
    ) -> Vec<HitRegion> {
        compute_layout(region, lctx, (80, 24));
        let mut frame = Frame::new(cells, 80, 24);
        let mut hits = Vec::new();
        compose_frame(region, &mut frame, &lctx.diagnostics, cctx, &mut hits);
        hits
    }

    #[test]
    fn background_fill_lands_in_rect() {
        let (region, mut lctx, mut cctx, mut cells) = setup();
        let root = region.alloc().unwrap();
        region.set_layout_f32(root, region::F_WIDTH, 10.0);
        region.set_layout_f32(root, region::F_HEIGHT, 3.0);
        region.set_color(root, region::C_BG_COLOR, Rgba::BLUE.pack());
        run(&region, &mut lctx, &mut cctx, &mut cells);

        let frame = Frame::new(&mut cells, 80, 24);
        assert_eq!(frame.get(0, 0).unwrap().bg_rgba(), Rgba::BLUE);
        assert_eq!(frame.get(9, 2).unwrap().bg_rgba(), Rgba::BLUE);
        assert_eq!(frame.get(10, 0).unwrap().bg_rgba(), Rgba::TERMINAL_DEFAULT);
    }

    #[test]
    fn text_paints_with_inherited_fg() {
        let (region, mut lctx, mut cctx, mut cells) = setup();
        let root = region.alloc().unwrap();
        region.set_layout_f32(root, region::F_WIDTH, 20.0);
        region.set_layout_f32(root, region::F_HEIGHT, 3.0);
        region.set_color(root, region::C_FG_COLOR, Rgba::GREEN.pack());
        let t = region.alloc().unwrap();
        region.set_component_type(t, COMPONENT_TEXT);
        region.set_text(t, "hi").unwrap();
        region.append_child(root, t);
        run(&region, &mut lctx, &mut cctx, &mut cells);

        let frame = Frame::new(&mut cells, 80, 24);
        assert_eq!(frame.get(0, 0).unwrap().glyph, 'h' as u32);
        assert_eq!(frame.get(1, 0).unwrap().glyph, 'i' as u32);
        assert_eq!(frame.get(0, 0).unwrap().fg_rgba(), Rgba::GREEN);
    }

    #[test]
    fn children_clip_inside_scrollable_parent() {
        let (region, mut lctx, mut cctx, mut cells) = setup();
        let parent = region.alloc().unwrap();
        region.set_layout_f32(parent, region::F_WIDTH, 20.0);
        region.set_layout_f32(parent, region::F_HEIGHT, 6.0);
        for i in 0..15 {
            let t = region.alloc().unwrap();
            region.set_component_type(t, COMPONENT_TEXT);
            region.set_text(t, &format!("line {i:02}")).unwrap();
            region.append_child(parent, t);
        }
        run(&region, &mut lctx, &mut cctx, &mut cells);

        let frame = Frame::new(&mut cells, 80, 24);
        // Rows 0..6 carry text; row 6 (clipped) stays empty.
        assert_eq!(frame.get(0, 0).unwrap().glyph, 'l' as u32);
        assert_eq!(frame.get(0, 5).unwrap().glyph, 'l' as u32);
        assert_eq!(frame.get(0, 6).unwrap().glyph, b' ' as u32);
    }

    #[test]
    fn scroll_offset_shifts_children_up() {
        let (region, mut lctx, mut cctx, mut cells) = setup();
        let parent = region.alloc().unwrap();
        region.set_layout_f32(parent, region::F_WIDTH, 20.0);
        region.set_layout_f32(parent, region::F_HEIGHT, 6.0);
        for i in 0..15 {
            let t = region.alloc().unwrap();
            region.set_component_type(t, COMPONENT_TEXT);
            region.set_text(t, &format!("line {i:02}")).unwrap();
            region.append_child(parent, t);
        }
        // First layout computes the scroll extent, then scroll down 3.
        {
            let mut scratch = vec![Cell::EMPTY; 80 * 24];
            run(&region, &mut lctx, &mut cctx, &mut scratch);
        }
        region.set_scroll(parent, 0.0, 3.0);
        run(&region, &mut lctx, &mut cctx, &mut cells);

        let frame = Frame::new(&mut cells, 80, 24);
        // Row 0 now shows "line 03".
        assert_eq!(frame.get(5, 0).unwrap().glyph, '0' as u32);
        assert_eq!(frame.get(6, 0).unwrap().glyph, '3' as u32);
    }

    #[test]
    fn z_order_later_sibling_paints_over() {
        let (region, mut lctx, mut cctx, mut cells) = setup();

        // Two overlapping root boxes; the HIGH z one sits in the lower slot.
        let top = region.alloc().unwrap();
        region.set_layout_f32(top, region::F_WIDTH, 10.0);
        region.set_layout_f32(top, region::F_HEIGHT, 5.0);
        region.set_color(top, region::C_BG_COLOR, Rgba::RED.pack());
        region.set_visual_u8(top, region::U_Z_INDEX, 5);
        let bottom = region.alloc().unwrap();
        region.set_layout_f32(bottom, region::F_WIDTH, 10.0);
        region.set_layout_f32(bottom, region::F_HEIGHT, 5.0);
        region.set_color(bottom, region::C_BG_COLOR, Rgba::BLUE.pack());

        let hits = run(&region, &mut lctx, &mut cctx, &mut cells);
        let frame = Frame::new(&mut cells, 80, 24);
        // Despite bottom being later in slot order, top's z=5 wins.
        assert_eq!(frame.get(2, 2).unwrap().bg_rgba(), Rgba::RED);
        // Hit regions follow paint order: top is last among overlapping.
        let last_at_origin = hits.iter().rev().find(|h| h.x == 0 && h.y == 0).unwrap();
        assert_eq!(last_at_origin.node, top);
    }

    #[test]
    fn equal_z_ties_paint_in_preorder_across_branches() {
        let (region, mut lctx, mut cctx, mut cells) = setup();

        // root → [A, B]; A → [A1]; B → [B1]. A1 and B1 share z = 5, so the
        // tie-break must visit them in pre-order: A1 (earlier subtree)
        // before B1, and never interleaved with the z = 0 ancestors.
        let root = region.alloc().unwrap();
        region.set_layout_f32(root, region::F_WIDTH, 20.0);
        region.set_layout_f32(root, region::F_HEIGHT, 10.0);

        let a = region.alloc().unwrap();
        region.set_layout_f32(a, region::F_WIDTH, 10.0);
        region.set_layout_f32(a, region::F_HEIGHT, 2.0);
        region.append_child(root, a);
        let b = region.alloc().unwrap();
        region.set_layout_f32(b, region::F_WIDTH, 10.0);
        region.set_layout_f32(b, region::F_HEIGHT, 2.0);
        region.append_child(root, b);

        let a1 = region.alloc().unwrap();
        region.set_layout_f32(a1, region::F_WIDTH, 10.0);
        region.set_layout_f32(a1, region::F_HEIGHT, 2.0);
        region.set_visual_u8(a1, region::U_Z_INDEX, 5);
        region.append_child(a, a1);
        let b1 = region.alloc().unwrap();
        region.set_layout_f32(b1, region::F_WIDTH, 10.0);
        region.set_layout_f32(b1, region::F_HEIGHT, 2.0);
        region.set_visual_u8(b1, region::U_Z_INDEX, 5);
        region.append_child(b, b1);

        let hits = run(&region, &mut lctx, &mut cctx, &mut cells);
        let paint_order: Vec<usize> = hits.iter().map(|h| h.node).collect();
        // Hit regions are pushed in paint order: the z = 0 chain in
        // pre-order, then the z = 5 pair in pre-order.
        assert_eq!(paint_order, vec![root, a, b, a1, b1]);
    }

    #[test]
    fn diagnostics_paint_a_warning_cell() {
        let (region, mut lctx, mut cctx, mut cells) = setup();
        let root = region.alloc().unwrap();
        region.set_layout_f32(root, region::F_WIDTH, 10.0);
        region.set_layout_f32(root, region::F_HEIGHT, 3.0);
        let a = region.alloc().unwrap();
        let b = region.alloc().unwrap();
        region.append_child(root, a);
        region.append_child(a, b);
        region.set_node_i32(b, region::I_FIRST_CHILD, a as i32); // cycle
        run(&region, &mut lctx, &mut cctx, &mut cells);

        let frame = Frame::new(&mut cells, 80, 24);
        let bang = frame.cells().iter().filter(|c| c.glyph == '!' as u32).count();
        assert!(bang >= 1);
    }
}
