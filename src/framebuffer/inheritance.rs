//! Color and opacity resolution along the parent chain.
//!
//! A packed color of 0 means "inherit": the compositor walks ancestors
//! until a concrete color appears, terminal default as the fallback.
//! Opacity multiplies down the chain and scales the resolved color's alpha.

use crate::region::{SharedRegion, C_BG_COLOR, C_FG_COLOR};
use crate::types::Rgba;

fn inherited(region: &SharedRegion, node: usize, field: usize) -> Rgba {
    let mut current = Some(node);
    let mut budget = region.max_nodes();
    while let Some(idx) = current {
        if budget == 0 {
            break;
        }
        budget -= 1;
        let packed = region.node_u32(idx, field);
        if packed != 0 {
            return Rgba::unpack(packed);
        }
        current = region.parent_index(idx);
    }
    Rgba::TERMINAL_DEFAULT
}

pub fn inherited_fg(region: &SharedRegion, node: usize) -> Rgba {
    inherited(region, node, C_FG_COLOR)
}

pub fn inherited_bg(region: &SharedRegion, node: usize) -> Rgba {
    inherited(region, node, C_BG_COLOR)
}

/// Cumulative opacity of a node (own × ancestors), 0.0–1.0.
pub fn effective_opacity(region: &SharedRegion, node: usize) -> f32 {
    let mut opacity = 1.0f32;
    let mut current = Some(node);
    let mut budget = region.max_nodes();
    while let Some(idx) = current {
        if budget == 0 {
            break;
        }
        budget -= 1;
        opacity *= region.opacity(idx) as f32 / 255.0;
        current = region.parent_index(idx);
    }
    opacity.clamp(0.0, 1.0)
}

/// Scale a color's alpha by an opacity factor. Sentinels pass through.
pub fn apply_opacity(color: Rgba, opacity: f32) -> Rgba {
    if opacity >= 1.0 || color.is_terminal_default() || color.is_ansi() {
        return color;
    }
    Rgba {
        a: ((color.a as f32) * opacity).round().clamp(0.0, 255.0) as i16,
        ..color
    }
}
