//! Text flow: wrapping, truncation, and wrapped-height measurement.
//!
//! Breaks honor grapheme boundaries (UAX #29); the word-wrap mode breaks at
//! word bounds and force-breaks words wider than a line.

use unicode_segmentation::UnicodeSegmentation;

use super::measure::{display_width, grapheme_width};

/// Word-wrap `text` to `max_width` cells. Explicit newlines are hard breaks;
/// words wider than a line are force-broken at grapheme boundaries; leading
/// whitespace after a soft break is dropped.
pub fn wrap_text(text: &str, max_width: usize) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    if max_width == 0 {
        return vec![text.to_string()];
    }

    let mut lines = Vec::new();
    for raw in text.split('\n') {
        wrap_line(raw, max_width, &mut lines);
    }
    lines
}

fn wrap_line(line: &str, max_width: usize, lines: &mut Vec<String>) {
    let mut current = String::new();
    let mut width = 0usize;

    for segment in line.split_word_bounds() {
        let seg_width: usize = segment.graphemes(true).map(grapheme_width).sum();

        if width + seg_width > max_width {
            if width > 0 {
                lines.push(current.trim_end().to_string());
                current = String::new();
                width = 0;
            }
            if seg_width > max_width {
                for grapheme in segment.graphemes(true) {
                    let gw = grapheme_width(grapheme);
                    if width + gw > max_width && !current.is_empty() {
                        lines.push(std::mem::take(&mut current));
                        width = 0;
                    }
                    current.push_str(grapheme);
                    width += gw;
                }
                continue;
            }
            if segment.chars().all(char::is_whitespace) {
                continue;
            }
        }

        current.push_str(segment);
        width += seg_width;
    }

    lines.push(current);
}

/// Truncate to `max_width` cells, appending `suffix` when cut. Never splits
/// a grapheme; accounts for the suffix width.
pub fn truncate_text(text: &str, max_width: usize, suffix: &str) -> String {
    if max_width == 0 {
        return String::new();
    }
    if display_width(text) <= max_width {
        return text.to_string();
    }

    let suffix_width = display_width(suffix);
    if suffix_width >= max_width {
        return take_cells(suffix, max_width);
    }

    let mut out = take_cells(text, max_width - suffix_width);
    out.push_str(suffix);
    out
}

/// Leading graphemes of `text` filling at most `cells` cells.
fn take_cells(text: &str, cells: usize) -> String {
    let mut out = String::new();
    let mut width = 0usize;
    for grapheme in text.graphemes(true) {
        let gw = grapheme_width(grapheme);
        if width + gw > cells {
            break;
        }
        out.push_str(grapheme);
        width += gw;
    }
    out
}

/// Line count of `text` wrapped to `max_width`, without allocating the
/// wrapped lines. Zero for empty text; newline-count when width is zero.
pub fn wrapped_height(text: &str, max_width: usize) -> usize {
    if text.is_empty() {
        return 0;
    }
    if max_width == 0 {
        return text.split('\n').count();
    }

    let mut lines = 0usize;
    for raw in text.split('\n') {
        lines += 1;
        let mut width = 0usize;
        for grapheme in raw.graphemes(true) {
            let gw = grapheme_width(grapheme);
            if width + gw > max_width && width > 0 {
                lines += 1;
                width = gw;
            } else {
                width += gw;
            }
        }
    }
    lines
}
