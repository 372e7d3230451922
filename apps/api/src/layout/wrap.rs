//! Greedy word wrapping against measured glyph widths.
//!
//! Each candidate line is measured as a whole (current words plus the next
//! word, single-space joined) rather than by summing word widths, so kerning
//! across the joining space is accounted for.

use crate::layout::font_metrics::{FontSet, FontSpec};

/// Breaks `text` into lines no wider than `max_width_px`.
///
/// Only whitespace is a break opportunity. A word wider than the bound on its
/// own is committed alone on its line and never split. Empty or
/// whitespace-only text yields no lines.
pub fn wrap(text: &str, fonts: &FontSet, font: &FontSpec, max_width_px: f32) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
            continue;
        }

        let candidate = format!("{current} {word}");
        if fonts.measure_str(&candidate, font) > max_width_px {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
        } else {
            current = candidate;
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
