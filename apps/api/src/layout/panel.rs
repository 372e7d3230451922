//! Translucent panels sized to the text they back.

use image::Rgba;

use crate::layout::font_metrics::{BoundingBox, FontSet};
use crate::layout::text_block::TextBlock;

/// Semi-opaque white behind every text block.
pub const PANEL_FILL: Rgba<u8> = Rgba([255, 255, 255, 180]);

/// Axis-aligned rectangle in page pixels. `y` grows downward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> i32 {
        self.x + self.width as i32
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height as i32
    }
}

/// A placed panel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Panel {
    pub rect: Rect,
    pub fill: Rgba<u8>,
}

impl Panel {
    pub fn new(rect: Rect) -> Self {
        Self {
            rect,
            fill: PANEL_FILL,
        }
    }
}

/// Panel dimensions plus the block it backs and that block's measured box.
#[derive(Debug, Clone, PartialEq)]
pub struct SizedPanel {
    pub width: u32,
    pub height: u32,
    pub padding_x: u32,
    pub padding_y: u32,
    pub block: TextBlock,
    pub bbox: BoundingBox,
}

impl SizedPanel {
    /// Width available to text inside the padding.
    pub fn inner_width(&self) -> u32 {
        self.width.saturating_sub(2 * self.padding_x)
    }
}

/// Computes the minimal panel around `block`.
///
/// The block wraps at its own `max_width`, and the panel never exceeds that
/// bound plus the horizontal padding, even for a single word wider than the
/// bound. Height is the block's flow height plus the vertical padding.
/// Returns `None` when there is no text to back.
pub fn size_panel(
    fonts: &FontSet,
    block: TextBlock,
    padding_x: u32,
    padding_y: u32,
) -> Option<SizedPanel> {
    let bbox = block.measure(fonts);
    if bbox.lines.is_empty() {
        return None;
    }

    let cap = (block.max_width.ceil() as u32).saturating_add(2 * padding_x);
    let width = (bbox.width.ceil() as u32 + 2 * padding_x).min(cap);
    let height = block.flow_height(&bbox).ceil() as u32 + 2 * padding_y;

    Some(SizedPanel {
        width,
        height,
        padding_x,
        padding_y,
        block,
        bbox,
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
