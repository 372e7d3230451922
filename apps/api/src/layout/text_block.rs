//! Wrapped, aligned text with a color. Built per render pass.
//!
//! A block is measured once through [`FontSet::measure`]; the resulting
//! [`BoundingBox`] drives both the size of whatever backs the block and the
//! position of every line painted from it.

use image::Rgb;

use crate::layout::compositor::TEXT_COLOR;
use crate::layout::font_metrics::{BoundingBox, FontSet, FontSpec};
use crate::layout::wrap::wrap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

/// Text painted as one unit. `max_width` is the wrap bound in pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
    pub text: String,
    pub font: FontSpec,
    pub max_width: f32,
    pub align: Align,
    pub color: Rgb<u8>,
}

/// One line positioned relative to the block's top-left corner.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionedLine {
    pub text: String,
    pub dx: i32,
    pub dy: i32,
}

impl TextBlock {
    /// Left-aligned body-colored block.
    pub fn new(text: &str, font: FontSpec, max_width: f32) -> Self {
        Self {
            text: text.to_string(),
            font,
            max_width,
            align: Align::Left,
            color: TEXT_COLOR,
        }
    }

    /// A block that never wraps. Its text is painted as written, trimmed,
    /// with inner spacing kept.
    pub fn single_line(text: &str, font: FontSpec) -> Self {
        Self::new(text, font, f32::INFINITY)
    }

    pub fn with_align(mut self, align: Align) -> Self {
        self.align = align;
        self
    }

    pub fn with_color(mut self, color: Rgb<u8>) -> Self {
        self.color = color;
        self
    }

    /// Wraps at `max_width` and measures the wrapped lines as one box.
    /// An unbounded block is measured as written.
    ///
    /// Text with nothing to paint yields the empty box.
    pub fn measure(&self, fonts: &FontSet) -> BoundingBox {
        if self.max_width.is_infinite() {
            return fonts.measure(self.text.trim(), &self.font);
        }
        let wrapped = wrap(&self.text, fonts, &self.font, self.max_width);
        fonts.measure(&wrapped.join("\n"), &self.font)
    }

    /// Vertical space the block takes in a flow: one line pitch per line.
    ///
    /// This is the measured ink box plus half a leading above the first line
    /// and below the last.
    pub fn flow_height(&self, bbox: &BoundingBox) -> f32 {
        bbox.lines.len() as f32 * self.font.line_spacing()
    }

    /// Positions the measured lines inside a box `box_width` wide.
    pub fn position(&self, bbox: &BoundingBox, box_width: u32) -> Vec<PositionedLine> {
        position_lines(bbox, &self.font, self.align, box_width)
    }
}

/// Positions the lines of a measured box inside a box `box_width` wide.
///
/// Each line occupies one `line_spacing` slot; the glyph box is centered
/// vertically in its slot (half-leading above and below). `dy` is the top of
/// the glyph box, which is what the rasterizer expects.
pub fn position_lines(
    bbox: &BoundingBox,
    font: &FontSpec,
    align: Align,
    box_width: u32,
) -> Vec<PositionedLine> {
    let spacing = font.line_spacing();
    let half_leading = ((spacing - bbox.line_height()) / 2.0).max(0.0);

    bbox.lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            let slack = (box_width as f32 - line.width).max(0.0);
            let dx = match align {
                Align::Left => 0.0,
                Align::Center => slack / 2.0,
                Align::Right => slack,
            };
            PositionedLine {
                text: line.text.clone(),
                dx: dx.round() as i32,
                dy: (i as f32 * spacing + half_leading).round() as i32,
            }
        })
        .collect()
}
