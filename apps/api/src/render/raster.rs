//! Rasterizes a [`PageLayout`] display list into pixels.
//!
//! Layers, bottom to top: background photograph, gradient overlay, panels,
//! text, foreground images and checkbox outlines. Painting happens on an RGBA
//! canvas which is flattened onto opaque white at the end, so the returned
//! image carries no transparency.

use ab_glyph::Font;
use image::imageops::{self, FilterType};
use image::{Pixel, Rgb, RgbImage, Rgba, RgbaImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect as PixelRect;

use crate::brochure::assets::ImageAssets;
use crate::layout::compositor::{DrawOp, PageLayout};
use crate::layout::font_metrics::{FontSet, FontSpec};
use crate::layout::panel::Rect;

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
const GRADIENT_BASE_ALPHA: f32 = 80.0;
const GRADIENT_ALPHA_RANGE: f32 = 120.0;
const CHECKBOX_STROKE: u32 = 2;

/// Paints every op of `layout` and returns the flattened page.
///
/// Ops referring to an image the asset set does not hold are skipped.
pub fn render(layout: &PageLayout, fonts: &FontSet, assets: &ImageAssets) -> RgbImage {
    let mut canvas = RgbaImage::from_pixel(layout.width, layout.height, WHITE);

    // Stable sort keeps emission order within a layer.
    let mut ops: Vec<&DrawOp> = layout.ops.iter().collect();
    ops.sort_by_key(|op| op.layer());

    for op in ops {
        match op {
            DrawOp::Background { role } => {
                if let Some(photo) = assets.get(*role) {
                    let resized = imageops::resize(photo, layout.width, layout.height, FilterType::Lanczos3);
                    imageops::overlay(&mut canvas, &resized, 0, 0);
                }
            }
            DrawOp::Gradient => apply_gradient(&mut canvas),
            DrawOp::Panel(panel) => blend_rect(&mut canvas, &panel.rect, panel.fill),
            DrawOp::Text {
                x,
                y,
                text,
                font,
                color,
            } => draw_line(&mut canvas, fonts, *x, *y, text, font, *color),
            DrawOp::Image { role, rect } => {
                if let Some(image) = assets.get(*role) {
                    let resized = imageops::resize(image, rect.width, rect.height, FilterType::Lanczos3);
                    imageops::overlay(&mut canvas, &resized, rect.x as i64, rect.y as i64);
                }
            }
            DrawOp::Checkbox { rect, color } => {
                for inset in 0..CHECKBOX_STROKE {
                    let w = rect.width.saturating_sub(2 * inset);
                    let h = rect.height.saturating_sub(2 * inset);
                    if w > 0 && h > 0 {
                        let outline =
                            PixelRect::at(rect.x + inset as i32, rect.y + inset as i32).of_size(w, h);
                        draw_hollow_rect_mut(&mut canvas, outline, opaque(*color));
                    }
                }
            }
        }
    }

    flatten(&canvas)
}

fn opaque(color: Rgb<u8>) -> Rgba<u8> {
    Rgba([color[0], color[1], color[2], 255])
}

/// Paints one line with its glyph box's top-left at `(x, y)`.
///
/// Glyphs sit exactly where [`FontSet::layout_line`] puts them, so the ink
/// never runs past the width the layout measured. Coverage becomes alpha.
fn draw_line(
    canvas: &mut RgbaImage,
    fonts: &FontSet,
    x: i32,
    y: i32,
    text: &str,
    font: &FontSpec,
    color: Rgb<u8>,
) {
    let face = fonts.face(font.face);
    let (width, height) = (canvas.width() as i32, canvas.height() as i32);

    for glyph in fonts.layout_line(text, font) {
        let Some(outlined) = face.outline_glyph(glyph) else {
            continue;
        };
        let bounds = outlined.px_bounds();
        let left = x + bounds.min.x.round() as i32;
        let top = y + bounds.min.y.round() as i32;

        outlined.draw(|gx, gy, coverage| {
            let px = left + gx as i32;
            let py = top + gy as i32;
            if px < 0 || py < 0 || px >= width || py >= height {
                return;
            }
            let alpha = (coverage.clamp(0.0, 1.0) * 255.0).round() as u8;
            if alpha > 0 {
                canvas
                    .get_pixel_mut(px as u32, py as u32)
                    .blend(&Rgba([color[0], color[1], color[2], alpha]));
            }
        });
    }
}

/// Black overlay whose alpha grows from 80 at the top to 200 at the bottom.
fn apply_gradient(canvas: &mut RgbaImage) {
    let height = canvas.height() as f32;
    for (_, y, pixel) in canvas.enumerate_pixels_mut() {
        let alpha = GRADIENT_BASE_ALPHA + (y as f32 / height) * GRADIENT_ALPHA_RANGE;
        pixel.blend(&Rgba([0, 0, 0, alpha as u8]));
    }
}

/// Alpha-blends `color` over the part of `rect` that lies on the canvas.
fn blend_rect(canvas: &mut RgbaImage, rect: &Rect, color: Rgba<u8>) {
    let x0 = rect.x.max(0) as u32;
    let y0 = rect.y.max(0) as u32;
    let x1 = (rect.right().max(0) as u32).min(canvas.width());
    let y1 = (rect.bottom().max(0) as u32).min(canvas.height());

    for y in y0..y1 {
        for x in x0..x1 {
            canvas.get_pixel_mut(x, y).blend(&color);
        }
    }
}

/// Composites the canvas over opaque white and drops the alpha channel.
pub fn flatten(canvas: &RgbaImage) -> RgbImage {
    RgbImage::from_fn(canvas.width(), canvas.height(), |x, y| {
        let Rgba([r, g, b, a]) = *canvas.get_pixel(x, y);
        let a = a as u32;
        let over_white = |c: u8| ((c as u32 * a + 255 * (255 - a) + 127) / 255) as u8;
        Rgb([over_white(r), over_white(g), over_white(b)])
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
