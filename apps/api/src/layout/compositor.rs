//! Flow compositor: lays the brochure out top to bottom in one forward pass.
//!
//! The page is visited as a fixed sequence of states:
//!
//! ```text
//! Background → Title → Location → Overview → [Room | Restaurant] → Amenities → Pricing → Contact
//! ```
//!
//! Each state anchors at the previous state's measured bottom plus a fixed
//! gap. Nothing is ever moved once placed. Content that runs past the bottom
//! edge is reported in [`PageLayout::overflow_px`] and clipped at raster time.
//!
//! The output is a display list ([`DrawOp`]) with no pixels in it; the
//! rasterizer in `render::raster` turns it into an image.

use image::Rgb;
use tracing::{debug, warn};

use crate::layout::font_metrics::{BoundingBox, FontRoles, FontSet, FontSpec};
use crate::layout::panel::{size_panel, Panel, Rect, SizedPanel};
use crate::layout::text_block::{Align, TextBlock};
use crate::layout::title::{fit_title_font, TITLE_SIDE_MARGIN};

pub const PAGE_WIDTH: u32 = 1780;
pub const PAGE_HEIGHT: u32 = 2480;

pub const TEXT_COLOR: Rgb<u8> = Rgb([20, 20, 20]);
pub const ACCENT_COLOR: Rgb<u8> = Rgb([200, 170, 110]);

pub const AMENITIES_HEADING: &str = "LUXURY AMENITIES";
pub const PRICING_HEADING: &str = "ACCOMMODATIONS";

const TITLE_TOP: i32 = 80;
const TITLE_PADDING: (u32, u32) = (50, 20);
const LOCATION_PADDING: (u32, u32) = (80, 12);

const GAP_TITLE_TO_LOCATION: i32 = 60;
const GAP_LOCATION_TO_OVERVIEW: i32 = 60;
const GAP_TITLE_TO_OVERVIEW: i32 = 90;
const GAP_OVERVIEW_TO_PAIR: i32 = 80;
const GAP_PAIR_TO_AMENITIES: i32 = 90;
const GAP_AMENITIES_TO_PRICING: i32 = 50;
const GAP_PRICING_TO_CONTACT: i32 = 30;

const OVERVIEW_WIDTH_RATIO: f32 = 0.6;
const OVERVIEW_PADDING: (u32, u32) = (60, 45);

const PAIR_SIDE_MARGIN: u32 = 180;
const PAIR_TOTAL_MARGIN: u32 = 480;
const PAIR_IMAGE_ASPECT: f32 = 0.55;
const CAPTION_GAP: i32 = 20;
const CAPTION_PADDING: (u32, u32) = (40, 30);

const HEADING_PADDING: (u32, u32) = (80, 12);
const GRID_TOP_GAP: i32 = 20;
const GRID_WIDTH_RATIO: f32 = 0.9;
const GRID_GUTTER: u32 = 60;
const GRID_ROW_HEIGHT: u32 = 56;
const GRID_ROW_GAP: u32 = 14;
const CHECKBOX_SIZE: u32 = 24;
const CHECKBOX_GAP: u32 = 15;

const PRICING_PADDING: (u32, u32) = (60, 20);
const PRICING_COLUMN_GAP: f32 = 20.0;

const CONTACT_PADDING: (u32, u32) = (20, 16);
const CONTACT_BOTTOM_MARGIN: i32 = 30;

// ────────────────────────────────────────────────────────────────────────────
// Inputs
// ────────────────────────────────────────────────────────────────────────────

/// Image slots on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageRole {
    Exterior,
    Room,
    Restaurant,
}

impl ImageRole {
    pub const ALL: [ImageRole; 3] = [ImageRole::Exterior, ImageRole::Room, ImageRole::Restaurant];

    pub fn as_str(&self) -> &'static str {
        match self {
            ImageRole::Exterior => "exterior",
            ImageRole::Room => "room",
            ImageRole::Restaurant => "restaurant",
        }
    }
}

/// Which image assets exist for this render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AssetPresence {
    pub exterior: bool,
    pub room: bool,
    pub restaurant: bool,
}

impl AssetPresence {
    pub fn has(&self, role: ImageRole) -> bool {
        match role {
            ImageRole::Exterior => self.exterior,
            ImageRole::Room => self.room,
            ImageRole::Restaurant => self.restaurant,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricingRow {
    pub room: String,
    pub price: String,
}

/// Display-ready text for every block. Empty strings skip their block.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PageContent {
    pub title: String,
    pub location: String,
    pub overview: String,
    pub room_caption: String,
    pub restaurant_caption: String,
    pub amenities: Vec<String>,
    pub pricing: Vec<PricingRow>,
    pub contact: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Display list
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    /// Full-page photograph.
    Background { role: ImageRole },
    /// Darkening overlay, only drawn over a photograph.
    Gradient,
    Panel(Panel),
    /// `y` is the top of the glyph box.
    Text {
        x: i32,
        y: i32,
        text: String,
        font: FontSpec,
        color: Rgb<u8>,
    },
    Image { role: ImageRole, rect: Rect },
    Checkbox { rect: Rect, color: Rgb<u8> },
}

impl DrawOp {
    /// Paint order; lower layers are painted first.
    pub fn layer(&self) -> u8 {
        match self {
            DrawOp::Background { .. } => 0,
            DrawOp::Gradient => 1,
            DrawOp::Panel(_) => 2,
            DrawOp::Text { .. } => 3,
            DrawOp::Image { .. } | DrawOp::Checkbox { .. } => 4,
        }
    }
}

/// States of the forward pass that place blocks, in visit order. The
/// background state paints but places nothing.
#[cfg(test)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FlowState {
    Title,
    Location,
    Overview,
    Pair,
    Amenities,
    Pricing,
    Contact,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
    Title,
    Location,
    Overview,
    RoomImage,
    RoomCaption,
    RestaurantImage,
    RestaurantCaption,
    AmenitiesHeading,
    AmenityCell,
    Pricing,
    Contact,
}

#[cfg(test)]
impl BlockKind {
    pub fn state(&self) -> FlowState {
        match self {
            BlockKind::Title => FlowState::Title,
            BlockKind::Location => FlowState::Location,
            BlockKind::Overview => FlowState::Overview,
            BlockKind::RoomImage
            | BlockKind::RoomCaption
            | BlockKind::RestaurantImage
            | BlockKind::RestaurantCaption => FlowState::Pair,
            BlockKind::AmenitiesHeading | BlockKind::AmenityCell => FlowState::Amenities,
            BlockKind::Pricing => FlowState::Pricing,
            BlockKind::Contact => FlowState::Contact,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedBlock {
    pub kind: BlockKind,
    pub rect: Rect,
    /// Wrapped text lines inside the block; 0 for images.
    pub line_count: usize,
}

/// Result of one compose pass.
#[derive(Debug, Clone, PartialEq)]
pub struct PageLayout {
    pub width: u32,
    pub height: u32,
    pub title_font: FontSpec,
    pub ops: Vec<DrawOp>,
    pub blocks: Vec<PlacedBlock>,
    /// Pixels placed content extends below the page bottom.
    pub overflow_px: u32,
}

#[cfg(test)]
impl PageLayout {
    pub fn block(&self, kind: BlockKind) -> Option<&PlacedBlock> {
        self.blocks.iter().find(|b| b.kind == kind)
    }

    pub fn blocks_of(&self, kind: BlockKind) -> impl Iterator<Item = &PlacedBlock> {
        self.blocks.iter().filter(move |b| b.kind == kind)
    }

    /// `(state, top, bottom)` for each state that placed anything, in visit order.
    pub fn state_spans(&self) -> Vec<(FlowState, i32, i32)> {
        let mut spans: Vec<(FlowState, i32, i32)> = Vec::new();
        for block in &self.blocks {
            let state = block.kind.state();
            match spans.last_mut() {
                Some(span) if span.0 == state => {
                    span.1 = span.1.min(block.rect.y);
                    span.2 = span.2.max(block.rect.bottom());
                }
                _ => spans.push((state, block.rect.y, block.rect.bottom())),
            }
        }
        spans
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Compose
// ────────────────────────────────────────────────────────────────────────────

/// Lays out one brochure page.
pub fn compose(
    content: &PageContent,
    assets: AssetPresence,
    fonts: &FontSet,
    roles: &FontRoles,
) -> PageLayout {
    let title_font = fit_title_font(
        fonts,
        &content.title,
        roles.title,
        (PAGE_WIDTH - TITLE_SIDE_MARGIN) as f32,
    );
    if title_font.size_px < roles.title.size_px {
        debug!(
            "Title reduced from {}px to {}px to fit",
            roles.title.size_px, title_font.size_px
        );
    }

    let mut flow = Flow::new(fonts);

    flow.background(assets.exterior);
    flow.title(&content.title, &title_font);

    let overview_gap = if flow.location(&content.location, &roles.heading) {
        GAP_LOCATION_TO_OVERVIEW
    } else {
        GAP_TITLE_TO_OVERVIEW
    };

    flow.overview(&content.overview, &roles.body, overview_gap);
    flow.pair(content, assets, &roles.caption);
    flow.amenities(&content.amenities, &roles.heading, &roles.body);
    flow.pricing(&content.pricing, &roles.heading, &roles.body);
    flow.contact(&content.contact, &roles.footer);

    let overflow_px = (flow.cursor - PAGE_HEIGHT as i32).max(0) as u32;
    if overflow_px > 0 {
        warn!(
            "Layout overflows the page by {}px; content below {} will be clipped",
            overflow_px, PAGE_HEIGHT
        );
    }

    PageLayout {
        width: PAGE_WIDTH,
        height: PAGE_HEIGHT,
        title_font,
        ops: flow.ops,
        blocks: flow.blocks,
        overflow_px,
    }
}

/// Mutable state of the single forward pass.
struct Flow<'a> {
    fonts: &'a FontSet,
    ops: Vec<DrawOp>,
    blocks: Vec<PlacedBlock>,
    /// Bottom of the lowest block placed so far. Never decreases.
    cursor: i32,
}

impl<'a> Flow<'a> {
    fn new(fonts: &'a FontSet) -> Self {
        Self {
            fonts,
            ops: Vec::new(),
            blocks: Vec::new(),
            cursor: 0,
        }
    }

    fn record(&mut self, kind: BlockKind, rect: Rect, line_count: usize) {
        let block = PlacedBlock {
            kind,
            rect,
            line_count,
        };
        debug!(
            "Placed {:?} at ({}, {}) {}x{}, {} lines",
            block.kind,
            block.rect.x,
            block.rect.y,
            block.rect.width,
            block.rect.height,
            block.line_count
        );
        self.blocks.push(block);
    }

    fn advance_to(&mut self, bottom: i32) {
        self.cursor = self.cursor.max(bottom);
    }

    /// Emits one text op per measured line, in the block's color and
    /// aligned inside a box `box_width` wide whose top-left is `(x, y)`.
    fn paint_block(&mut self, block: &TextBlock, bbox: &BoundingBox, x: i32, y: i32, box_width: u32) {
        for line in block.position(bbox, box_width) {
            self.ops.push(DrawOp::Text {
                x: x + line.dx,
                y: y + line.dy,
                text: line.text,
                font: block.font,
                color: block.color,
            });
        }
    }

    /// Emits a panel and its text lines; returns the panel rectangle.
    fn place_text_panel(&mut self, sized: &SizedPanel, x: i32, y: i32) -> Rect {
        let rect = Rect::new(x, y, sized.width, sized.height);
        self.ops.push(DrawOp::Panel(Panel::new(rect)));
        self.paint_block(
            &sized.block,
            &sized.bbox,
            x + sized.padding_x as i32,
            y + sized.padding_y as i32,
            sized.inner_width(),
        );
        rect
    }

    fn background(&mut self, has_exterior: bool) {
        if has_exterior {
            self.ops.push(DrawOp::Background {
                role: ImageRole::Exterior,
            });
            self.ops.push(DrawOp::Gradient);
        } else {
            debug!("No exterior image; plain white background");
        }
    }

    fn title(&mut self, text: &str, font: &FontSpec) {
        let (px, py) = TITLE_PADDING;
        let block = panel_block(text, font, PAGE_WIDTH, px).with_align(Align::Center);
        if let Some(sized) = size_panel(self.fonts, block, px, py) {
            let rect = self.place_text_panel(&sized, centered_x(sized.width), TITLE_TOP);
            self.record(BlockKind::Title, rect, sized.bbox.lines.len());
            self.advance_to(rect.bottom());
        }
    }

    /// Returns whether a location block was placed.
    fn location(&mut self, text: &str, font: &FontSpec) -> bool {
        let (px, py) = LOCATION_PADDING;
        let block = panel_block(text, font, PAGE_WIDTH, px).with_align(Align::Center);
        match size_panel(self.fonts, block, px, py) {
            Some(sized) => {
                let top = self.cursor + GAP_TITLE_TO_LOCATION;
                let rect = self.place_text_panel(&sized, centered_x(sized.width), top);
                self.record(BlockKind::Location, rect, sized.bbox.lines.len());
                self.advance_to(rect.bottom());
                true
            }
            None => false,
        }
    }

    fn overview(&mut self, text: &str, font: &FontSpec, gap: i32) {
        let (px, py) = OVERVIEW_PADDING;
        let max_width = (PAGE_WIDTH as f32 * OVERVIEW_WIDTH_RATIO) as u32;
        if let Some(sized) = size_panel(self.fonts, panel_block(text, font, max_width, px), px, py) {
            let top = self.cursor + gap;
            let rect = self.place_text_panel(&sized, centered_x(sized.width), top);
            self.record(BlockKind::Overview, rect, sized.bbox.lines.len());
            self.advance_to(rect.bottom());
        }
    }

    /// Room and restaurant side by side. Both members share one top edge and
    /// the cursor moves to the lower of the two bottoms.
    fn pair(&mut self, content: &PageContent, assets: AssetPresence, caption_font: &FontSpec) {
        let column_width = (PAGE_WIDTH - PAIR_TOTAL_MARGIN) / 2;
        let image_height = (column_width as f32 * PAIR_IMAGE_ASPECT) as u32;
        let top = self.cursor + GAP_OVERVIEW_TO_PAIR;

        let columns = [
            (
                ImageRole::Room,
                PAIR_SIDE_MARGIN as i32,
                content.room_caption.as_str(),
                BlockKind::RoomImage,
                BlockKind::RoomCaption,
            ),
            (
                ImageRole::Restaurant,
                (PAGE_WIDTH - column_width - PAIR_SIDE_MARGIN) as i32,
                content.restaurant_caption.as_str(),
                BlockKind::RestaurantImage,
                BlockKind::RestaurantCaption,
            ),
        ];

        let mut pair_bottom = self.cursor;
        for (role, x, caption, image_kind, caption_kind) in columns {
            let mut caption_top = top;

            if assets.has(role) {
                let rect = Rect::new(x, top, column_width, image_height);
                self.ops.push(DrawOp::Image { role, rect });
                self.record(image_kind, rect, 0);
                pair_bottom = pair_bottom.max(rect.bottom());
                caption_top = rect.bottom() + CAPTION_GAP;
            } else {
                debug!("No {} image; caption moves to the pair top", role.as_str());
            }

            let (px, py) = CAPTION_PADDING;
            let block = panel_block(caption, caption_font, column_width, px).with_align(Align::Center);
            if let Some(sized) = size_panel(self.fonts, block, px, py) {
                let panel_x = x + (column_width as i32 - sized.width as i32) / 2;
                let rect = self.place_text_panel(&sized, panel_x, caption_top);
                self.record(caption_kind, rect, sized.bbox.lines.len());
                pair_bottom = pair_bottom.max(rect.bottom());
            }
        }

        self.advance_to(pair_bottom);
    }

    fn amenities(&mut self, items: &[String], heading_font: &FontSpec, item_font: &FontSpec) {
        let items: Vec<&str> = items
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect();
        if items.is_empty() {
            return;
        }

        let (px, py) = HEADING_PADDING;
        let block = panel_block(AMENITIES_HEADING, heading_font, PAGE_WIDTH, px).with_align(Align::Center);
        let Some(heading) = size_panel(self.fonts, block, px, py) else {
            return;
        };
        let heading_top = self.cursor + GAP_PAIR_TO_AMENITIES;
        let heading_rect = self.place_text_panel(&heading, centered_x(heading.width), heading_top);
        self.record(BlockKind::AmenitiesHeading, heading_rect, heading.bbox.lines.len());

        let grid_width = (PAGE_WIDTH as f32 * GRID_WIDTH_RATIO) as u32;
        let grid_left = centered_x(grid_width);
        let cell_width = (grid_width - GRID_GUTTER) / 2;
        let grid_top = heading_rect.bottom() + GRID_TOP_GAP;
        let mut grid_bottom = heading_rect.bottom();

        for (i, item) in items.iter().enumerate() {
            let column = (i % 2) as i32;
            let row = (i / 2) as i32;
            let cell = Rect::new(
                grid_left + column * (cell_width + GRID_GUTTER) as i32,
                grid_top + row * (GRID_ROW_HEIGHT + GRID_ROW_GAP) as i32,
                cell_width,
                GRID_ROW_HEIGHT,
            );
            self.ops.push(DrawOp::Panel(Panel::new(cell)));

            // Checkbox and label are centered as one group, not wrapped.
            let label = TextBlock::single_line(item, *item_font);
            let label_box = label.measure(self.fonts);
            let group_width = (CHECKBOX_SIZE + CHECKBOX_GAP) as f32 + label_box.width;
            let group_x = cell.x + ((cell_width as f32 - group_width) / 2.0).max(0.0).round() as i32;

            self.ops.push(DrawOp::Checkbox {
                rect: Rect::new(
                    group_x,
                    cell.y + (GRID_ROW_HEIGHT - CHECKBOX_SIZE) as i32 / 2,
                    CHECKBOX_SIZE,
                    CHECKBOX_SIZE,
                ),
                color: label.color,
            });
            let label_y = cell.y + ((GRID_ROW_HEIGHT as f32 - label_box.line_height()) / 2.0).round() as i32;
            for line in &label_box.lines {
                self.ops.push(DrawOp::Text {
                    x: group_x + (CHECKBOX_SIZE + CHECKBOX_GAP) as i32,
                    y: label_y,
                    text: line.text.clone(),
                    font: label.font,
                    color: label.color,
                });
            }

            self.record(BlockKind::AmenityCell, cell, 1);
            grid_bottom = grid_bottom.max(cell.bottom());
        }

        self.advance_to(grid_bottom);
    }

    /// Heading and rows in one panel; names end at `center − 20`, prices start
    /// at `center + 20`.
    fn pricing(&mut self, rows: &[PricingRow], heading_font: &FontSpec, row_font: &FontSpec) {
        if rows.is_empty() {
            return;
        }

        let heading = TextBlock::single_line(PRICING_HEADING, *heading_font).with_align(Align::Center);
        let heading_box = heading.measure(self.fonts);
        let measured: Vec<_> = rows
            .iter()
            .map(|row| {
                let name = TextBlock::single_line(&row.room, *row_font).with_align(Align::Right);
                let price = TextBlock::single_line(&row.price, *row_font).with_color(ACCENT_COLOR);
                let name_box = name.measure(self.fonts);
                let price_box = price.measure(self.fonts);
                (name, name_box, price, price_box)
            })
            .collect();

        let half = measured
            .iter()
            .map(|(_, name_box, _, price_box)| name_box.width.max(price_box.width))
            .fold(0.0f32, f32::max)
            + PRICING_COLUMN_GAP;
        let inner_width = (2.0 * half).max(heading_box.width).ceil() as u32;

        let (px, py) = PRICING_PADDING;
        let heading_slot = heading_font.line_spacing();
        let row_slot = row_font.line_spacing();
        let inner_height = (heading_slot + rows.len() as f32 * row_slot).ceil() as u32;

        let rect = Rect::new(
            centered_x(inner_width + 2 * px),
            self.cursor + GAP_AMENITIES_TO_PRICING,
            inner_width + 2 * px,
            inner_height + 2 * py,
        );
        self.ops.push(DrawOp::Panel(Panel::new(rect)));

        let inner_left = rect.x + px as i32;
        let inner_top = rect.y + py as i32;
        self.paint_block(&heading, &heading_box, inner_left, inner_top, inner_width);

        let center = rect.x + rect.width as i32 / 2;
        let gap = PRICING_COLUMN_GAP as i32;
        let column = (center - gap - inner_left).max(0) as u32;
        for (i, (name, name_box, price, price_box)) in measured.iter().enumerate() {
            let row_top = (inner_top as f32 + heading_slot + i as f32 * row_slot).round() as i32;
            self.paint_block(name, name_box, inner_left, row_top, column);
            self.paint_block(price, price_box, center + gap, row_top, column);
        }

        self.record(BlockKind::Pricing, rect, rows.len() + 1);
        self.advance_to(rect.bottom());
    }

    /// Pinned near the bottom edge unless the flow has already passed it.
    fn contact(&mut self, text: &str, font: &FontSpec) {
        let (px, py) = CONTACT_PADDING;
        let block = TextBlock::single_line(text, *font).with_align(Align::Center);
        if let Some(sized) = size_panel(self.fonts, block, px, py) {
            let pinned = PAGE_HEIGHT as i32 - CONTACT_BOTTOM_MARGIN - sized.height as i32;
            let top = (self.cursor + GAP_PRICING_TO_CONTACT).max(pinned);
            let rect = self.place_text_panel(&sized, centered_x(sized.width), top);
            self.record(BlockKind::Contact, rect, sized.bbox.lines.len());
            self.advance_to(rect.bottom());
        }
    }
}

/// Body-colored block that wraps so its panel, padding included, is at most
/// `panel_max` wide.
fn panel_block(text: &str, font: &FontSpec, panel_max: u32, padding_x: u32) -> TextBlock {
    TextBlock::new(text, *font, panel_max.saturating_sub(2 * padding_x) as f32)
}

fn centered_x(width: u32) -> i32 {
    (PAGE_WIDTH as i32 - width as i32) / 2
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
