// Page layout: glyph metrics, wrapping, panel sizing and the flow compositor.
// Everything here is pure and CPU-bound; callers on the async runtime run it
// inside tokio::task::spawn_blocking.

pub mod compositor;
pub mod font_metrics;
pub mod panel;
pub mod text_block;
pub mod title;
pub mod wrap;

pub use compositor::{
    compose, AssetPresence, DrawOp, ImageRole, PageContent, PageLayout, PricingRow, PAGE_HEIGHT,
    PAGE_WIDTH,
};
pub use font_metrics::{default_font_roles, FontError, FontRoles, FontSet, FontSpec};
