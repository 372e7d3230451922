// Rasterization and export of a composed page.

pub mod export;
pub mod raster;

pub use export::{export_page, ExportError, ExportFormat, ExportedArtifact};
pub use raster::render;
