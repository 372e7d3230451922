//! Brochure pipeline and its HTTP surface.
//!
//! `generator` runs one request end to end; `jobs` tracks requests accepted
//! over HTTP; `content` and `assets` supply the copy and images the
//! compositor lays out.

pub mod assets;
pub mod content;
pub mod generator;
pub mod handlers;
pub mod jobs;
pub mod layout_kind;

pub use generator::{BrochureGenerator, BrochureRequest, OutputSettings};
pub use jobs::JobStore;
pub use layout_kind::LayoutKind;
