//! Brochure pipeline: one request in, one exported page out.
//!
//! Flow: normalize name → gather copy → (optionally) generate images →
//!       persist + load assets → compose → rasterize → export.
//!
//! Collaborator failures never fail a brochure; they only swap in fallback
//! copy or leave image slots empty. The only hard failures are an empty
//! subject name and an export that cannot write even the PNG.

use std::path::PathBuf;
use std::sync::Arc;

use image::RgbaImage;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::brochure::assets::{brochure_stem, persist_image, ImageAssets};
use crate::brochure::content::gather_content;
use crate::brochure::layout_kind::LayoutKind;
use crate::collaborators::prompts::{image_prompt, Section};
use crate::collaborators::{ImageGenerator, ImageRequest, TextGenerator};
use crate::layout::compositor::{compose, ImageRole};
use crate::layout::title::normalize_subject_name;
use crate::layout::{FontRoles, FontSet};
use crate::render::{export_page, render, ExportError, ExportFormat};

// ────────────────────────────────────────────────────────────────────────────
// Data models
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrochureRequest {
    pub hotel_name: String,
    pub location: String,
    pub layout: LayoutKind,
    pub generate_images: bool,
}

/// What a finished pipeline run produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BrochureArtifact {
    pub path: PathBuf,
    pub format: ExportFormat,
    /// A PDF was requested but the PNG was written instead.
    pub fell_back: bool,
    /// Pixels of content below the page bottom; zero for a clean fit.
    pub overflow_px: u32,
    /// Copy sections that used fallback text.
    pub fallback_sections: Vec<String>,
    pub images_generated: usize,
}

#[derive(Debug, Error)]
pub enum BrochureError {
    #[error("hotel name is empty after normalization")]
    EmptyName,

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error("render task failed: {0}")]
    Render(String),
}

/// Output locations and format preference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputSettings {
    pub images_dir: PathBuf,
    pub brochures_dir: PathBuf,
    pub export_pdf: bool,
}

// ────────────────────────────────────────────────────────────────────────────
// Generator
// ────────────────────────────────────────────────────────────────────────────

pub struct BrochureGenerator {
    text: Arc<dyn TextGenerator>,
    images: Arc<dyn ImageGenerator>,
    fonts: Arc<FontSet>,
    roles: FontRoles,
    output: OutputSettings,
}

impl BrochureGenerator {
    pub fn new(
        text: Arc<dyn TextGenerator>,
        images: Arc<dyn ImageGenerator>,
        fonts: Arc<FontSet>,
        roles: FontRoles,
        output: OutputSettings,
    ) -> Self {
        Self {
            text,
            images,
            fonts,
            roles,
            output,
        }
    }

    pub async fn generate(&self, request: &BrochureRequest) -> Result<BrochureArtifact, BrochureError> {
        // Step 1: normalize the subject name
        let name = normalize_subject_name(&request.hotel_name);
        if name.is_empty() {
            return Err(BrochureError::EmptyName);
        }
        let location = request.location.trim().to_string();
        info!("Step 1: generating brochure for '{}' in '{}'", name, location);

        // Step 2: gather copy (fallbacks substituted per section)
        let content = gather_content(self.text.as_ref(), &name, &location).await;
        let fallback_sections: Vec<String> = content
            .fallbacks
            .iter()
            .map(|s| s.as_str().to_string())
            .collect();
        info!(
            "Step 2: copy gathered ({} of {} sections from fallbacks)",
            fallback_sections.len(),
            Section::ALL.len()
        );

        // Step 3: generate images if requested
        let generated = if request.generate_images {
            self.generate_images(&name, &location).await
        } else {
            info!("Step 3: image generation skipped; using images on disk");
            Vec::new()
        };
        let images_generated = generated.len();

        // Steps 4-6 are blocking file and pixel work.
        let page = content.to_page_content();
        let fonts = self.fonts.clone();
        let roles = self.roles;
        let output = self.output.clone();
        let stem = brochure_stem(&name, request.layout.as_str());

        let (exported, overflow_px) = tokio::task::spawn_blocking(move || {
            // Step 4: persist fresh images, then load whatever is on disk
            for (role, image) in &generated {
                if let Err(e) = persist_image(&output.images_dir, &name, *role, image) {
                    warn!("Could not save {} image: {}", role.as_str(), e);
                }
            }
            let assets = ImageAssets::load(&output.images_dir, &name);
            info!("Step 4: assets loaded ({:?})", assets.presence());

            // Step 5: compose and rasterize
            let layout = compose(&page, assets.presence(), &fonts, &roles);
            debug!(
                "Step 5: {} draw ops, {} blocks, title at {}px",
                layout.ops.len(),
                layout.blocks.len(),
                layout.title_font.size_px
            );
            let pixels = render(&layout, &fonts, &assets);

            // Step 6: export
            let exported = export_page(&pixels, &output.brochures_dir, &stem, output.export_pdf)?;
            Ok::<_, ExportError>((exported, layout.overflow_px))
        })
        .await
        .map_err(|e| BrochureError::Render(e.to_string()))??;

        info!(
            "Step 6: brochure exported to {} ({:?})",
            exported.path.display(),
            exported.format
        );

        Ok(BrochureArtifact {
            path: exported.path,
            format: exported.format,
            fell_back: exported.fell_back,
            overflow_px,
            fallback_sections,
            images_generated,
        })
    }

    /// One request per role; failures leave the slot to whatever is on disk.
    async fn generate_images(&self, name: &str, location: &str) -> Vec<(ImageRole, RgbaImage)> {
        let mut generated = Vec::with_capacity(ImageRole::ALL.len());

        for role in ImageRole::ALL {
            let request = ImageRequest::new(image_prompt(role, name, location));
            match self.images.generate(&request).await {
                Ok(image) => generated.push((role, image)),
                Err(e) => warn!("{} image generation failed: {}", role.as_str(), e),
            }
        }

        info!(
            "Step 3: {} of {} images generated",
            generated.len(),
            ImageRole::ALL.len()
        );
        generated
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
