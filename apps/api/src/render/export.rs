//! Serializes the flattened page to disk.
//!
//! PNG is always encoded. When a PDF is requested the raw RGB pixels become
//! the single image XObject of a one-page document whose MediaBox matches the
//! pixel size. Any PDF failure falls back to writing the PNG; only a PNG
//! failure surfaces as an error.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::{ImageFormat, RgbImage};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("PNG encoding failed: {0}")]
    Encode(#[from] image::ImageError),

    #[error("PDF assembly failed: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Pdf,
    Png,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Png => "png",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Pdf => "application/pdf",
            ExportFormat::Png => "image/png",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportedArtifact {
    pub path: PathBuf,
    pub format: ExportFormat,
    /// A PDF was requested but the PNG was written instead.
    pub fell_back: bool,
}

pub fn encode_png(image: &RgbImage) -> Result<Vec<u8>, ExportError> {
    let mut bytes = Cursor::new(Vec::new());
    image.write_to(&mut bytes, ImageFormat::Png)?;
    Ok(bytes.into_inner())
}

/// One-page PDF holding `image` at one PDF unit per pixel.
pub fn build_pdf(image: &RgbImage) -> Result<Vec<u8>, ExportError> {
    let (width, height) = image.dimensions();

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut pixels = Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width as i64,
            "Height" => height as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
        },
        image.as_raw().clone(),
    );
    pixels.compress()?;
    let image_id = doc.add_object(pixels);

    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    (width as i64).into(),
                    0.into(),
                    0.into(),
                    (height as i64).into(),
                    0.into(),
                    0.into(),
                ],
            ),
            Operation::new("Do", vec![Object::Name(b"Im0".to_vec())]),
            Operation::new("Q", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "MediaBox" => vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Integer(width as i64),
            Object::Integer(height as i64),
        ],
        "Resources" => dictionary! {
            "XObject" => dictionary! { "Im0" => image_id },
        },
    });

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::Reference(page_id)],
            "Count" => 1,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).map_err(lopdf::Error::from)?;
    Ok(bytes)
}

/// Writes `{dir}/{stem}.pdf` (when `prefer_pdf`) or `{dir}/{stem}.png`.
pub fn export_page(
    image: &RgbImage,
    dir: &Path,
    stem: &str,
    prefer_pdf: bool,
) -> Result<ExportedArtifact, ExportError> {
    if let Err(e) = std::fs::create_dir_all(dir) {
        warn!("Could not create output directory {}: {}", dir.display(), e);
    }

    if prefer_pdf {
        let pdf_path = dir.join(format!("{stem}.pdf"));
        let written = build_pdf(image).and_then(|bytes| {
            std::fs::write(&pdf_path, bytes).map_err(|source| ExportError::Io {
                path: pdf_path.clone(),
                source,
            })
        });

        match written {
            Ok(()) => {
                info!("Brochure written: {}", pdf_path.display());
                return Ok(ExportedArtifact {
                    path: pdf_path,
                    format: ExportFormat::Pdf,
                    fell_back: false,
                });
            }
            Err(e) => warn!("PDF export failed ({}); falling back to PNG", e),
        }
    }

    let png_path = dir.join(format!("{stem}.png"));
    let bytes = encode_png(image)?;
    std::fs::write(&png_path, bytes).map_err(|source| ExportError::Io {
        path: png_path.clone(),
        source,
    })?;
    info!("Brochure written: {}", png_path.display());

    Ok(ExportedArtifact {
        path: png_path,
        format: ExportFormat::Png,
        fell_back: prefer_pdf,
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn sample() -> RgbImage {
        RgbImage::from_fn(24, 16, |x, y| Rgb([(x * 10) as u8, (y * 15) as u8, 128]))
    }

    #[test]
    fn test_encode_png_is_lossless() {
        let image = sample();
        let bytes = encode_png(&image).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap().to_rgb8();
        assert_eq!(decoded.as_raw(), image.as_raw());
    }

    #[test]
    fn test_build_pdf_single_page_sized_to_image() {
        let bytes = build_pdf(&sample()).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.5"));

        let doc = Document::load_mem(&bytes).unwrap();
        let pages = doc.get_pages();
        assert_eq!(pages.len(), 1);

        let page_id = *pages.values().next().unwrap();
        let page = doc.get_dictionary(page_id).unwrap();
        let media_box = page.get(b"MediaBox").unwrap().as_array().unwrap();
        assert_eq!(media_box[2].as_i64().unwrap(), 24);
        assert_eq!(media_box[3].as_i64().unwrap(), 16);
    }

    #[test]
    fn test_export_pdf_when_requested() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = export_page(&sample(), dir.path(), "Azure_Reef_full_bleed_brochure", true).unwrap();
        assert_eq!(artifact.format, ExportFormat::Pdf);
        assert!(!artifact.fell_back);
        assert_eq!(
            artifact.path,
            dir.path().join("Azure_Reef_full_bleed_brochure.pdf")
        );
        assert!(artifact.path.exists());
    }

    #[test]
    fn test_export_png_when_pdf_not_requested() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = export_page(&sample(), dir.path(), "page", false).unwrap();
        assert_eq!(artifact.format, ExportFormat::Png);
        assert!(!artifact.fell_back);
        assert!(dir.path().join("page.png").exists());
    }

    #[test]
    fn test_pdf_write_failure_falls_back_to_png() {
        let dir = tempfile::tempdir().unwrap();
        // A directory squatting on the PDF path makes the PDF write fail.
        std::fs::create_dir(dir.path().join("page.pdf")).unwrap();

        let artifact = export_page(&sample(), dir.path(), "page", true).unwrap();
        assert_eq!(artifact.format, ExportFormat::Png);
        assert!(artifact.fell_back);
        assert!(dir.path().join("page.png").is_file());
    }

    #[test]
    fn test_export_fails_only_when_png_fails_too() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not_a_dir");
        std::fs::write(&blocker, b"file").unwrap();

        let err = export_page(&sample(), &blocker, "page", true).unwrap_err();
        assert!(matches!(err, ExportError::Io { .. }));
    }

    #[test]
    fn test_format_content_types() {
        assert_eq!(ExportFormat::Pdf.content_type(), "application/pdf");
        assert_eq!(ExportFormat::Png.extension(), "png");
    }
}
