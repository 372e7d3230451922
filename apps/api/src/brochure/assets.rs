//! Image assets on disk: `{images_dir}/{slug}_{role}.png`.
//!
//! Generation writes them, the pipeline reads them back before composing.
//! A missing or unreadable file just leaves its slot empty.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use image::{ImageFormat, RgbaImage};
use tracing::{info, warn};

use crate::layout::compositor::{AssetPresence, ImageRole};

/// Filesystem-safe form of a subject name.
pub fn slug(name: &str) -> String {
    name.replace(' ', "_")
        .replace(['\'', '"', ','], "")
        .replace('&', "and")
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_')
        .collect()
}

pub fn image_path(dir: &Path, name: &str, role: ImageRole) -> PathBuf {
    dir.join(format!("{}_{}.png", slug(name), role.as_str()))
}

/// File stem of the exported brochure, without extension.
pub fn brochure_stem(name: &str, layout: &str) -> String {
    format!("{}_{}_brochure", slug(name), layout)
}

#[derive(Debug, Clone, Default)]
pub struct ImageAssets {
    images: HashMap<ImageRole, RgbaImage>,
}

impl ImageAssets {
    pub fn insert(&mut self, role: ImageRole, image: RgbaImage) {
        self.images.insert(role, image);
    }

    pub fn get(&self, role: ImageRole) -> Option<&RgbaImage> {
        self.images.get(&role)
    }

    pub fn presence(&self) -> AssetPresence {
        AssetPresence {
            exterior: self.images.contains_key(&ImageRole::Exterior),
            room: self.images.contains_key(&ImageRole::Room),
            restaurant: self.images.contains_key(&ImageRole::Restaurant),
        }
    }

    /// Loads whatever role images exist for `name` under `dir`.
    pub fn load(dir: &Path, name: &str) -> Self {
        let mut assets = Self::default();

        for role in ImageRole::ALL {
            let path = image_path(dir, name, role);
            if !path.exists() {
                warn!("No {} image at {}", role.as_str(), path.display());
                continue;
            }
            match image::open(&path) {
                Ok(img) => assets.insert(role, img.to_rgba8()),
                Err(e) => warn!("Skipping unreadable image {}: {}", path.display(), e),
            }
        }

        assets
    }
}

/// Writes a generated image to its role path, creating `dir` if needed.
pub fn persist_image(
    dir: &Path,
    name: &str,
    role: ImageRole,
    image: &RgbaImage,
) -> Result<PathBuf, image::ImageError> {
    std::fs::create_dir_all(dir)?;
    let path = image_path(dir, name, role);
    image.save_with_format(&path, ImageFormat::Png)?;
    info!("Saved {} image: {}", role.as_str(), path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_slug_rules() {
        assert_eq!(slug("Grand Vista"), "Grand_Vista");
        assert_eq!(slug("Sea & Sky"), "Sea_and_Sky");
        assert_eq!(slug("L'Hôtel, Paris"), "LHôtel_Paris");
        assert_eq!(slug("\"Azure\" Reef!"), "Azure_Reef");
    }

    #[test]
    fn test_paths() {
        let dir = Path::new("generated_images");
        assert_eq!(
            image_path(dir, "Grand Vista", ImageRole::Restaurant),
            dir.join("Grand_Vista_restaurant.png")
        );
        assert_eq!(
            brochure_stem("Grand Vista", "full_bleed"),
            "Grand_Vista_full_bleed_brochure"
        );
    }

    #[test]
    fn test_persist_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let images = dir.path().join("nested");
        let room = RgbaImage::from_pixel(8, 5, Rgba([1, 2, 3, 255]));

        let path = persist_image(&images, "Azure Reef", ImageRole::Room, &room).unwrap();
        assert!(path.ends_with("Azure_Reef_room.png"));

        let assets = ImageAssets::load(&images, "Azure Reef");
        assert_eq!(
            assets.presence(),
            AssetPresence {
                exterior: false,
                room: true,
                restaurant: false
            }
        );
        assert_eq!(assets.get(ImageRole::Room).unwrap(), &room);
    }

    #[test]
    fn test_unreadable_file_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(image_path(dir.path(), "Azure Reef", ImageRole::Exterior), b"not a png")
            .unwrap();
        let assets = ImageAssets::load(dir.path(), "Azure Reef");
        assert_eq!(assets.presence(), AssetPresence::default());
    }

    #[test]
    fn test_load_from_missing_dir_is_empty() {
        let assets = ImageAssets::load(Path::new("/nonexistent/brochure/images"), "X");
        assert!(assets.get(ImageRole::Exterior).is_none());
    }
}
