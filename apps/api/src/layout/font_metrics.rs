//! Glyph-accurate text metrics for the brochure faces.
//!
//! Widths are the sum of horizontal advances plus pair kerning of the bound
//! face at the requested pixel size, read straight from the outlines through
//! `ab_glyph`. Panel sizing trusts these numbers to the pixel, so there is no
//! per-character approximation table here.
//!
//! The regular and bold DejaVu Sans faces are compiled into the binary; a
//! deployment may point `FONT_REGULAR_PATH` / `FONT_BOLD_PATH` at other files.

use std::path::{Path, PathBuf};

use ab_glyph::{point, Font, FontArc, Glyph, GlyphId, PxScale, ScaleFont};
use serde::{Deserialize, Serialize};
use thiserror::Error;

static REGULAR_TTF: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans.ttf");
static BOLD_TTF: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans-Bold.ttf");

/// Line pitch as a multiple of the font's pixel size.
pub const LINE_SPACING_FACTOR: f32 = 1.5;

// ────────────────────────────────────────────────────────────────────────────
// Font descriptors
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FontFace {
    Regular,
    Bold,
}

/// A face at a pixel size. Never mutated: resizing returns a new value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FontSpec {
    pub face: FontFace,
    pub size_px: f32,
}

impl FontSpec {
    pub const fn new(face: FontFace, size_px: f32) -> Self {
        Self { face, size_px }
    }

    /// Same face at a different size.
    pub fn with_size(&self, size_px: f32) -> Self {
        Self {
            face: self.face,
            size_px,
        }
    }

    /// Vertical pitch between consecutive baselines.
    pub fn line_spacing(&self) -> f32 {
        self.size_px * LINE_SPACING_FACTOR
    }
}

/// The FontSpec bound to each role for one render.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FontRoles {
    pub title: FontSpec,
    pub heading: FontSpec,
    pub body: FontSpec,
    pub caption: FontSpec,
    pub footer: FontSpec,
}

/// Role bindings for the 1780×2480 reference page.
pub fn default_font_roles() -> FontRoles {
    FontRoles {
        title: FontSpec::new(FontFace::Bold, 140.0),
        heading: FontSpec::new(FontFace::Bold, 64.0),
        body: FontSpec::new(FontFace::Regular, 36.0),
        caption: FontSpec::new(FontFace::Regular, 24.0),
        footer: FontSpec::new(FontFace::Regular, 32.0),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Measurement results
// ────────────────────────────────────────────────────────────────────────────

/// One measured line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineMetric {
    pub text: String,
    pub width: f32,
}

/// Measured extent of one or more lines. `descent` is negative (below the
/// baseline).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BoundingBox {
    pub width: f32,
    pub height: f32,
    pub ascent: f32,
    pub descent: f32,
    pub lines: Vec<LineMetric>,
}

impl BoundingBox {
    /// Ink-box height of one line of the face, independent of its glyphs.
    pub fn line_height(&self) -> f32 {
        self.ascent - self.descent
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Font set
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum FontError {
    #[error("failed to read font file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{origin} is not a usable TrueType/OpenType font")]
    Invalid { origin: String },
}

/// The two loaded faces. Cheap to clone; shared read-only across renders.
#[derive(Clone)]
pub struct FontSet {
    regular: FontArc,
    bold: FontArc,
    origin: String,
}

impl std::fmt::Debug for FontSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontSet")
            .field("origin", &self.origin)
            .finish_non_exhaustive()
    }
}

impl FontSet {
    /// The compiled-in DejaVu Sans faces.
    pub fn embedded() -> Result<Self, FontError> {
        Ok(Self {
            regular: embedded_face(REGULAR_TTF, "embedded DejaVuSans.ttf")?,
            bold: embedded_face(BOLD_TTF, "embedded DejaVuSans-Bold.ttf")?,
            origin: "embedded DejaVu Sans".to_string(),
        })
    }

    /// Loads faces from disk; a `None` path keeps the embedded face for that slot.
    pub fn from_paths(regular: Option<&Path>, bold: Option<&Path>) -> Result<Self, FontError> {
        if regular.is_none() && bold.is_none() {
            return Self::embedded();
        }

        let regular_face = match regular {
            Some(path) => file_face(path)?,
            None => embedded_face(REGULAR_TTF, "embedded DejaVuSans.ttf")?,
        };
        let bold_face = match bold {
            Some(path) => file_face(path)?,
            None => embedded_face(BOLD_TTF, "embedded DejaVuSans-Bold.ttf")?,
        };

        let describe = |p: Option<&Path>| {
            p.map(|p| p.display().to_string())
                .unwrap_or_else(|| "embedded".to_string())
        };

        Ok(Self {
            regular: regular_face,
            bold: bold_face,
            origin: format!("regular={} bold={}", describe(regular), describe(bold)),
        })
    }

    /// Human-readable description of where the faces came from (for startup logs).
    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn face(&self, face: FontFace) -> &FontArc {
        match face {
            FontFace::Regular => &self.regular,
            FontFace::Bold => &self.bold,
        }
    }

    /// Advance width of a single line of text in pixels, kerning included.
    ///
    /// Newlines are not interpreted; callers split first.
    pub fn measure_str(&self, text: &str, spec: &FontSpec) -> f32 {
        self.walk_pen(text, spec, |_, _| {})
    }

    /// Glyphs of a single line, positioned with exactly the advances and
    /// kerning [`measure_str`](Self::measure_str) sums.
    ///
    /// The origin is the top-left of the line's glyph box: pen x starts at 0
    /// and the baseline sits at `ascent`.
    pub fn layout_line(&self, text: &str, spec: &FontSpec) -> Vec<Glyph> {
        let scale = PxScale::from(spec.size_px);
        let baseline = self.face(spec.face).as_scaled(scale).ascent();

        let mut glyphs = Vec::with_capacity(text.len());
        self.walk_pen(text, spec, |id, pen_x| {
            glyphs.push(id.with_scale_and_position(scale, point(pen_x, baseline)));
        });
        glyphs
    }

    /// Visits each glyph with its pen position and returns the final advance.
    fn walk_pen(&self, text: &str, spec: &FontSpec, mut visit: impl FnMut(GlyphId, f32)) -> f32 {
        let font = self.face(spec.face).as_scaled(PxScale::from(spec.size_px));

        let mut pen = 0.0f32;
        let mut previous = None;
        for c in text.chars() {
            let id = font.glyph_id(c);
            if let Some(prev) = previous {
                pen += font.kern(prev, id);
            }
            visit(id, pen);
            pen += font.h_advance(id);
            previous = Some(id);
        }
        pen
    }

    pub fn measure_line(&self, text: &str, spec: &FontSpec) -> LineMetric {
        LineMetric {
            text: text.to_string(),
            width: self.measure_str(text, spec),
        }
    }

    /// Bounding box of possibly multi-line text (`\n` separated).
    ///
    /// The empty string yields a zero box with no lines.
    pub fn measure(&self, text: &str, spec: &FontSpec) -> BoundingBox {
        if text.is_empty() {
            return BoundingBox::default();
        }

        let lines: Vec<LineMetric> = text
            .split('\n')
            .map(|line| self.measure_line(line, spec))
            .collect();

        let font = self.face(spec.face).as_scaled(PxScale::from(spec.size_px));
        let ascent = font.ascent();
        let descent = font.descent();
        let width = lines.iter().map(|l| l.width).fold(0.0f32, f32::max);
        let height = (lines.len() - 1) as f32 * spec.line_spacing() + (ascent - descent);

        BoundingBox {
            width,
            height,
            ascent,
            descent,
            lines,
        }
    }
}

fn embedded_face(bytes: &'static [u8], origin: &str) -> Result<FontArc, FontError> {
    FontArc::try_from_slice(bytes).map_err(|_| FontError::Invalid {
        origin: origin.to_string(),
    })
}

fn file_face(path: &Path) -> Result<FontArc, FontError> {
    let bytes = std::fs::read(path).map_err(|source| FontError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    FontArc::try_from_vec(bytes).map_err(|_| FontError::Invalid {
        origin: path.display().to_string(),
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn fonts() -> FontSet {
        FontSet::embedded().unwrap()
    }

    #[test]
    fn test_measure_empty_returns_zero_box() {
        let bbox = fonts().measure("", &default_font_roles().body);
        assert_eq!(bbox.width, 0.0);
        assert_eq!(bbox.height, 0.0);
        assert!(bbox.lines.is_empty());
    }

    #[test]
    fn test_measure_str_positive_for_text() {
        let width = fonts().measure_str("Rust", &default_font_roles().body);
        assert!(width > 0.0, "Rust should have a positive width, got {width}");
    }

    #[test]
    fn test_measure_scales_linearly_with_size() {
        let fonts = fonts();
        let small = FontSpec::new(FontFace::Regular, 20.0);
        let large = small.with_size(40.0);
        let w_small = fonts.measure_str("Ocean Suite", &small);
        let w_large = fonts.measure_str("Ocean Suite", &large);
        assert!(
            (w_large - 2.0 * w_small).abs() < 1.0,
            "doubling size should double width: {w_small} vs {w_large}"
        );
    }

    #[test]
    fn test_bold_wider_than_regular() {
        let fonts = fonts();
        let text = "LUXURY AMENITIES";
        let regular = fonts.measure_str(text, &FontSpec::new(FontFace::Regular, 64.0));
        let bold = fonts.measure_str(text, &FontSpec::new(FontFace::Bold, 64.0));
        assert!(bold > regular, "bold {bold} should exceed regular {regular}");
    }

    #[test]
    fn test_proportional_not_monospace() {
        let fonts = fonts();
        let spec = default_font_roles().body;
        assert!(fonts.measure_str("iiii", &spec) < fonts.measure_str("MMMM", &spec));
    }

    #[test]
    fn test_multiline_height_uses_line_spacing() {
        let fonts = fonts();
        let spec = default_font_roles().body;
        let bbox = fonts.measure("first line\nsecond, longer line\nthird", &spec);
        assert_eq!(bbox.lines.len(), 3);
        let expected = 2.0 * spec.line_spacing() + (bbox.ascent - bbox.descent);
        assert!((bbox.height - expected).abs() < 1e-3);
        assert_eq!(bbox.width, bbox.lines[1].width);
    }

    #[test]
    fn test_descent_is_below_baseline() {
        let bbox = fonts().measure("Gg", &default_font_roles().body);
        assert!(bbox.ascent > 0.0);
        assert!(bbox.descent < 0.0);
        assert!(bbox.line_height() > 36.0 * 0.9);
        assert_eq!(bbox.height, bbox.line_height());
    }

    #[test]
    fn test_with_size_leaves_original_untouched() {
        let title = default_font_roles().title;
        let smaller = title.with_size(95.0);
        assert_eq!(title.size_px, 140.0);
        assert_eq!(smaller.size_px, 95.0);
        assert_eq!(smaller.face, FontFace::Bold);
    }

    #[test]
    fn test_line_spacing_is_one_and_a_half_size() {
        assert_eq!(default_font_roles().body.line_spacing(), 54.0);
        assert_eq!(default_font_roles().caption.line_spacing(), 36.0);
    }

    #[test]
    fn test_from_paths_missing_file_is_io_error() {
        let err = FontSet::from_paths(Some(Path::new("/nonexistent/font.ttf")), None).unwrap_err();
        assert!(matches!(err, FontError::Io { .. }));
    }

    #[test]
    fn test_from_paths_rejects_non_font_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bogus.ttf");
        std::fs::write(&path, b"definitely not a font").unwrap();
        let err = FontSet::from_paths(None, Some(&path)).unwrap_err();
        assert!(matches!(err, FontError::Invalid { .. }));
    }

    #[test]
    fn test_default_role_sizes() {
        let roles = default_font_roles();
        let sizes = [
            (roles.title, FontFace::Bold, 140.0),
            (roles.heading, FontFace::Bold, 64.0),
            (roles.body, FontFace::Regular, 36.0),
            (roles.caption, FontFace::Regular, 24.0),
            (roles.footer, FontFace::Regular, 32.0),
        ];
        for (spec, face, size_px) in sizes {
            assert_eq!(spec, FontSpec::new(face, size_px));
        }
    }

    #[test]
    fn test_layout_line_matches_measured_advances() {
        let fonts = fonts();
        let spec = default_font_roles().title;
        let text = "To Yo Ty Vo";
        let glyphs = fonts.layout_line(text, &spec);
        assert_eq!(glyphs.len(), text.chars().count());
        assert_eq!(glyphs[0].position.x, 0.0);

        assert!(glyphs.windows(2).all(|w| w[0].position.x < w[1].position.x));

        // The last pen position plus its advance is the measured width.
        let last = glyphs.last().unwrap();
        let last_advance = fonts.measure_str("o", &spec);
        assert_eq!(last.position.x + last_advance, fonts.measure_str(text, &spec));
    }
}
