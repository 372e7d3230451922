//! Title and location display text, and title font fitting.
//!
//! Normalization is pure string work; rules apply in this order:
//!
//! 1. trim surrounding whitespace;
//! 2. a quoted leading article (`'The ` or `"The `) is removed with its quote;
//! 3. otherwise a leading `the ` in any case is removed;
//! 4. one leading and one trailing quote character are removed;
//! 5. trim again.

use crate::layout::font_metrics::{FontSet, FontSpec};

const QUOTED_ARTICLES: [&str; 2] = ["'The ", "\"The "];
const ARTICLE: &str = "the ";
const QUOTES: [char; 2] = ['\'', '"'];

pub const TITLE_MIN_SIZE: f32 = 40.0;
pub const TITLE_SIZE_STEP: f32 = 5.0;
/// Total horizontal margin the title must leave free.
pub const TITLE_SIDE_MARGIN: u32 = 100;

/// Canonical subject name used for display, prompts and filenames.
pub fn normalize_subject_name(raw: &str) -> String {
    let mut name = raw.trim();

    if let Some(rest) = QUOTED_ARTICLES.iter().find_map(|a| name.strip_prefix(a)) {
        name = rest;
    } else if name
        .get(..ARTICLE.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(ARTICLE))
    {
        name = &name[ARTICLE.len()..];
    }

    let name = name.strip_prefix(QUOTES).unwrap_or(name);
    let name = name.strip_suffix(QUOTES).unwrap_or(name);
    name.trim().to_string()
}

/// The title as painted: the normalized name in capitals.
pub fn display_title(raw: &str) -> String {
    normalize_subject_name(raw).to_uppercase()
}

/// Location as painted. A location that is only "THE" has nothing to show.
pub fn display_location(raw: &str) -> String {
    let upper = raw.trim().to_uppercase();
    if upper == "THE" {
        return String::new();
    }
    match upper.strip_prefix("THE ") {
        Some(rest) => rest.trim().to_string(),
        None => upper,
    }
}

/// Shrinks the title font until `text` fits in `max_width`.
///
/// Starts at `base`, steps down by [`TITLE_SIZE_STEP`] and stops at
/// [`TITLE_MIN_SIZE`] even if the text is still too wide. Every candidate is
/// a fresh `FontSpec`.
pub fn fit_title_font(fonts: &FontSet, text: &str, base: FontSpec, max_width: f32) -> FontSpec {
    let mut candidate = base;
    while candidate.size_px > TITLE_MIN_SIZE && fonts.measure_str(text, &candidate) > max_width {
        candidate = candidate.with_size((candidate.size_px - TITLE_SIZE_STEP).max(TITLE_MIN_SIZE));
    }
    candidate
}
