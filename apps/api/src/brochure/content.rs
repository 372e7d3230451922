//! Brochure copy: asks the text collaborator for each section and substitutes
//! deterministic fallbacks whenever a section fails or comes back unusable.
//!
//! Every brochure gets a complete set of copy. A collaborator outage degrades
//! the prose, never the page.

use tracing::{debug, warn};

use crate::collaborators::prompts::{section_prompt, Section, SECTION_MAX_LENGTH};
use crate::collaborators::{TextGenerator, TextRequest};
use crate::layout::compositor::{PageContent, PricingRow};
use crate::layout::title::{display_location, display_title};

pub const OVERVIEW_FALLBACK: &str = "Experience luxury redefined at our exclusive resort.";
pub const ROOM_FALLBACK: &str = "Luxurious rooms with stunning ocean views.";
pub const RESTAURANT_FALLBACK: &str = "Experience world-class dining with local specialties and \
     international cuisine in our signature restaurant.";

pub const DEFAULT_AMENITIES: [&str; 6] = [
    "24/7 Personal Butler Service",
    "Private Beach & Infinity Pool",
    "Luxury Yacht Charter",
    "World-Class Spa & Wellness",
    "Michelin-Star Dining",
    "Helicopter Transfer Service",
];

pub const AMENITY_COUNT: usize = 6;

/// Generated dining copy shorter than this is discarded.
const DINING_MIN_CHARS: usize = 50;

const RESERVATIONS_PHONE: &str = "+1 (800) 123-4567";

// ────────────────────────────────────────────────────────────────────────────
// Location type
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationType {
    Beach,
    Mountain,
    City,
    Resort,
}

const BEACH_WORDS: [&str; 6] = ["beach", "coast", "sea", "ocean", "bay", "island"];
const MOUNTAIN_WORDS: [&str; 5] = ["mountain", "hill", "alps", "peak", "cliff"];
const CITY_WORDS: [&str; 4] = ["city", "town", "urban", "metro"];

impl LocationType {
    /// Keyword match over "location name", first hit wins in the order
    /// beach, mountain, city.
    pub fn classify(location: &str, name: &str) -> Self {
        let haystack = format!("{location} {name}").to_lowercase();
        let any = |words: &[&str]| words.iter().any(|w| haystack.contains(w));

        if any(&BEACH_WORDS) {
            LocationType::Beach
        } else if any(&MOUNTAIN_WORDS) {
            LocationType::Mountain
        } else if any(&CITY_WORDS) {
            LocationType::City
        } else {
            LocationType::Resort
        }
    }
}

pub fn dining_fallback(kind: LocationType, location: &str) -> String {
    match kind {
        LocationType::Beach => format!(
            "Experience world-class dining with fresh seafood and tropical flavors at our \
             oceanfront restaurant. Our expert chefs combine local {location} specialties with \
             international cuisine, served in a stunning setting with panoramic ocean views."
        ),
        LocationType::Mountain => format!(
            "Savor exceptional cuisine at our signature mountain-view restaurant, where local \
             {location} ingredients meet innovative cooking techniques. Enjoy regional \
             specialties and international dishes while taking in breathtaking alpine vistas."
        ),
        LocationType::City => format!(
            "Indulge in refined dining at our acclaimed restaurant, featuring a sophisticated \
             blend of {location} culinary traditions and contemporary gastronomy. Our master \
             chefs create memorable dining experiences in an elegant urban setting."
        ),
        LocationType::Resort => format!(
            "Discover culinary excellence at our signature restaurant, where {location}'s finest \
             ingredients are transformed into extraordinary dishes. Enjoy a perfect blend of \
             local specialties and international cuisine in an atmosphere of refined luxury."
        ),
    }
}

/// Dining copy must be substantial and actually mention the location.
pub fn accept_dining(text: &str, location: &str) -> bool {
    text.chars().count() > DINING_MIN_CHARS
        && text.to_lowercase().contains(&location.to_lowercase())
}

// ────────────────────────────────────────────────────────────────────────────
// Amenities
// ────────────────────────────────────────────────────────────────────────────

/// Parses a generated list. Returns `None` unless exactly six entries survive.
///
/// A line starting with a digit, `.` or `-` is a list item whose first token
/// (the marker) is dropped.
pub fn parse_amenities(text: &str) -> Option<Vec<String>> {
    let mut items = Vec::with_capacity(AMENITY_COUNT);

    for line in text.lines() {
        let line = line.trim();
        let marked = line
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_digit() || c == '.' || c == '-');
        let item = if marked {
            line.split_whitespace().skip(1).collect::<Vec<_>>().join(" ")
        } else {
            line.to_string()
        };

        if !item.is_empty() && items.len() < AMENITY_COUNT {
            items.push(item);
        }
    }

    (items.len() == AMENITY_COUNT).then_some(items)
}

pub fn default_amenities() -> Vec<String> {
    DEFAULT_AMENITIES.iter().map(|s| s.to_string()).collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Contact & pricing
// ────────────────────────────────────────────────────────────────────────────

pub fn contact_email(name: &str) -> String {
    let lowered = name.to_lowercase().replace(['\'', '"'], "");
    let domain = lowered.strip_prefix("the ").unwrap_or(&lowered).replace(' ', "");
    format!("reservations@{domain}.com")
}

pub fn contact_line(name: &str) -> String {
    format!(
        "RESERVATIONS: {}  •  {}",
        RESERVATIONS_PHONE,
        contact_email(name)
    )
}

pub fn default_pricing() -> Vec<PricingRow> {
    [
        ("Deluxe Room", "$550/night"),
        ("Ocean Suite", "$850/night"),
        ("Presidential Villa", "$2,500/night"),
    ]
    .into_iter()
    .map(|(room, price)| PricingRow {
        room: room.to_string(),
        price: price.to_string(),
    })
    .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Gathered content
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct BrochureContent {
    /// Normalized subject name.
    pub name: String,
    pub location: String,
    pub overview: String,
    pub room: String,
    pub dining: String,
    pub amenities: Vec<String>,
    pub pricing: Vec<PricingRow>,
    /// Sections whose copy is a fallback rather than generated text.
    pub fallbacks: Vec<Section>,
}

impl BrochureContent {
    /// Copy made entirely of fallbacks. Used directly when no text
    /// collaborator is reachable and as the starting point otherwise.
    pub fn fallback(name: &str, location: &str) -> Self {
        let kind = LocationType::classify(location, name);
        Self {
            name: name.to_string(),
            location: location.to_string(),
            overview: OVERVIEW_FALLBACK.to_string(),
            room: ROOM_FALLBACK.to_string(),
            dining: dining_fallback(kind, location),
            amenities: default_amenities(),
            pricing: default_pricing(),
            fallbacks: Section::ALL.to_vec(),
        }
    }

    pub fn to_page_content(&self) -> PageContent {
        let restaurant_caption = if self.dining.trim().is_empty() || self.dining == self.name {
            RESTAURANT_FALLBACK.to_string()
        } else {
            self.dining.clone()
        };

        PageContent {
            title: display_title(&self.name),
            location: display_location(&self.location),
            overview: self.overview.clone(),
            room_caption: self.room.clone(),
            restaurant_caption,
            amenities: self.amenities.clone(),
            pricing: self.pricing.clone(),
            contact: contact_line(&self.name),
        }
    }
}

/// Requests every section in order; a failed or rejected section keeps its
/// fallback and is recorded in `fallbacks`.
pub async fn gather_content(
    text: &dyn TextGenerator,
    name: &str,
    location: &str,
) -> BrochureContent {
    let mut content = BrochureContent::fallback(name, location);
    content.fallbacks.clear();

    for section in Section::ALL {
        let request = TextRequest::new(section_prompt(section, name, location), SECTION_MAX_LENGTH);
        let generated = match text.generate(&request).await {
            Ok(generated) => Some(generated),
            Err(e) => {
                warn!("{} section generation failed: {}", section.as_str(), e);
                None
            }
        };

        let accepted = match (section, generated) {
            (Section::Overview, Some(t)) => {
                content.overview = t;
                true
            }
            (Section::Room, Some(t)) => {
                content.room = t;
                true
            }
            (Section::Dining, Some(t)) if accept_dining(&t, location) => {
                content.dining = t;
                true
            }
            (Section::Amenities, Some(t)) => match parse_amenities(&t) {
                Some(items) => {
                    content.amenities = items;
                    true
                }
                None => false,
            },
            _ => false,
        };

        if accepted {
            debug!("{} section generated", section.as_str());
        } else {
            warn!("Using fallback copy for {} section", section.as_str());
            content.fallbacks.push(section);
        }
    }

    content
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
