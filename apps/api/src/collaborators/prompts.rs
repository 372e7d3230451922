// Fixed prompt strings for both collaborators. Only the subject name and
// location are substituted; there is no other prompt construction.

use crate::layout::compositor::ImageRole;

/// Length cap sent with every text request.
pub const SECTION_MAX_LENGTH: u32 = 150;

/// Shared by every image request.
pub const IMAGE_NEGATIVE_PROMPT: &str =
    "low quality, blurry, distorted, ugly, bad anatomy, bad proportions, deformed";

/// Brochure sections filled by the text collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Overview,
    Room,
    Dining,
    Amenities,
}

impl Section {
    pub const ALL: [Section; 4] = [
        Section::Overview,
        Section::Room,
        Section::Dining,
        Section::Amenities,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Section::Overview => "overview",
            Section::Room => "room",
            Section::Dining => "dining",
            Section::Amenities => "amenities",
        }
    }
}

pub fn section_prompt(section: Section, name: &str, location: &str) -> String {
    match section {
        Section::Overview => format!(
            "Generate a brief description of {name} in {location}, highlighting its main \
             features and surroundings"
        ),
        Section::Room => format!(
            "Describe the luxury accommodations at {name} in {location}, focusing on room \
             features and views"
        ),
        Section::Dining => format!(
            "Describe the dining experience at {name} in {location}. Focus on: 1) Local \
             cuisine specialties from {location}, 2) Signature dishes, 3) Restaurant \
             atmosphere and views. Make it specific to the location's culinary culture."
        ),
        Section::Amenities => format!(
            "List 6 ultra-luxury amenities for {name} in {location}, focusing on unique \
             features that match the location. Format as simple list."
        ),
    }
}

pub fn image_prompt(role: ImageRole, name: &str, location: &str) -> String {
    match role {
        ImageRole::Exterior => format!(
            "Professional architectural photography of {name} in {location}, luxury resort \
             architecture, stunning surroundings, high-end resort photography, 4k, detailed, \
             professional lighting"
        ),
        ImageRole::Room => format!(
            "Interior photography of a luxury suite at {name}, {location}, modern design, \
             premium furnishings, panoramic views, professional hotel photography, 4k, detailed"
        ),
        ImageRole::Restaurant => format!(
            "Fine dining restaurant interior at {name}, {location}, elegant modern decor, \
             ambient lighting, professional restaurant photography, 4k, detailed"
        ),
    }
}
