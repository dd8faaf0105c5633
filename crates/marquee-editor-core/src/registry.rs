//! Static section registry.
//!
//! Each editable page is a fixed, ordered list of sections, and each section
//! an ordered list of field descriptors. Lookups are pure and allocation-free.

use serde::Serialize;

/// Kind of value a field edits. Decides which control renders it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldKind {
    Text,
    Textarea,
    Image,
    ImageArray,
    StatsArray,
    Media,
    TestimonialsArray,
}

impl FieldKind {
    pub fn is_array(self) -> bool {
        matches!(
            self,
            FieldKind::ImageArray | FieldKind::StatsArray | FieldKind::TestimonialsArray
        )
    }

    /// Kinds a file upload can be stored into.
    pub fn accepts_upload(self) -> bool {
        matches!(self, FieldKind::Image | FieldKind::ImageArray | FieldKind::Media)
    }
}

/// Static metadata for one editable value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    pub key: &'static str,
    #[serde(rename = "type")]
    pub kind: FieldKind,
    pub label: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_items: Option<usize>,
    /// Image arrays only: store `{id, image, name}` records instead of bare paths.
    pub use_object_format: bool,
}

impl FieldDescriptor {
    pub const fn new(key: &'static str, kind: FieldKind, label: &'static str) -> Self {
        Self {
            key,
            kind,
            label,
            hint: None,
            max_items: None,
            use_object_format: false,
        }
    }

    pub const fn hint(mut self, hint: &'static str) -> Self {
        self.hint = Some(hint);
        self
    }

    pub const fn max_items(mut self, max: usize) -> Self {
        self.max_items = Some(max);
        self
    }

    pub const fn object_format(mut self) -> Self {
        self.use_object_format = true;
        self
    }
}

/// A named, independently toggleable region of a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Section {
    pub id: &'static str,
    pub label: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<&'static str>,
    pub fields: &'static [FieldDescriptor],
}

use FieldKind::*;

const fn text(key: &'static str, label: &'static str) -> FieldDescriptor {
    FieldDescriptor::new(key, Text, label)
}

const fn textarea(key: &'static str, label: &'static str) -> FieldDescriptor {
    FieldDescriptor::new(key, Textarea, label)
}

static ABOUT: &[Section] = &[
    Section {
        id: "hero",
        label: "Hero",
        description: Some("Opening headline and portrait"),
        fields: &[
            text("heroTitle1", "Title line 1"),
            text("heroTitle2", "Title line 2"),
            textarea("heroDescription", "Description"),
            FieldDescriptor::new("heroImage", Image, "Hero image").hint("At least 1600px wide"),
        ],
    },
    Section {
        id: "story",
        label: "Our story",
        description: None,
        fields: &[
            text("storyTitle", "Title"),
            textarea("storyText", "Text"),
            FieldDescriptor::new("storyImages", ImageArray, "Images").max_items(6),
        ],
    },
    Section {
        id: "stats",
        label: "Stats",
        description: Some("Headline numbers"),
        fields: &[
            text("statsTitle", "Title"),
            FieldDescriptor::new("stats", StatsArray, "Stats").max_items(4),
        ],
    },
    Section {
        id: "team",
        label: "Team",
        description: None,
        fields: &[
            text("teamTitle", "Title"),
            textarea("teamDescription", "Description"),
            FieldDescriptor::new("teamPhotos", ImageArray, "Team photos")
                .object_format()
                .max_items(12)
                .hint("Name is shown under each photo"),
        ],
    },
    Section {
        id: "cta",
        label: "Call to action",
        description: None,
        fields: &[
            text("ctaTitle", "Title"),
            text("ctaButtonText", "Button text"),
            text("ctaButtonLink", "Button link"),
        ],
    },
];

static WORK: &[Section] = &[
    Section {
        id: "hero",
        label: "Hero",
        description: None,
        fields: &[
            text("heroTitle", "Title"),
            textarea("heroSubtitle", "Subtitle"),
            FieldDescriptor::new("heroMedia", Media, "Background media")
                .hint("Image or video (mp4, webm, ogg, mov, avi)"),
        ],
    },
    Section {
        id: "clients",
        label: "Clients",
        description: Some("Logo wall"),
        fields: &[
            text("clientsTitle", "Title"),
            FieldDescriptor::new("clientLogos", ImageArray, "Logos")
                .object_format()
                .max_items(24),
        ],
    },
    Section {
        id: "testimonials",
        label: "Testimonials",
        description: None,
        fields: &[
            text("testimonialsTitle", "Title"),
            FieldDescriptor::new("testimonials", TestimonialsArray, "Testimonials").max_items(6),
        ],
    },
    Section {
        id: "cta",
        label: "Call to action",
        description: None,
        fields: &[
            text("ctaTitle", "Title"),
            text("ctaButtonText", "Button text"),
        ],
    },
];

static CONTACT: &[Section] = &[
    Section {
        id: "hero",
        label: "Hero",
        description: None,
        fields: &[
            text("heroTitle", "Title"),
            textarea("heroDescription", "Description"),
        ],
    },
    Section {
        id: "form",
        label: "Contact form",
        description: Some("Copy around the form; the fields themselves are fixed"),
        fields: &[
            text("formTitle", "Title"),
            textarea("formDescription", "Description"),
            text("submitButtonText", "Submit button text"),
        ],
    },
    Section {
        id: "details",
        label: "Details",
        description: None,
        fields: &[
            text("email", "Email"),
            text("phone", "Phone"),
            textarea("address", "Address"),
            FieldDescriptor::new("officeImage", Image, "Office image"),
        ],
    },
];

static HOME: &[Section] = &[
    Section {
        id: "hero",
        label: "Hero",
        description: None,
        fields: &[
            text("heroTitle", "Title"),
            textarea("heroSubtitle", "Subtitle"),
            FieldDescriptor::new("heroMedia", Media, "Background media"),
        ],
    },
    Section {
        id: "services",
        label: "Services",
        description: None,
        fields: &[
            text("servicesTitle", "Title"),
            textarea("servicesDescription", "Description"),
            FieldDescriptor::new("serviceImages", ImageArray, "Images").max_items(6),
        ],
    },
    Section {
        id: "stats",
        label: "Stats",
        description: None,
        fields: &[FieldDescriptor::new("stats", StatsArray, "Stats").max_items(4)],
    },
    Section {
        id: "showcase",
        label: "Showcase",
        description: Some("Full-width reel"),
        fields: &[
            text("showcaseTitle", "Title"),
            FieldDescriptor::new("showcaseMedia", Media, "Media"),
        ],
    },
    Section {
        id: "testimonials",
        label: "Testimonials",
        description: None,
        fields: &[
            FieldDescriptor::new("testimonials", TestimonialsArray, "Testimonials").max_items(6),
        ],
    },
    Section {
        id: "cta",
        label: "Call to action",
        description: None,
        fields: &[
            text("ctaTitle", "Title"),
            text("ctaButtonText", "Button text"),
            text("ctaButtonLink", "Button link"),
        ],
    },
];

static CASE_STUDIES: &[Section] = &[
    Section {
        id: "hero",
        label: "Hero",
        description: None,
        fields: &[
            text("heroTitle", "Title"),
            textarea("heroDescription", "Description"),
            FieldDescriptor::new("heroImage", Image, "Hero image"),
        ],
    },
    Section {
        id: "intro",
        label: "Introduction",
        description: Some("Shown above the case study list"),
        fields: &[
            text("introTitle", "Title"),
            textarea("introText", "Text"),
        ],
    },
    Section {
        id: "cta",
        label: "Call to action",
        description: None,
        fields: &[
            text("ctaTitle", "Title"),
            text("ctaButtonText", "Button text"),
        ],
    },
];

static SHOPIFY: &[Section] = &[
    Section {
        id: "hero",
        label: "Hero",
        description: None,
        fields: &[
            text("heroTitle", "Title"),
            textarea("heroSubtitle", "Subtitle"),
            FieldDescriptor::new("heroMedia", Media, "Background media"),
            text("heroButtonText", "Button text"),
        ],
    },
    Section {
        id: "logos",
        label: "Partner logos",
        description: None,
        fields: &[
            text("logosTitle", "Title"),
            FieldDescriptor::new("partnerLogos", ImageArray, "Logos")
                .object_format()
                .max_items(12),
        ],
    },
    Section {
        id: "features",
        label: "Features",
        description: None,
        fields: &[
            text("featuresTitle", "Title"),
            textarea("featuresText", "Text"),
            FieldDescriptor::new("featureImages", ImageArray, "Images").max_items(3),
        ],
    },
    Section {
        id: "stats",
        label: "Stats",
        description: None,
        fields: &[FieldDescriptor::new("stats", StatsArray, "Stats").max_items(3)],
    },
    Section {
        id: "testimonials",
        label: "Testimonials",
        description: None,
        fields: &[
            FieldDescriptor::new("testimonials", TestimonialsArray, "Testimonials").max_items(4),
        ],
    },
    Section {
        id: "cta",
        label: "Call to action",
        description: None,
        fields: &[
            text("ctaTitle", "Title"),
            text("ctaButtonText", "Button text"),
            text("ctaButtonLink", "Button link"),
        ],
    },
];

/// Names of every page with a registry entry, in navigation order.
pub const KNOWN_PAGES: &[&str] = &["home", "about", "work", "case-studies", "contact", "shopify"];

/// Ordered sections for a page. Empty for pages without a registry entry.
pub fn sections_for_page(page: &str) -> &'static [Section] {
    match page {
        "about" => ABOUT,
        "work" => WORK,
        "contact" => CONTACT,
        "home" => HOME,
        "case-studies" => CASE_STUDIES,
        "shopify" => SHOPIFY,
        _ => &[],
    }
}

pub fn is_known_page(page: &str) -> bool {
    !sections_for_page(page).is_empty()
}

pub fn section_by_id(page: &str, section_id: &str) -> Option<&'static Section> {
    sections_for_page(page).iter().find(|s| s.id == section_id)
}

/// Find the descriptor for a content key anywhere on the page.
pub fn field_descriptor(page: &str, key: &str) -> Option<&'static FieldDescriptor> {
    sections_for_page(page)
        .iter()
        .flat_map(|s| s.fields.iter())
        .find(|f| f.key == key)
}

/// The section a content key belongs to.
pub fn section_for_field(page: &str, key: &str) -> Option<&'static Section> {
    sections_for_page(page)
        .iter()
        .find(|s| s.fields.iter().any(|f| f.key == key))
}
