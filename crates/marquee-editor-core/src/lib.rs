//! marquee-editor-core: page editing logic without UI framework dependencies.
//!
//! This crate provides:
//! - `registry` - the static section/field table for each editable page
//! - `defaults` - built-in content used when nothing is stored
//! - `PageContent` - field values plus first-class section visibility
//! - `fields` - per-kind controls and whole-value edit operations
//! - `EditorSession` - draft/snapshot state, save and reset
//! - `navigator` - the section list beside the preview
//! - `preview` - the host/preview message protocol and its drivers

pub mod content;
pub mod defaults;
pub mod error;
pub mod fields;
pub mod navigator;
pub mod preview;
pub mod registry;
pub mod session;

pub use content::{PageContent, SECTION_VISIBILITY_KEY};
pub use defaults::{page_defaults, page_title};
pub use error::{EditorError, Result};
pub use fields::{
    Control, FieldOp, ImageArray, ImageItem, MediaValue, Stat, Testimonial, TestimonialField,
    TestimonialPanel, apply, render_control,
};
pub use navigator::NavEntry;
pub use registry::{
    FieldDescriptor, FieldKind, KNOWN_PAGES, Section, field_descriptor, is_known_page,
    section_by_id, sections_for_page,
};
pub use session::{EditorSession, LoadSource, PendingSave};
pub use smol_str::SmolStr;
