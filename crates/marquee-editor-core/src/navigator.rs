//! Section list shown beside the preview.
//!
//! Stateless: entries are derived from the registry and the session, and
//! toggling writes straight through the session.

use serde::Serialize;

use crate::error::Result;
use crate::registry::sections_for_page;
use crate::session::EditorSession;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavEntry {
    pub id: &'static str,
    pub label: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<&'static str>,
    pub visible: bool,
    pub selected: bool,
}

/// One entry per registered section, in page order.
pub fn entries(session: &EditorSession) -> Vec<NavEntry> {
    sections_for_page(session.page())
        .iter()
        .map(|section| NavEntry {
            id: section.id,
            label: section.label,
            description: section.description,
            visible: session.draft().is_section_visible(section.id),
            selected: session.selected_section() == Some(section.id),
        })
        .collect()
}

/// Flip a section's visibility in the draft. Returns the new visibility.
pub fn toggle_visibility(session: &mut EditorSession, section_id: &str) -> Result<bool> {
    let visible = !session.draft().is_section_visible(section_id);
    session.set_section_visible(section_id, visible)?;
    Ok(visible)
}
