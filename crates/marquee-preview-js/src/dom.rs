//! DOM glue: finding the clicked section and swapping repainted sections in.

use marquee_editor_core::preview::{EmbeddedPreview, PreviewMessage, PreviewPort};
use marquee_renderer::PageRenderer;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, Event};

const SECTION_ATTR: &str = "data-section-id";

/// Id of the section wrapper enclosing the event's target.
pub fn section_id_of(event: &Event) -> Option<String> {
    let target = event.target()?.dyn_into::<Element>().ok()?;
    section_id_at(&target)
}

pub fn section_id_at(element: &Element) -> Option<String> {
    element
        .closest(&format!("[{SECTION_ATTR}]"))
        .ok()??
        .get_attribute(SECTION_ATTR)
}

/// Replace each section element with a fresh render of the preview's
/// current snapshot. Sections missing from the document are skipped.
pub fn repaint<P: PreviewPort<PreviewMessage>>(
    document: &Document,
    renderer: &PageRenderer,
    preview: &EmbeddedPreview<P>,
) {
    let sections = match renderer.render_preview_sections(preview) {
        Ok(sections) => sections,
        Err(err) => {
            tracing::warn!(error = %err, "failed to render preview snapshot");
            return;
        }
    };
    for (id, html) in sections {
        match document.query_selector(&format!("[{SECTION_ATTR}=\"{id}\"]")) {
            Ok(Some(element)) => element.set_outer_html(&html),
            _ => tracing::debug!(section = id, "section not in document"),
        }
    }
    tracing::debug!(page = preview.page(), snapshots = preview.snapshots_applied(), "repainted");
}
