use std::sync::Mutex;

use marquee_editor_core::preview::{
    EditorMode, EmbeddedPreview, HostMessage, IncomingMessage, Origin, PreviewMessage,
    PreviewPayload, PreviewPort,
};
use marquee_editor_core::{EditorSession, page_defaults};
use marquee_renderer::{PageRenderer, RenderOptions};
use serde_json::json;

#[derive(Default)]
struct NullPort(Mutex<usize>);

impl PreviewPort<PreviewMessage> for NullPort {
    fn post(&self, _message: &PreviewMessage, _target: &Origin) {
        *self.0.lock().unwrap() += 1;
    }
}

const SITE: &str = "https://site.example";

fn init_from(session: &EditorSession) -> IncomingMessage {
    let message = HostMessage::EditorInit {
        payload: session.preview_payload(),
    };
    IncomingMessage::new(SITE, serde_json::to_value(message).unwrap())
}

#[test]
fn test_repeated_init_renders_identically() {
    let renderer = PageRenderer::new("Studio").unwrap();
    let mut session = EditorSession::with_defaults("about");
    session.update_field("heroTitle1", json!("Hello again"));
    session.select_section(Some("team")).unwrap();

    let mut preview = EmbeddedPreview::new(
        "about",
        Origin::parse(SITE).unwrap(),
        EditorMode::Embedded,
        NullPort::default(),
    );
    preview.mount();

    preview.handle(&init_from(&session));
    let first = renderer.render_preview(&preview).unwrap();
    preview.handle(&init_from(&session));
    let second = renderer.render_preview(&preview).unwrap();

    assert_eq!(first, second);
    assert!(first.contains("Hello again"));
    assert!(first.contains("section section-team is-selected"));
}

#[test]
fn test_preview_shows_hidden_sections_dimmed() {
    let renderer = PageRenderer::new("Studio").unwrap();
    let mut data = page_defaults("work");
    data.set_section_visible("clients", false);
    let update = HostMessage::EditorUpdate {
        payload: PreviewPayload {
            section: None,
            data: data.clone(),
        },
    };

    let mut preview = EmbeddedPreview::new(
        "work",
        Origin::parse(SITE).unwrap(),
        EditorMode::Embedded,
        NullPort::default(),
    );
    preview.mount();
    preview.handle(&IncomingMessage::new(SITE, serde_json::to_value(update).unwrap()));

    let html = renderer.render_preview(&preview).unwrap();
    assert!(html.contains("section section-clients is-hidden"));

    let public = renderer
        .render("work", &data, &RenderOptions::standalone())
        .unwrap();
    assert!(!public.contains(r#"data-section-id="clients""#));
}

#[test]
fn test_section_repaint_matches_full_render() {
    let renderer = PageRenderer::new("Studio").unwrap();
    let mut session = EditorSession::with_defaults("about");
    session.update_field("storyTitle", json!("Where we started"));
    session.select_section(Some("story")).unwrap();

    let mut preview = EmbeddedPreview::new(
        "about",
        Origin::parse(SITE).unwrap(),
        EditorMode::Embedded,
        NullPort::default(),
    );
    preview.mount();
    preview.handle(&init_from(&session));

    let sections = renderer.render_preview_sections(&preview).unwrap();
    let ids: Vec<_> = sections.iter().map(|(id, _)| *id).collect();
    let expected: Vec<_> = preview.sections().map(|(s, _)| s.id).collect();
    assert_eq!(ids, expected);

    let page = renderer.render_preview(&preview).unwrap();
    for (id, html) in &sections {
        assert!(html.contains(&format!(r#"data-section-id="{id}""#)));
        assert!(page.contains(html.as_str()), "section {id} differs from the full page");
    }
    let (_, story) = sections.iter().find(|(id, _)| *id == "story").unwrap();
    assert!(story.contains("Where we started"));
    assert!(story.contains("is-selected"));
}
