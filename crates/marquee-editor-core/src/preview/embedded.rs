use smol_str::SmolStr;

use super::protocol::{HostMessage, IncomingMessage, Origin, PreviewMessage, PreviewPort, Rejected};
use crate::content::PageContent;
use crate::defaults::page_defaults;
use crate::registry;

/// How a public page is being rendered. Decided once, at load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EditorMode {
    #[default]
    Standalone,
    /// Inside the editor's preview frame (`?editor=true`).
    Embedded,
}

impl EditorMode {
    /// Read the `editor=true` flag from a URL query string (without `?`).
    pub fn from_query(query: Option<&str>) -> Self {
        let embedded = query.is_some_and(|q| {
            url::form_urlencoded::parse(q.trim_start_matches('?').as_bytes())
                .any(|(k, v)| k == "editor" && v == "true")
        });
        if embedded {
            EditorMode::Embedded
        } else {
            EditorMode::Standalone
        }
    }

    pub fn is_embedded(self) -> bool {
        self == EditorMode::Embedded
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewState {
    Unmounted,
    /// `PREVIEW_READY` sent, no snapshot received yet.
    MountedWaitingInit,
    Synced,
}

/// Result of feeding a message to the preview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Applied {
    Snapshot,
    /// Standalone pages do not listen.
    NotListening,
    Rejected(Rejected),
}

/// Preview-side half of the protocol.
///
/// Holds whatever the host last sent and nothing else. It never fetches or
/// writes content; in embedded mode the host's snapshot is the only source.
pub struct EmbeddedPreview<P> {
    page: SmolStr,
    origin: Origin,
    mode: EditorMode,
    port: P,
    state: PreviewState,
    content: PageContent,
    selected: Option<SmolStr>,
    snapshots: u64,
}

impl<P: PreviewPort<PreviewMessage>> EmbeddedPreview<P> {
    /// Starts out showing the page's built-in defaults.
    pub fn new(page: impl Into<SmolStr>, origin: Origin, mode: EditorMode, port: P) -> Self {
        let page = page.into();
        Self {
            content: page_defaults(&page),
            page,
            origin,
            mode,
            port,
            state: PreviewState::Unmounted,
            selected: None,
            snapshots: 0,
        }
    }

    pub fn page(&self) -> &str {
        &self.page
    }

    pub fn mode(&self) -> EditorMode {
        self.mode
    }

    pub fn state(&self) -> PreviewState {
        self.state
    }

    pub fn content(&self) -> &PageContent {
        &self.content
    }

    pub fn selected_section(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn is_selected(&self, section_id: &str) -> bool {
        self.selected.as_deref() == Some(section_id)
    }

    /// Number of snapshots applied so far.
    pub fn snapshots_applied(&self) -> u64 {
        self.snapshots
    }

    /// Announce readiness to the host. Standalone pages stay silent.
    pub fn mount(&mut self) {
        if self.state != PreviewState::Unmounted {
            return;
        }
        if self.mode.is_embedded() {
            self.port.post(&PreviewMessage::PreviewReady, &self.origin);
            self.state = PreviewState::MountedWaitingInit;
        } else {
            self.state = PreviewState::Synced;
        }
    }

    /// Apply a host message. `EDITOR_INIT` and `EDITOR_UPDATE` are treated the
    /// same: each is a complete snapshot, so an update arriving before the
    /// init is as good a starting point as the init itself.
    pub fn handle(&mut self, incoming: &IncomingMessage) -> Applied {
        if !self.mode.is_embedded() {
            return Applied::NotListening;
        }
        let envelope = match incoming.accept::<HostMessage>(&self.origin) {
            Ok(envelope) => envelope,
            Err(rejected) => return Applied::Rejected(rejected),
        };
        let payload = envelope.message.into_payload();
        self.content = payload.data;
        self.selected = payload.section;
        self.state = PreviewState::Synced;
        self.snapshots += 1;
        Applied::Snapshot
    }

    /// A click on a section wrapper. Returns whether the click was taken
    /// over by the editor (embedded mode only).
    pub fn click(&self, section_id: &str) -> bool {
        if !self.mode.is_embedded() {
            return false;
        }
        if registry::section_by_id(&self.page, section_id).is_none() {
            tracing::debug!(page = %self.page, section_id, "click outside a known section");
            return false;
        }
        self.port.post(
            &PreviewMessage::SectionClicked {
                section_id: section_id.into(),
            },
            &self.origin,
        );
        true
    }

    /// Sections to draw, in registry order, with their visibility.
    pub fn sections(&self) -> impl Iterator<Item = (&'static registry::Section, bool)> + '_ {
        registry::sections_for_page(&self.page)
            .iter()
            .map(|s| (s, self.content.is_section_visible(s.id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingPort(Mutex<Vec<PreviewMessage>>);

    impl PreviewPort<PreviewMessage> for RecordingPort {
        fn post(&self, message: &PreviewMessage, _target: &Origin) {
            self.0.lock().unwrap().push(message.clone());
        }
    }

    fn origin() -> Origin {
        Origin::parse("https://site.example").unwrap()
    }

    fn init(title: &str, section: Option<&str>) -> IncomingMessage {
        IncomingMessage::new(
            "https://site.example",
            json!({
                "type": "EDITOR_INIT",
                "payload": { "section": section, "data": { "heroTitle1": title } },
            }),
        )
    }

    #[test]
    fn test_editor_mode_from_query() {
        assert_eq!(EditorMode::from_query(Some("editor=true")), EditorMode::Embedded);
        assert_eq!(EditorMode::from_query(Some("?a=1&editor=true")), EditorMode::Embedded);
        assert_eq!(EditorMode::from_query(Some("editor=false")), EditorMode::Standalone);
        assert_eq!(EditorMode::from_query(Some("editor")), EditorMode::Standalone);
        assert_eq!(EditorMode::from_query(None), EditorMode::Standalone);
    }

    #[test]
    fn test_state_machine() {
        let mut preview = EmbeddedPreview::new("about", origin(), EditorMode::Embedded, RecordingPort::default());
        assert_eq!(preview.state(), PreviewState::Unmounted);
        preview.mount();
        assert_eq!(preview.state(), PreviewState::MountedWaitingInit);
        preview.mount();
        assert_eq!(preview.port.0.lock().unwrap().as_slice(), &[PreviewMessage::PreviewReady]);

        assert_eq!(preview.handle(&init("Hello", Some("hero"))), Applied::Snapshot);
        assert_eq!(preview.state(), PreviewState::Synced);
        assert_eq!(preview.content().text("heroTitle1"), "Hello");
        assert!(preview.is_selected("hero"));
    }

    #[test]
    fn test_repeated_init_is_idempotent() {
        let mut preview = EmbeddedPreview::new("about", origin(), EditorMode::Embedded, RecordingPort::default());
        preview.mount();
        preview.handle(&init("Hello", None));
        let first = (preview.content().clone(), preview.selected_section().map(String::from));
        preview.handle(&init("Hello", None));
        let second = (preview.content().clone(), preview.selected_section().map(String::from));
        assert_eq!(first, second);
        assert_eq!(preview.snapshots_applied(), 2);
    }

    #[test]
    fn test_update_before_init_syncs() {
        let mut preview = EmbeddedPreview::new("about", origin(), EditorMode::Embedded, RecordingPort::default());
        preview.mount();
        let update = IncomingMessage::new(
            "https://site.example",
            json!({ "type": "EDITOR_UPDATE", "payload": { "section": null, "data": {} } }),
        );
        assert_eq!(preview.handle(&update), Applied::Snapshot);
        assert_eq!(preview.state(), PreviewState::Synced);
    }

    #[test]
    fn test_foreign_origin_ignored() {
        let mut preview = EmbeddedPreview::new("about", origin(), EditorMode::Embedded, RecordingPort::default());
        preview.mount();
        let mut evil = init("pwned", None);
        evil.origin = "https://evil.example".into();
        assert!(matches!(preview.handle(&evil), Applied::Rejected(Rejected::Origin(_))));
        assert_eq!(preview.state(), PreviewState::MountedWaitingInit);
        assert_eq!(preview.content(), &page_defaults("about"));
    }

    #[test]
    fn test_standalone_never_talks() {
        let mut preview = EmbeddedPreview::new("about", origin(), EditorMode::Standalone, RecordingPort::default());
        preview.mount();
        assert!(!preview.click("hero"));
        assert_eq!(preview.handle(&init("x", None)), Applied::NotListening);
        assert!(preview.port.0.lock().unwrap().is_empty());
    }

    #[test]
    fn test_click_emits_section_clicked() {
        let mut preview = EmbeddedPreview::new("about", origin(), EditorMode::Embedded, RecordingPort::default());
        preview.mount();
        assert!(preview.click("story"));
        assert!(!preview.click("footer"));
        assert_eq!(
            preview.port.0.lock().unwrap().last(),
            Some(&PreviewMessage::SectionClicked { section_id: "story".into() })
        );
    }
}
