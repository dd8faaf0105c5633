//! Editor state for one page being edited.
//!
//! The session holds the draft the user is editing, the snapshot last loaded
//! or saved, and the selected section. Dirty is derived (`draft !=
//! snapshot`), so it can never drift from the data.

use bytes::Bytes;
use marquee_common::{ApiError, ContentStore, Page, PageUpdate, UploadedFile};
use serde_json::Value;
use smol_str::SmolStr;

use crate::content::PageContent;
use crate::defaults::page_defaults;
use crate::error::{EditorError, Result};
use crate::fields::{self, FieldOp};
use crate::preview::PreviewPayload;
use crate::registry::{self, FieldDescriptor};

/// Where the session's starting content came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    /// Stored content, merged over the defaults.
    Stored,
    /// Nothing stored (or the store could not be read); built-in defaults.
    Defaults,
}

/// A save that has been started but not finished.
///
/// Carries the exact content sent, so the snapshot matches what the store
/// received even if the draft changes while the request is in flight.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "a pending save must be passed to finish_save"]
pub struct PendingSave {
    page: SmolStr,
    content: PageContent,
}

impl PendingSave {
    pub fn page(&self) -> &str {
        &self.page
    }

    pub fn content(&self) -> &PageContent {
        &self.content
    }

    /// The store request body.
    pub fn update(&self) -> PageUpdate {
        PageUpdate::content(self.content.to_value())
    }
}

#[derive(Debug, Clone)]
pub struct EditorSession {
    page: SmolStr,
    draft: PageContent,
    snapshot: PageContent,
    selected: Option<SmolStr>,
    saving: bool,
    revision: u64,
    source: LoadSource,
}

impl EditorSession {
    /// Start a session from content already in hand.
    pub fn new(page: impl Into<SmolStr>, content: PageContent) -> Self {
        Self {
            page: page.into(),
            draft: content.clone(),
            snapshot: content,
            selected: None,
            saving: false,
            revision: 0,
            source: LoadSource::Stored,
        }
    }

    /// Start a session on the built-in defaults.
    pub fn with_defaults(page: impl Into<SmolStr>) -> Self {
        let page = page.into();
        let mut session = Self::new(page.clone(), page_defaults(&page));
        session.source = LoadSource::Defaults;
        session
    }

    /// Load a page from the store. Never fails: any read error falls back to
    /// the built-in defaults.
    pub async fn load<S: ContentStore + ?Sized>(store: &S, page: &str) -> Self {
        match store.get_page(page).await {
            Ok(stored) => Self::from_page(&stored),
            Err(err) if err.is_not_found() => {
                tracing::debug!(page, "no stored content, using defaults");
                Self::with_defaults(page)
            }
            Err(err) => {
                tracing::warn!(page, error = %err, "failed to load page, using defaults");
                Self::with_defaults(page)
            }
        }
    }

    /// Session over a stored page record. Stored keys win; defaults fill gaps.
    pub fn from_page(page: &Page) -> Self {
        let stored = PageContent::load(&page.name, page.content.clone());
        if stored.is_empty() {
            return Self::with_defaults(page.name.clone());
        }
        Self::new(page.name.clone(), stored.with_defaults(&page_defaults(&page.name)))
    }

    pub fn page(&self) -> &str {
        &self.page
    }

    pub fn draft(&self) -> &PageContent {
        &self.draft
    }

    pub fn snapshot(&self) -> &PageContent {
        &self.snapshot
    }

    pub fn source(&self) -> LoadSource {
        self.source
    }

    pub fn selected_section(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn is_dirty(&self) -> bool {
        self.draft != self.snapshot
    }

    pub fn is_saving(&self) -> bool {
        self.saving
    }

    /// Bumped on every draft or selection change.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.draft.get(key)
    }

    pub fn update_field(&mut self, key: &str, value: Value) {
        self.draft.set(key, value);
        self.bump();
    }

    /// Replace an array field wholesale.
    pub fn update_array_field(&mut self, key: &str, items: Vec<Value>) {
        self.update_field(key, Value::Array(items));
    }

    pub fn set_section_visible(&mut self, section_id: &str, visible: bool) -> Result<()> {
        self.require_section(section_id)?;
        self.draft.set_section_visible(section_id, visible);
        self.bump();
        Ok(())
    }

    /// Apply an edit to a registered field, reading its latest draft value.
    pub fn apply_op(&mut self, key: &str, op: FieldOp) -> Result<()> {
        let descriptor = self.descriptor(key)?;
        let next = fields::apply(descriptor, self.draft.get(key), op)?;
        self.update_field(key, next);
        Ok(())
    }

    /// Select a section, or clear the selection with `None`. Does not touch
    /// the draft.
    pub fn select_section(&mut self, section_id: Option<&str>) -> Result<()> {
        match section_id {
            Some(id) => {
                self.require_section(id)?;
                self.selected = Some(id.into());
            }
            None => self.selected = None,
        }
        self.bump();
        Ok(())
    }

    /// Mark a save as started and capture the content to send.
    pub fn begin_save(&mut self) -> Result<PendingSave> {
        if self.saving {
            return Err(EditorError::SaveInFlight {
                page: self.page.clone(),
            });
        }
        self.saving = true;
        Ok(PendingSave {
            page: self.page.clone(),
            content: self.draft.clone(),
        })
    }

    /// Record the outcome of a save. On failure the draft is left as is and
    /// the session stays dirty.
    pub fn finish_save(
        &mut self,
        pending: PendingSave,
        result: std::result::Result<Page, ApiError>,
    ) -> Result<()> {
        self.saving = false;
        match result {
            Ok(_) => {
                self.snapshot = pending.content;
                self.source = LoadSource::Stored;
                tracing::info!(page = %self.page, "page saved");
                Ok(())
            }
            Err(source) => {
                tracing::warn!(page = %self.page, error = %source, "save failed");
                Err(EditorError::Save {
                    page: self.page.clone(),
                    source,
                })
            }
        }
    }

    /// Persist the whole draft.
    pub async fn save_changes<S: ContentStore + ?Sized>(&mut self, store: &S) -> Result<()> {
        let pending = self.begin_save()?;
        let result = store.put_page(&pending.page, &pending.update()).await;
        self.finish_save(pending, result)
    }

    /// Discard the draft.
    pub fn reset_changes(&mut self) {
        self.draft = self.snapshot.clone();
        self.bump();
    }

    /// Upload a file and store it into `key` with the op matching the
    /// field's kind. A failed upload leaves the field untouched.
    pub async fn upload_into<S: ContentStore + ?Sized>(
        &mut self,
        store: &S,
        key: &str,
        file_name: &str,
        data: Bytes,
    ) -> Result<UploadedFile> {
        let descriptor = self.descriptor(key)?;
        if !descriptor.kind.accepts_upload() {
            return Err(EditorError::FieldKind {
                key: key.into(),
                kind: descriptor.kind,
                op: "upload",
            });
        }

        let file = store
            .upload(file_name, data)
            .await
            .map_err(|source| EditorError::Upload {
                key: key.into(),
                source,
            })?;
        if let Some(op) = FieldOp::for_upload(descriptor.kind, &file) {
            self.apply_op(key, op)?;
        }
        Ok(file)
    }

    /// Snapshot for the preview: the full draft and the current selection.
    pub fn preview_payload(&self) -> PreviewPayload {
        PreviewPayload {
            section: self.selected.clone(),
            data: self.draft.clone(),
        }
    }

    fn descriptor(&self, key: &str) -> Result<&'static FieldDescriptor> {
        registry::field_descriptor(&self.page, key).ok_or_else(|| EditorError::UnknownField {
            page: self.page.clone(),
            key: key.into(),
        })
    }

    fn require_section(&self, section_id: &str) -> Result<()> {
        match registry::section_by_id(&self.page, section_id) {
            Some(_) => Ok(()),
            None => Err(EditorError::UnknownSection {
                page: self.page.clone(),
                section: section_id.into(),
            }),
        }
    }

    fn bump(&mut self) {
        self.revision += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marquee_common::MemoryContentStore;
    use serde_json::json;

    #[tokio::test]
    async fn test_load_missing_page_uses_defaults() {
        let store = MemoryContentStore::new();
        let session = EditorSession::load(&store, "about").await;
        assert_eq!(session.draft(), &page_defaults("about"));
        assert_eq!(session.source(), LoadSource::Defaults);
        assert!(!session.is_dirty());
    }

    #[tokio::test]
    async fn test_load_unavailable_store_uses_defaults() {
        let store = MemoryContentStore::new();
        store.set_unavailable(true);
        let session = EditorSession::load(&store, "work").await;
        assert_eq!(session.draft(), &page_defaults("work"));
    }

    #[tokio::test]
    async fn test_load_merges_stored_over_defaults() {
        let store = MemoryContentStore::with_pages([Page::new(
            "about",
            "About",
            json!({ "heroTitle1": "Stored", "heroVisible": false }),
        )]);
        let session = EditorSession::load(&store, "about").await;
        assert_eq!(session.draft().text("heroTitle1"), "Stored");
        assert_eq!(session.draft().text("ctaButtonLink"), "/contact");
        assert!(!session.draft().is_section_visible("hero"));
        assert_eq!(session.source(), LoadSource::Stored);
    }

    #[test]
    fn test_dirty_tracks_draft_against_snapshot() {
        let mut session = EditorSession::with_defaults("about");
        let original = session.field("heroTitle1").cloned().unwrap();
        session.update_field("heroTitle1", json!("Changed"));
        assert!(session.is_dirty());
        session.update_field("heroTitle1", original);
        assert!(!session.is_dirty());
    }

    #[test]
    fn test_select_does_not_dirty() {
        let mut session = EditorSession::with_defaults("about");
        let before = session.revision();
        session.select_section(Some("story")).unwrap();
        assert_eq!(session.selected_section(), Some("story"));
        assert!(!session.is_dirty());
        assert!(session.revision() > before);
        assert!(session.select_section(Some("nope")).is_err());
        session.select_section(None).unwrap();
        assert_eq!(session.selected_section(), None);
    }

    #[tokio::test]
    async fn test_save_failure_keeps_draft() {
        let store = MemoryContentStore::new();
        store.fail_next_puts(1);
        let mut session = EditorSession::with_defaults("about");
        session.update_field("heroTitle1", json!("Changed"));

        let err = session.save_changes(&store).await.unwrap_err();
        assert!(matches!(err, EditorError::Save { .. }));
        assert!(session.is_dirty());
        assert!(!session.is_saving());
        assert_eq!(session.draft().text("heroTitle1"), "Changed");

        session.save_changes(&store).await.unwrap();
        assert!(!session.is_dirty());
    }

    #[test]
    fn test_second_save_while_in_flight_rejected() {
        let mut session = EditorSession::with_defaults("home");
        let pending = session.begin_save().unwrap();
        assert!(matches!(session.begin_save(), Err(EditorError::SaveInFlight { .. })));
        session
            .finish_save(pending, Ok(Page::new("home", "Home", json!({}))))
            .unwrap();
        assert!(!session.is_saving());
    }

    #[test]
    fn test_edit_during_save_stays_dirty() {
        let mut session = EditorSession::with_defaults("home");
        session.update_field("heroTitle", json!("one"));
        let pending = session.begin_save().unwrap();
        session.update_field("heroTitle", json!("two"));
        session
            .finish_save(pending, Ok(Page::new("home", "Home", json!({}))))
            .unwrap();
        assert_eq!(session.snapshot().text("heroTitle"), "one");
        assert!(session.is_dirty());
    }

    #[test]
    fn test_reset_restores_snapshot() {
        let mut session = EditorSession::with_defaults("contact");
        session.update_field("email", json!("x@y.z"));
        session.set_section_visible("form", false).unwrap();
        session.reset_changes();
        assert!(!session.is_dirty());
        assert!(session.draft().is_section_visible("form"));
    }

    #[test]
    fn test_apply_op_reads_latest_value() {
        let mut session = EditorSession::with_defaults("about");
        session.update_array_field("storyImages", vec![json!("/a.jpg")]);
        session
            .apply_op(
                "storyImages",
                FieldOp::AddImage {
                    path: "/b.jpg".into(),
                    name: None,
                },
            )
            .unwrap();
        assert_eq!(session.field("storyImages"), Some(&json!(["/a.jpg", "/b.jpg"])));
        assert!(matches!(
            session.apply_op("nope", FieldOp::ClearImage),
            Err(EditorError::UnknownField { .. })
        ));
    }

    #[tokio::test]
    async fn test_failed_upload_leaves_field() {
        let store = MemoryContentStore::new();
        store.set_unavailable(true);
        let mut session = EditorSession::with_defaults("about");
        let before = session.field("heroImage").cloned();
        let err = session
            .upload_into(&store, "heroImage", "a.png", Bytes::from_static(b"png"))
            .await
            .unwrap_err();
        assert!(matches!(err, EditorError::Upload { .. }));
        assert_eq!(session.field("heroImage").cloned(), before);
        assert!(!session.is_dirty());
    }

    #[tokio::test]
    async fn test_upload_into_media_field() {
        let store = MemoryContentStore::new();
        let mut session = EditorSession::with_defaults("home");
        let file = session
            .upload_into(&store, "showcaseMedia", "reel.mp4", Bytes::from_static(b"????"))
            .await
            .unwrap();
        assert_eq!(
            session.field("showcaseMedia"),
            Some(&json!({ "url": file.path, "mediaType": "video" }))
        );
    }

    #[tokio::test]
    async fn test_upload_into_text_field_rejected_before_upload() {
        let store = MemoryContentStore::new();
        let mut session = EditorSession::with_defaults("home");
        let err = session
            .upload_into(&store, "heroTitle", "a.png", Bytes::from_static(b"x"))
            .await
            .unwrap_err();
        assert!(matches!(err, EditorError::FieldKind { .. }));
        assert_eq!(store.upload_count(), 0);
    }
}
