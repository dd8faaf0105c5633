//! The content store contract and an in-process implementation.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use dashmap::DashMap;
use mime_sniffer::MimeTypeSniffer;
use smol_str::SmolStr;

use crate::error::ApiError;
use crate::model::{MediaType, Page, PageUpdate, UploadedFile};

/// Page persistence as seen by the editor and the public site.
///
/// Implementations are the external REST API ([`crate::client::ApiClient`])
/// and [`MemoryContentStore`]. Nothing in marquee writes to a store except
/// the editor session's save.
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn list_pages(&self) -> Result<Vec<Page>, ApiError>;

    /// Fetch one page. A missing page is `ApiError::NotFound`.
    async fn get_page(&self, name: &str) -> Result<Page, ApiError>;

    async fn put_page(&self, name: &str, update: &PageUpdate) -> Result<Page, ApiError>;

    async fn upload(&self, file_name: &str, data: Bytes) -> Result<UploadedFile, ApiError>;
}

#[async_trait]
impl<T: ContentStore + ?Sized> ContentStore for Arc<T> {
    async fn list_pages(&self) -> Result<Vec<Page>, ApiError> {
        (**self).list_pages().await
    }

    async fn get_page(&self, name: &str) -> Result<Page, ApiError> {
        (**self).get_page(name).await
    }

    async fn put_page(&self, name: &str, update: &PageUpdate) -> Result<Page, ApiError> {
        (**self).put_page(name, update).await
    }

    async fn upload(&self, file_name: &str, data: Bytes) -> Result<UploadedFile, ApiError> {
        (**self).upload(file_name, data).await
    }
}

/// Work out the media type of an upload.
///
/// A MIME type reported by the server wins; otherwise the bytes are sniffed,
/// and the file extension is the last resort.
pub fn classify_upload(server_mime: Option<&str>, file_name: &str, data: &[u8]) -> MediaType {
    server_mime
        .and_then(MediaType::from_mime)
        .or_else(|| data.sniff_mime_type().and_then(MediaType::from_mime))
        .unwrap_or_else(|| MediaType::from_path(file_name))
}

/// In-memory content store.
///
/// Used by tests and by the server's dev mode. Supports simple failure
/// injection so error paths can be exercised without a network.
#[derive(Debug, Default)]
pub struct MemoryContentStore {
    pages: DashMap<SmolStr, Page>,
    uploads: DashMap<String, Bytes>,
    unavailable: AtomicBool,
    failing_puts: AtomicUsize,
    put_count: AtomicUsize,
    get_count: AtomicUsize,
}

impl MemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pages(pages: impl IntoIterator<Item = Page>) -> Self {
        let store = Self::new();
        for page in pages {
            store.insert(page);
        }
        store
    }

    pub fn insert(&self, page: Page) {
        self.pages.insert(page.name.clone(), page);
    }

    pub fn page(&self, name: &str) -> Option<Page> {
        self.pages.get(name).map(|p| p.clone())
    }

    /// Make every call fail as if the backend were down.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Reject the next `n` PUTs with a 500.
    pub fn fail_next_puts(&self, n: usize) {
        self.failing_puts.store(n, Ordering::SeqCst);
    }

    pub fn put_count(&self) -> usize {
        self.put_count.load(Ordering::SeqCst)
    }

    pub fn get_count(&self) -> usize {
        self.get_count.load(Ordering::SeqCst)
    }

    pub fn upload_count(&self) -> usize {
        self.uploads.len()
    }

    fn check_available(&self) -> Result<(), ApiError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(ApiError::Unavailable {
                message: "memory store marked unavailable".into(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ContentStore for MemoryContentStore {
    async fn list_pages(&self) -> Result<Vec<Page>, ApiError> {
        self.check_available()?;
        let mut pages: Vec<Page> = self.pages.iter().map(|p| p.value().clone()).collect();
        pages.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(pages)
    }

    async fn get_page(&self, name: &str) -> Result<Page, ApiError> {
        self.get_count.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        self.page(name).ok_or_else(|| ApiError::NotFound {
            resource: format!("pages/{name}"),
        })
    }

    async fn put_page(&self, name: &str, update: &PageUpdate) -> Result<Page, ApiError> {
        self.check_available()?;
        let failing = self
            .failing_puts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(ApiError::Status {
                path: format!("pages/{name}"),
                status: 500,
                message: "injected failure".into(),
            });
        }
        self.put_count.fetch_add(1, Ordering::SeqCst);

        let mut entry = self
            .pages
            .entry(SmolStr::new(name))
            .or_insert_with(|| Page::new(name, name, serde_json::Value::Null));
        entry.apply(update);
        entry.updated_at = Some(Utc::now());
        tracing::debug!(page = name, "memory store put");
        Ok(entry.clone())
    }

    async fn upload(&self, file_name: &str, data: Bytes) -> Result<UploadedFile, ApiError> {
        self.check_available()?;
        let media_type = classify_upload(None, file_name, &data);
        let path = format!("/uploads/{}-{}", self.uploads.len() + 1, file_name);
        self.uploads.insert(path.clone(), data);
        Ok(UploadedFile { path, media_type })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_get_missing_page_is_not_found() {
        let store = MemoryContentStore::new();
        let err = store.get_page("about").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_put_creates_then_updates() {
        let store = MemoryContentStore::new();
        store
            .put_page("about", &PageUpdate::content(json!({ "a": 1 })))
            .await
            .unwrap();
        let page = store
            .put_page("about", &PageUpdate::visibility(false, Some("/".into())))
            .await
            .unwrap();
        assert_eq!(page.content, json!({ "a": 1 }));
        assert!(!page.published);
        assert_eq!(page.redirect_target(), Some("/"));
        assert!(page.updated_at.is_some());
        assert_eq!(store.put_count(), 2);
    }

    #[tokio::test]
    async fn test_injected_put_failure_is_one_shot() {
        let store = MemoryContentStore::new();
        store.fail_next_puts(1);
        let update = PageUpdate::content(json!({}));
        assert!(store.put_page("home", &update).await.is_err());
        assert!(store.put_page("home", &update).await.is_ok());
    }

    #[tokio::test]
    async fn test_unavailable_store_fails_reads() {
        let store = MemoryContentStore::with_pages([Page::new("home", "Home", json!({}))]);
        store.set_unavailable(true);
        let err = store.get_page("home").await.unwrap_err();
        assert!(matches!(err, ApiError::Unavailable { .. }));
    }

    #[test]
    fn test_classify_upload_prefers_server_mime() {
        let png = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";
        assert_eq!(
            classify_upload(Some("video/mp4"), "clip.png", png),
            MediaType::Video
        );
        assert_eq!(classify_upload(None, "clip.mp4", png), MediaType::Image);
        assert_eq!(classify_upload(None, "clip.mov", b"????"), MediaType::Video);
    }
}
