//! Page visibility gate.
//!
//! Decides whether a public page is shown or redirected. Fails open: if the
//! store cannot be read, the page is shown.

use marquee_common::{ContentStore, Page};
use marquee_editor_core::preview::EditorMode;
use marquee_editor_core::{PageContent, page_defaults};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Visibility {
    pub show: bool,
    /// Where to send the visitor when `show` is false.
    pub redirect_to: Option<String>,
}

impl Visibility {
    pub fn shown() -> Self {
        Self {
            show: true,
            redirect_to: None,
        }
    }

    pub fn redirect(to: impl Into<String>) -> Self {
        Self {
            show: false,
            redirect_to: Some(to.into()),
        }
    }

    fn for_page(page: &Page, fallback: &str) -> Self {
        if page.published {
            Self::shown()
        } else {
            Self::redirect(page.redirect_target().unwrap_or(fallback))
        }
    }
}

/// Gate decision plus the content to render when shown.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub visibility: Visibility,
    pub content: PageContent,
}

/// Whether `page` may be shown. Editor mode always shows, without asking the
/// store.
pub async fn check_visibility<S: ContentStore + ?Sized>(
    store: &S,
    page: &str,
    mode: EditorMode,
    fallback: &str,
) -> Visibility {
    resolve(store, page, mode, fallback).await.0
}

/// Gate and content from a single store read. Content falls back to the
/// built-in defaults under the same conditions the gate fails open.
pub async fn resolve_page<S: ContentStore + ?Sized>(
    store: &S,
    page: &str,
    mode: EditorMode,
    fallback: &str,
) -> Resolution {
    let (visibility, stored) = resolve(store, page, mode, fallback).await;
    let defaults = page_defaults(page);
    let content = match stored {
        Some(stored) => PageContent::load(page, stored.content).with_defaults(&defaults),
        None => defaults,
    };
    Resolution {
        visibility,
        content,
    }
}

async fn resolve<S: ContentStore + ?Sized>(
    store: &S,
    page: &str,
    mode: EditorMode,
    fallback: &str,
) -> (Visibility, Option<Page>) {
    if mode.is_embedded() {
        return (Visibility::shown(), None);
    }
    match store.get_page(page).await {
        Ok(stored) => (Visibility::for_page(&stored, fallback), Some(stored)),
        Err(err) if err.is_not_found() => (Visibility::shown(), None),
        Err(err) => {
            tracing::warn!(page, error = %err, "visibility check failed, showing page");
            (Visibility::shown(), None)
        }
    }
}
