//! Operations behind each subcommand. Printing is left to `main`.

use std::path::Path;

use bytes::Bytes;
use marquee_common::{ApiClient, Page, PageUpdate, Role, UploadedFile, User};
use marquee_editor_core::{
    EditorSession, KNOWN_PAGES, SECTION_VISIBILITY_KEY, field_descriptor, is_known_page,
    page_defaults, page_title,
};
use miette::{IntoDiagnostic, Result, miette};
use serde_json::Value;
use smol_str::SmolStr;

fn ensure_known(name: &str) -> Result<()> {
    if is_known_page(name) {
        Ok(())
    } else {
        Err(miette!(
            help = format!("Known pages: {}", KNOWN_PAGES.join(", ")),
            "unknown page {name:?}"
        ))
    }
}

/// Publish or hide a page. A redirect only makes sense when hiding.
pub async fn set_published(
    client: &ApiClient,
    name: &str,
    published: bool,
    redirect: Option<String>,
) -> Result<Page> {
    ensure_known(name)?;
    let redirect = redirect.filter(|_| !published);
    if let Some(target) = redirect.as_deref().filter(|t| !t.starts_with('/')) {
        return Err(miette!("redirect target {target:?} must be an absolute path"));
    }
    Ok(client
        .put_page(name, &PageUpdate::visibility(published, redirect))
        .await?)
}

/// Seed a page with the built-in defaults. Refuses to overwrite stored
/// content unless `force` is set.
pub async fn init_page(client: &ApiClient, name: &str, force: bool) -> Result<Page> {
    ensure_known(name)?;
    if !force {
        match client.get_page(name).await {
            Ok(page) if !is_blank(&page.content) => {
                return Err(miette!(
                    help = "Pass --force to replace it with the defaults",
                    "page {name} already has content"
                ));
            }
            Ok(_) => {}
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(client
        .upsert_page(name, &page_title(name), page_defaults(name).to_value())
        .await?)
}

fn is_blank(content: &Value) -> bool {
    content.as_object().is_none_or(|m| m.is_empty())
}

/// Set one field through an editor session, the same path the editor UI
/// takes on save. Returns whether anything was written.
pub async fn set_field(client: &ApiClient, name: &str, key: &str, raw: &str) -> Result<bool> {
    ensure_known(name)?;
    if field_descriptor(name, key).is_none() && key != SECTION_VISIBILITY_KEY {
        return Err(miette!("page {name} has no field {key:?}"));
    }
    // Bare words are taken as strings so `set about heroTitle1 Hello` works.
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));

    // Read explicitly: a store outage must not turn into saving defaults.
    let (mut session, exists) = match client.get_page(name).await {
        Ok(page) => (EditorSession::from_page(&page), true),
        Err(e) if e.is_not_found() => (EditorSession::with_defaults(name), false),
        Err(e) => return Err(e.into()),
    };
    session.update_field(key, value);
    if !session.is_dirty() {
        tracing::info!(page = name, key, "value unchanged, nothing to save");
        return Ok(false);
    }

    if exists {
        session.save_changes(client).await?;
    } else {
        client
            .upsert_page(name, &page_title(name), session.draft().to_value())
            .await?;
    }
    Ok(true)
}

pub async fn upload(client: &ApiClient, path: &Path) -> Result<UploadedFile> {
    let data = tokio::fs::read(path).await.into_diagnostic()?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| miette!("not a file path: {}", path.display()))?;
    Ok(client.upload(file_name, Bytes::from(data)).await?)
}

pub async fn create_user(
    client: &ApiClient,
    email: String,
    name: String,
    role: Role,
    password: String,
) -> Result<User> {
    if !email.contains('@') {
        return Err(miette!("{email:?} is not an email address"));
    }
    let user = User {
        id: None,
        email,
        name,
        role,
        permissions: Vec::new(),
        password: Some(password),
    };
    Ok(client.create(&user).await?)
}

pub fn display_id(id: &Option<SmolStr>) -> &str {
    id.as_deref().unwrap_or("-")
}
