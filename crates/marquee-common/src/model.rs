//! Records exchanged with the content store REST API.
//!
//! The store owns persistence; these types only describe the wire shapes.
//! Page `content` is opaque here. Its structure is defined per page by the
//! section registry in `marquee-editor-core`.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use smol_str::SmolStr;

fn default_true() -> bool {
    true
}

/// Stores write explicit `null`s for unset columns; read them as the default.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

fn null_as_true<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Option::<bool>::deserialize(deserializer).map(|v| v.unwrap_or(true))
}

/// A marketing page record, keyed by `name`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub name: SmolStr,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    /// Opaque content blob. `null` or a non-object is treated as empty.
    #[serde(default)]
    pub content: Value,
    #[serde(default = "default_true", deserialize_with = "null_as_true")]
    pub published: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Page {
    pub fn new(name: impl Into<SmolStr>, title: impl Into<String>, content: Value) -> Self {
        Self {
            name: name.into(),
            title: title.into(),
            content,
            published: true,
            redirect_to: None,
            updated_at: None,
        }
    }

    /// The stored redirect target, ignoring blank strings.
    pub fn redirect_target(&self) -> Option<&str> {
        self.redirect_to
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
    }

    /// Apply a partial update in place, as the store does on PUT.
    pub fn apply(&mut self, update: &PageUpdate) {
        if let Some(title) = &update.title {
            self.title = title.clone();
        }
        if let Some(content) = &update.content {
            self.content = content.clone();
        }
        if let Some(published) = update.published {
            self.published = published;
        }
        if let Some(redirect_to) = &update.redirect_to {
            self.redirect_to = redirect_to.clone();
        }
    }
}

/// Body of `PUT /pages/:name`. Absent fields are left untouched by the store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<SmolStr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published: Option<bool>,
    /// `Some(None)` clears the redirect.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect_to: Option<Option<String>>,
}

impl PageUpdate {
    pub fn content(content: Value) -> Self {
        Self {
            content: Some(content),
            ..Default::default()
        }
    }

    pub fn visibility(published: bool, redirect_to: Option<String>) -> Self {
        Self {
            published: Some(published),
            redirect_to: Some(redirect_to),
            ..Default::default()
        }
    }

    /// Full record used to create a page that does not exist yet.
    pub fn create(name: impl Into<SmolStr>, title: impl Into<String>, content: Value) -> Self {
        Self {
            name: Some(name.into()),
            title: Some(title.into()),
            content: Some(content),
            published: Some(true),
            redirect_to: None,
        }
    }
}

/// Kind of media stored in a media field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    #[default]
    Image,
    Video,
}

/// Extensions treated as video when no MIME type is known.
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "webm", "ogg", "mov", "avi"];

impl MediaType {
    /// Classify from a MIME type string. `None` for types that are neither.
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or("").trim();
        if essence.starts_with("video/") {
            Some(MediaType::Video)
        } else if essence.starts_with("image/") {
            Some(MediaType::Image)
        } else {
            None
        }
    }

    /// Classify a path or URL by its extension. Query strings and fragments
    /// are ignored; anything not on the video allow-list is an image.
    pub fn from_path(path: &str) -> Self {
        let path = path.split(['?', '#']).next().unwrap_or("");
        let file = path.rsplit('/').next().unwrap_or(path);
        match file.rsplit_once('.') {
            Some((_, ext))
                if VIDEO_EXTENSIONS
                    .iter()
                    .any(|v| v.eq_ignore_ascii_case(ext)) =>
            {
                MediaType::Video
            }
            _ => MediaType::Image,
        }
    }

    pub fn is_video(self) -> bool {
        self == MediaType::Video
    }
}

/// Result of `POST /upload`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    pub path: String,
    pub media_type: MediaType,
}

/// Account roles for the admin layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Editor,
    #[default]
    Viewer,
}

/// Individually grantable admin permissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Permission {
    EditPages,
    PublishPages,
    EditWorks,
    EditCaseStudies,
    Upload,
    ReadContacts,
    ManageUsers,
}

impl Role {
    /// Permissions every account with this role has.
    pub fn grants(self) -> &'static [Permission] {
        use Permission::*;
        match self {
            Role::Admin => &[
                EditPages,
                PublishPages,
                EditWorks,
                EditCaseStudies,
                Upload,
                ReadContacts,
                ManageUsers,
            ],
            Role::Editor => &[EditPages, EditWorks, EditCaseStudies, Upload],
            Role::Viewer => &[],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<SmolStr>,
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub role: Role,
    /// Extra grants on top of the role.
    #[serde(default)]
    pub permissions: Vec<Permission>,
    /// Only sent when creating or changing a password.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl User {
    pub fn can(&self, permission: Permission) -> bool {
        self.role.grants().contains(&permission) || self.permissions.contains(&permission)
    }
}

/// Portfolio entry shown on the Work page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Work {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<SmolStr>,
    pub slug: SmolStr,
    pub title: String,
    #[serde(default)]
    pub client: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub cover_image: String,
    #[serde(default = "default_true")]
    pub published: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseStudy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<SmolStr>,
    pub slug: SmolStr,
    pub title: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub hero_image: String,
    #[serde(default)]
    pub body: String,
    #[serde(default = "default_true")]
    pub published: bool,
}

/// A message sent through the public contact form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactSubmission {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<SmolStr>,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Result of a successful login.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user: User,
}

/// A CRUD collection exposed by the REST API.
pub trait Resource: Serialize + DeserializeOwned + Send + Sync {
    /// Collection path, e.g. `users`.
    const PATH: &'static str;

    fn id(&self) -> Option<&str>;
}

impl Resource for User {
    const PATH: &'static str = "users";

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

impl Resource for Work {
    const PATH: &'static str = "works";

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

impl Resource for CaseStudy {
    const PATH: &'static str = "case-studies";

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

impl Resource for ContactSubmission {
    const PATH: &'static str = "contacts";

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_page_defaults_on_sparse_record() {
        let page: Page = serde_json::from_value(json!({ "name": "about" })).unwrap();
        assert!(page.published);
        assert_eq!(page.content, Value::Null);
        assert_eq!(page.redirect_target(), None);
    }

    #[test]
    fn test_page_nulls_read_as_defaults() {
        let page: Page = serde_json::from_value(json!({
            "name": "about",
            "title": null,
            "content": { "heroTitle1": "Kept" },
            "published": null,
            "redirectTo": null,
            "updatedAt": null,
        }))
        .unwrap();
        assert_eq!(page.title, "");
        assert!(page.published);
        assert_eq!(page.redirect_to, None);
        assert_eq!(page.content["heroTitle1"], "Kept");

        let hidden: Page =
            serde_json::from_value(json!({ "name": "about", "published": false })).unwrap();
        assert!(!hidden.published);
    }

    #[test]
    fn test_blank_redirect_is_ignored() {
        let mut page = Page::new("work", "Work", json!({}));
        page.redirect_to = Some("   ".into());
        assert_eq!(page.redirect_target(), None);
        page.redirect_to = Some("/home".into());
        assert_eq!(page.redirect_target(), Some("/home"));
    }

    #[test]
    fn test_page_update_omits_absent_fields() {
        let update = PageUpdate::content(json!({ "heroTitle1": "Hi" }));
        let wire = serde_json::to_value(&update).unwrap();
        assert_eq!(wire, json!({ "content": { "heroTitle1": "Hi" } }));

        let clear = PageUpdate::visibility(true, None);
        let wire = serde_json::to_value(&clear).unwrap();
        assert_eq!(wire, json!({ "published": true, "redirectTo": null }));
    }

    #[test]
    fn test_media_type_from_path() {
        assert_eq!(MediaType::from_path("/uploads/reel.mp4"), MediaType::Video);
        assert_eq!(MediaType::from_path("/uploads/REEL.MOV"), MediaType::Video);
        assert_eq!(
            MediaType::from_path("https://cdn.example.com/a.webm?v=2#t=3"),
            MediaType::Video
        );
        assert_eq!(MediaType::from_path("/uploads/cover.png"), MediaType::Image);
        assert_eq!(MediaType::from_path("/uploads/mp4"), MediaType::Image);
        assert_eq!(MediaType::from_path(""), MediaType::Image);
    }

    #[test]
    fn test_media_type_from_mime() {
        assert_eq!(MediaType::from_mime("video/mp4"), Some(MediaType::Video));
        assert_eq!(
            MediaType::from_mime("image/png; charset=binary"),
            Some(MediaType::Image)
        );
        assert_eq!(MediaType::from_mime("application/pdf"), None);
    }

    #[test]
    fn test_role_permissions() {
        let editor = User {
            id: None,
            email: "ed@example.com".into(),
            name: "Ed".into(),
            role: Role::Editor,
            permissions: vec![Permission::ReadContacts],
            password: None,
        };
        assert!(editor.can(Permission::EditPages));
        assert!(editor.can(Permission::ReadContacts));
        assert!(!editor.can(Permission::ManageUsers));
        assert!(!editor.can(Permission::PublishPages));
    }
}
