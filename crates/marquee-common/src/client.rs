//! HTTP client for the content store REST API.
//!
//! `ApiClient` is an explicit session object: it carries the bearer token and
//! an optional callback invoked when the API answers 401. Callers that must
//! not trigger the callback (logging in, probing a token) pass
//! [`RequestOptions::skip_unauthorized_hook`].

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use bytes::Bytes;
use mime_sniffer::MimeTypeSniffer;
use reqwest::{Method, RequestBuilder, Response, StatusCode, multipart};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::ApiConfig;
use crate::error::ApiError;
use crate::model::{ContactSubmission, Page, PageUpdate, Resource, Session, UploadedFile, User};
use crate::store::{ContentStore, classify_upload};

/// Callback fired when a request is rejected as unauthorized.
pub type UnauthorizedHook = Arc<dyn Fn() + Send + Sync>;

/// Per-request knobs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestOptions {
    /// Do not clear the token or run the unauthorized callback on a 401.
    pub skip_unauthorized_hook: bool,
}

impl RequestOptions {
    pub const SKIP_UNAUTHORIZED_HOOK: Self = Self {
        skip_unauthorized_hook: true,
    };
}

struct ClientInner {
    http: reqwest::Client,
    base_url: Url,
    token: RwLock<Option<String>>,
    on_unauthorized: Option<UnauthorizedHook>,
}

#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ClientInner>,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url.as_str())
            .field("authenticated", &self.token().is_some())
            .finish()
    }
}

/// Upload responses come in two shapes depending on the backend version.
#[derive(Deserialize)]
#[serde(untagged)]
enum UploadResponse {
    Flat(UploadData),
    Nested { data: UploadData },
}

#[derive(Deserialize)]
struct UploadData {
    path: String,
    #[serde(default, rename = "mimeType", alias = "mimetype")]
    mime_type: Option<String>,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

impl ApiClient {
    pub fn new(config: ApiConfig) -> Self {
        Self::build(config, None)
    }

    /// Create a client that runs `hook` whenever the API answers 401.
    pub fn with_unauthorized_hook(
        config: ApiConfig,
        hook: impl Fn() + Send + Sync + 'static,
    ) -> Self {
        Self::build(config, Some(Arc::new(hook)))
    }

    fn build(config: ApiConfig, on_unauthorized: Option<UnauthorizedHook>) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                http: reqwest::Client::new(),
                base_url: config.base_url,
                token: RwLock::new(config.token),
                on_unauthorized,
            }),
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    pub fn token(&self) -> Option<String> {
        self.inner
            .token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set_token(&self, token: impl Into<String>) {
        *self
            .inner
            .token
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(token.into());
    }

    pub fn clear_token(&self) {
        *self
            .inner
            .token
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        let base = self.inner.base_url.as_str().trim_end_matches('/');
        let joined = format!("{}/{}", base, path.trim_start_matches('/'));
        Url::parse(&joined).map_err(|e| ApiError::InvalidUrl {
            path: path.to_string(),
            message: e.to_string(),
        })
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ApiError> {
        let url = self.endpoint(path)?;
        let mut request = self.inner.http.request(method, url);
        if let Some(token) = self.token() {
            request = request.bearer_auth(token);
        }
        Ok(request)
    }

    fn handle_unauthorized(&self, path: &str, options: RequestOptions) {
        if options.skip_unauthorized_hook {
            tracing::debug!(path, "401 with unauthorized hook skipped");
            return;
        }
        tracing::warn!(path, "session rejected, clearing token");
        self.clear_token();
        if let Some(hook) = &self.inner.on_unauthorized {
            hook();
        }
    }

    async fn execute(
        &self,
        request: RequestBuilder,
        path: &str,
        options: RequestOptions,
    ) -> Result<Response, ApiError> {
        let response = request.send().await.map_err(|source| ApiError::Transport {
            path: path.to_string(),
            source,
        })?;

        let status = response.status();
        match status {
            StatusCode::UNAUTHORIZED => {
                self.handle_unauthorized(path, options);
                Err(ApiError::Unauthorized {
                    path: path.to_string(),
                })
            }
            StatusCode::NOT_FOUND => Err(ApiError::NotFound {
                resource: path.to_string(),
            }),
            s if !s.is_success() => {
                let message = response.text().await.unwrap_or_default();
                Err(ApiError::Status {
                    path: path.to_string(),
                    status: s.as_u16(),
                    message,
                })
            }
            _ => Ok(response),
        }
    }

    async fn decode<T: DeserializeOwned>(response: Response, path: &str) -> Result<T, ApiError> {
        let body = response.bytes().await.map_err(|source| ApiError::Transport {
            path: path.to_string(),
            source,
        })?;
        serde_json::from_slice(&body).map_err(|e| ApiError::Decode {
            path: path.to_string(),
            message: e.to_string(),
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<T, ApiError> {
        let request = self.request(Method::GET, path)?;
        let response = self.execute(request, path, options).await?;
        Self::decode(response, path).await
    }

    async fn send_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &B,
        options: RequestOptions,
    ) -> Result<T, ApiError> {
        let request = self.request(method, path)?.json(body);
        let response = self.execute(request, path, options).await?;
        Self::decode(response, path).await
    }

    async fn delete_path(&self, path: &str) -> Result<(), ApiError> {
        let request = self.request(Method::DELETE, path)?;
        self.execute(request, path, RequestOptions::default())
            .await?;
        Ok(())
    }

    // ---- pages ----

    pub async fn list_pages(&self) -> Result<Vec<Page>, ApiError> {
        self.get_json("pages", RequestOptions::default()).await
    }

    pub async fn get_page(&self, name: &str) -> Result<Page, ApiError> {
        self.get_json(&format!("pages/{name}"), RequestOptions::default())
            .await
    }

    pub async fn put_page(&self, name: &str, update: &PageUpdate) -> Result<Page, ApiError> {
        self.send_json(
            Method::PUT,
            &format!("pages/{name}"),
            update,
            RequestOptions::default(),
        )
        .await
    }

    /// Write `content` to a page, creating the page if the store reports it
    /// does not exist yet.
    pub async fn upsert_page(
        &self,
        name: &str,
        title: &str,
        content: serde_json::Value,
    ) -> Result<Page, ApiError> {
        match self.put_page(name, &PageUpdate::content(content.clone())).await {
            Err(e) if e.is_not_found() => {
                tracing::info!(page = name, "page missing, creating it");
                self.put_page(name, &PageUpdate::create(name, title, content))
                    .await
            }
            other => other,
        }
    }

    /// Upload a file as multipart field `image`.
    pub async fn upload(&self, file_name: &str, data: Bytes) -> Result<UploadedFile, ApiError> {
        let path = "upload";
        let mime = data
            .sniff_mime_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let part = multipart::Part::bytes(data.to_vec())
            .file_name(file_name.to_string())
            .mime_str(&mime)
            .map_err(|source| ApiError::Transport {
                path: path.to_string(),
                source,
            })?;
        let form = multipart::Form::new().part("image", part);

        let request = self.request(Method::POST, path)?.multipart(form);
        let response = self
            .execute(request, path, RequestOptions::default())
            .await?;
        let body = response.bytes().await.map_err(|source| ApiError::Transport {
            path: path.to_string(),
            source,
        })?;
        let upload = match serde_json::from_slice::<UploadResponse>(&body) {
            Ok(UploadResponse::Flat(upload)) | Ok(UploadResponse::Nested { data: upload }) => upload,
            Err(_) => return Err(ApiError::UploadShape),
        };

        let media_type = classify_upload(upload.mime_type.as_deref(), file_name, &data);
        Ok(UploadedFile {
            path: upload.path,
            media_type,
        })
    }

    // ---- accounts ----

    /// Exchange credentials for a token. The token is stored on success.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, ApiError> {
        let session: Session = self
            .send_json(
                Method::POST,
                "auth/login",
                &LoginRequest { email, password },
                RequestOptions::SKIP_UNAUTHORIZED_HOOK,
            )
            .await?;
        self.set_token(session.token.clone());
        Ok(session)
    }

    /// The account the current token belongs to.
    pub async fn me(&self) -> Result<User, ApiError> {
        self.get_json("auth/me", RequestOptions::default()).await
    }

    // ---- generic collections ----

    pub async fn list<R: Resource>(&self) -> Result<Vec<R>, ApiError> {
        self.get_json(R::PATH, RequestOptions::default()).await
    }

    pub async fn get<R: Resource>(&self, id: &str) -> Result<R, ApiError> {
        self.get_json(&format!("{}/{id}", R::PATH), RequestOptions::default())
            .await
    }

    pub async fn create<R: Resource>(&self, record: &R) -> Result<R, ApiError> {
        self.send_json(Method::POST, R::PATH, record, RequestOptions::default())
            .await
    }

    pub async fn update<R: Resource>(&self, record: &R) -> Result<R, ApiError> {
        let id = record.id().ok_or_else(|| ApiError::InvalidUrl {
            path: R::PATH.to_string(),
            message: "record has no id".to_string(),
        })?;
        let path = format!("{}/{id}", R::PATH);
        self.send_json(Method::PUT, &path, record, RequestOptions::default())
            .await
    }

    pub async fn delete<R: Resource>(&self, id: &str) -> Result<(), ApiError> {
        self.delete_path(&format!("{}/{id}", R::PATH)).await
    }

    /// Public contact form submission. Does not require a session.
    pub async fn submit_contact(
        &self,
        submission: &ContactSubmission,
    ) -> Result<ContactSubmission, ApiError> {
        self.send_json(
            Method::POST,
            ContactSubmission::PATH,
            submission,
            RequestOptions::SKIP_UNAUTHORIZED_HOOK,
        )
        .await
    }
}

#[async_trait]
impl ContentStore for ApiClient {
    async fn list_pages(&self) -> Result<Vec<Page>, ApiError> {
        ApiClient::list_pages(self).await
    }

    async fn get_page(&self, name: &str) -> Result<Page, ApiError> {
        ApiClient::get_page(self, name).await
    }

    async fn put_page(&self, name: &str, update: &PageUpdate) -> Result<Page, ApiError> {
        ApiClient::put_page(self, name, update).await
    }

    async fn upload(&self, file_name: &str, data: Bytes) -> Result<UploadedFile, ApiError> {
        ApiClient::upload(self, file_name, data).await
    }
}
