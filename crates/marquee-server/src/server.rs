use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::{Path, RawQuery, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use marquee_common::{ApiClient, ContactSubmission, ContentStore, SiteConfig};
use marquee_editor_core::preview::EditorMode;
use marquee_editor_core::{is_known_page, page_defaults};
use marquee_renderer::{PageRenderer, RenderOptions, resolve_page};
use serde::Serialize;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::{RouteError, ServerError};

pub use marquee_common::telemetry::{self, TelemetryConfig};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ContentStore>,
    pub renderer: Arc<PageRenderer>,
    pub site: Arc<SiteConfig>,
    /// Where contact form submissions go. `None` in memory mode: they are
    /// only logged.
    pub contacts: Option<ApiClient>,
    /// Served under `/assets`; holds the built preview runtime.
    pub assets_dir: PathBuf,
}

/// Default location of static assets, relative to the working directory.
pub const DEFAULT_ASSETS_DIR: &str = "assets";

impl AppState {
    pub fn new(store: Arc<dyn ContentStore>, renderer: PageRenderer, site: SiteConfig) -> Self {
        Self {
            store,
            renderer: Arc::new(renderer),
            site: Arc::new(site),
            contacts: None,
            assets_dir: PathBuf::from(DEFAULT_ASSETS_DIR),
        }
    }

    pub fn with_assets_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.assets_dir = dir.into();
        self
    }

    pub fn with_contacts(mut self, client: ApiClient) -> Self {
        self.contacts = Some(client);
        self
    }
}

/// Build the axum router
pub fn router(state: AppState) -> Router {
    let assets = ServeDir::new(&state.assets_dir);
    Router::new()
        .nest_service("/assets", assets)
        .route("/", get(home))
        .route("/_health", get(health))
        .route("/contact", post(submit_contact))
        .route("/{page}", get(page))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

async fn health() -> impl IntoResponse {
    Json(HealthResponse { status: "ok" })
}

async fn home(state: State<AppState>, query: RawQuery) -> Result<Response, RouteError> {
    render_page(&state, "home", query.0.as_deref()).await
}

async fn page(
    state: State<AppState>,
    Path(name): Path<String>,
    query: RawQuery,
) -> Result<Response, RouteError> {
    render_page(&state, &name, query.0.as_deref()).await
}

async fn render_page(state: &AppState, name: &str, query: Option<&str>) -> Result<Response, RouteError> {
    if !is_known_page(name) {
        return Err(RouteError::NotFound);
    }
    let mode = EditorMode::from_query(query);
    let origin = state.site.origin.as_ref().map(|o| o.origin().ascii_serialization());

    if mode.is_embedded() {
        // The editor pushes the real content over postMessage; defaults are
        // only the first paint.
        let mut options = RenderOptions::embedded(None);
        if let Some(origin) = origin.as_deref() {
            options = options.with_origin(origin);
        }
        let html = state.renderer.render(name, &page_defaults(name), &options)?;
        return Ok(Html(html).into_response());
    }

    let resolution = resolve_page(state.store.as_ref(), name, mode, &state.site.fallback_path).await;
    if !resolution.visibility.show {
        let target = resolution
            .visibility
            .redirect_to
            .as_deref()
            .unwrap_or(&state.site.fallback_path);
        info!(page = name, to = target, "page hidden, redirecting");
        return Ok(Redirect::to(target).into_response());
    }
    let html = state
        .renderer
        .render(name, &resolution.content, &RenderOptions::standalone())?;
    Ok(Html(html).into_response())
}

async fn submit_contact(
    State(state): State<AppState>,
    Json(submission): Json<ContactSubmission>,
) -> Result<Response, RouteError> {
    validate_contact(&submission)?;
    match &state.contacts {
        Some(client) => {
            let saved = client
                .submit_contact(&submission)
                .await
                .map_err(RouteError::Upstream)?;
            Ok((StatusCode::CREATED, Json(saved)).into_response())
        }
        None => {
            info!(email = %submission.email, "contact submission (not forwarded)");
            Ok(StatusCode::ACCEPTED.into_response())
        }
    }
}

fn validate_contact(submission: &ContactSubmission) -> Result<(), RouteError> {
    let required = [
        ("name", &submission.name),
        ("email", &submission.email),
        ("message", &submission.message),
    ];
    if let Some((field, _)) = required.iter().find(|(_, v)| v.trim().is_empty()) {
        return Err(RouteError::Invalid(format!("{field} is required")));
    }
    if !submission.email.contains('@') {
        return Err(RouteError::Invalid("email is not valid".into()));
    }
    Ok(())
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let host = std::env::var("SERVER_HOST").unwrap_or(defaults.host);
        let port = std::env::var("SERVER_PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.port);

        Self { host, port }
    }

    pub fn addr(&self) -> Result<SocketAddr, ServerError> {
        let addr = format!("{}:{}", self.host, self.port);
        addr.parse()
            .map_err(|source| ServerError::Addr { addr, source })
    }
}

/// Run the HTTP server
pub async fn run(state: AppState, config: ServerConfig) -> Result<(), ServerError> {
    let addr = config.addr()?;
    let app = router(state);

    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ServerError::Bind { addr, source: e })?;

    axum::serve(listener, app)
        .await
        .map_err(|e| ServerError::Serve { source: e })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, header};
    use marquee_common::{ApiConfig, MemoryContentStore, Page, PageUpdate};
    use serde_json::json;
    use tower::ServiceExt;

    fn state(store: Arc<MemoryContentStore>) -> AppState {
        AppState::new(store, PageRenderer::new("Studio").unwrap(), SiteConfig::default())
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, Option<String>, String) {
        let response = app
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let location = response
            .headers()
            .get(header::LOCATION)
            .map(|v| v.to_str().unwrap().to_string());
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, location, String::from_utf8(body.to_vec()).unwrap())
    }

    fn hidden_page(name: &str, redirect: Option<&str>) -> Page {
        let mut page = Page::new(name, name, json!({}));
        page.apply(&PageUpdate::visibility(false, redirect.map(String::from)));
        page
    }

    #[tokio::test]
    async fn test_renders_stored_content() {
        let store = Arc::new(MemoryContentStore::with_pages([Page::new(
            "about",
            "About",
            json!({ "heroTitle1": "Stored title" }),
        )]));
        let (status, _, body) = get(router(state(store)), "/about").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Stored title"));
        assert!(!body.contains("section-badge"));
    }

    #[tokio::test]
    async fn test_hidden_page_redirects() {
        let store = Arc::new(MemoryContentStore::with_pages([hidden_page("shopify", Some("/work"))]));
        let (status, location, _) = get(router(state(store)), "/shopify").await;
        assert_eq!(status, StatusCode::SEE_OTHER);
        assert_eq!(location.as_deref(), Some("/work"));
    }

    #[tokio::test]
    async fn test_hidden_page_without_target_uses_fallback() {
        let store = Arc::new(MemoryContentStore::with_pages([hidden_page("work", None)]));
        let (status, location, _) = get(router(state(store)), "/work").await;
        assert_eq!(status, StatusCode::SEE_OTHER);
        assert_eq!(location.as_deref(), Some("/"));
    }

    #[tokio::test]
    async fn test_editor_mode_skips_store() {
        let store = Arc::new(MemoryContentStore::with_pages([hidden_page("shopify", Some("/work"))]));
        let (status, _, body) = get(router(state(store.clone())), "/shopify?editor=true").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("section-badge"));
        assert!(body.contains(r#"import init from "/assets/preview.js""#));
        assert!(!body.contains(r#"data-origin="""#));
        assert_eq!(store.get_count(), 0);
    }

    #[tokio::test]
    async fn test_store_down_still_serves_defaults() {
        let store = Arc::new(MemoryContentStore::new());
        store.set_unavailable(true);
        let (status, _, body) = get(router(state(store)), "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Stories worth watching"));
    }

    #[tokio::test]
    async fn test_unknown_page_is_404() {
        let store = Arc::new(MemoryContentStore::new());
        let (status, _, _) = get(router(state(store)), "/blog").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_serves_preview_runtime() {
        let dir = std::env::temp_dir().join(format!("marquee-assets-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("preview.js"), "export default function init() {}").unwrap();

        let store = Arc::new(MemoryContentStore::new());
        let app = router(state(store).with_assets_dir(&dir));
        let (status, _, body) = get(app.clone(), marquee_renderer::DEFAULT_BOOTSTRAP_SRC).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.starts_with("export default"));

        let (status, _, _) = get(app, "/assets/missing.wasm").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_health() {
        let store = Arc::new(MemoryContentStore::new());
        let (status, _, body) = get(router(state(store)), "/_health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, r#"{"status":"ok"}"#);
    }

    fn contact_request(body: serde_json::Value) -> Request<Body> {
        Request::post("/contact")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_contact_validation() {
        let app = router(state(Arc::new(MemoryContentStore::new())));
        let response = app
            .oneshot(contact_request(json!({ "name": "", "email": "a@b.c", "message": "hi" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_contact_accepted_without_api() {
        let app = router(state(Arc::new(MemoryContentStore::new())));
        let response = app
            .oneshot(contact_request(json!({ "name": "Kim", "email": "kim@example.com", "message": "Hello" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }

    #[tokio::test]
    async fn test_contact_forwarded_to_api() {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let api = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/contacts"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": "c1", "name": "Kim", "email": "kim@example.com", "message": "Hello"
            })))
            .expect(1)
            .mount(&api)
            .await;

        let client = ApiClient::new(ApiConfig::parse(&api.uri()).unwrap());
        let app = router(state(Arc::new(MemoryContentStore::new())).with_contacts(client));
        let response = app
            .oneshot(contact_request(json!({ "name": "Kim", "email": "kim@example.com", "message": "Hello" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }
}
