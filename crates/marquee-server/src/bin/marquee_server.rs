use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use marquee_common::{ApiClient, ApiConfig, ContentStore, MemoryContentStore, SiteConfig};
use marquee_renderer::PageRenderer;
use marquee_server::server::{AppState, ServerConfig, TelemetryConfig, telemetry};
use marquee_server::AppError;
use tracing::{info, warn};
use url::Url;

#[derive(Parser)]
#[command(name = "marquee-server")]
#[command(about = "Marquee public site, with the editor preview mode")]
struct Args {
    /// Listen host (overrides SERVER_HOST)
    #[arg(long)]
    host: Option<String>,

    /// Listen port (overrides SERVER_PORT)
    #[arg(long)]
    port: Option<u16>,

    /// Content API base URL
    #[arg(long, env = "MARQUEE_API_URL")]
    api_url: Option<String>,

    /// The site's own origin, handed to the preview runtime
    #[arg(long)]
    site_origin: Option<Url>,

    /// Serve from an empty in-memory store instead of the content API
    #[arg(long, conflicts_with = "api_url")]
    memory: bool,

    /// URL of the preview runtime module
    #[arg(long)]
    bootstrap_src: Option<String>,

    /// Directory served under /assets (wasm-pack output of marquee-preview-js)
    #[arg(long, env = "MARQUEE_ASSETS_DIR")]
    assets_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    dotenvy::dotenv().ok();

    telemetry::init(TelemetryConfig::from_env("marquee-server"));

    let args = Args::parse();

    let mut server_config = ServerConfig::from_env();
    if let Some(host) = args.host {
        server_config.host = host;
    }
    if let Some(port) = args.port {
        server_config.port = port;
    }

    let mut site = SiteConfig::from_env().map_err(AppError::from)?;
    if args.site_origin.is_some() {
        site.origin = args.site_origin;
    }

    let mut renderer = PageRenderer::new(site.site_name.clone()).map_err(AppError::from)?;
    if let Some(src) = args.bootstrap_src {
        renderer = renderer.with_bootstrap_src(src);
    }

    let state = match (args.memory, args.api_url) {
        (false, Some(url)) => {
            let client = ApiClient::new(ApiConfig::parse(&url).map_err(AppError::from)?);
            info!("Serving content from {}", client.base_url());
            let store: Arc<dyn ContentStore> = Arc::new(client.clone());
            AppState::new(store, renderer, site).with_contacts(client)
        }
        (memory, _) => {
            if !memory {
                warn!("MARQUEE_API_URL not set, serving built-in defaults from memory");
            }
            let store: Arc<dyn ContentStore> = Arc::new(MemoryContentStore::new());
            AppState::new(store, renderer, site)
        }
    };

    let state = match args.assets_dir {
        Some(dir) => state.with_assets_dir(dir),
        None => state,
    };
    if !state.assets_dir.join("preview.js").is_file() {
        warn!(
            dir = %state.assets_dir.display(),
            "preview runtime not built, editor preview will not sync"
        );
    }

    marquee_server::run(state, server_config)
        .await
        .map_err(AppError::from)?;

    Ok(())
}
