use url::Url;

use crate::error::{ConfigError, MarqueeError};

/// Content store API configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: Url,
    pub token: Option<String>,
}

impl ApiConfig {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            token: None,
        }
    }

    /// Parse a base URL string, e.g. from a CLI flag.
    pub fn parse(base_url: &str) -> Result<Self, MarqueeError> {
        let url = Url::parse(base_url).map_err(|e| ConfigError::UrlParse {
            url: base_url.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self::new(url))
    }

    /// Load configuration from environment variables.
    ///
    /// Required env vars:
    /// - `MARQUEE_API_URL`: Base URL of the REST API (e.g. `https://cms.example.com/api`)
    ///
    /// Optional env vars:
    /// - `MARQUEE_API_TOKEN`: Bearer token sent with every request
    pub fn from_env() -> Result<Self, MarqueeError> {
        let url_str = std::env::var("MARQUEE_API_URL").map_err(|_| ConfigError::MissingEnv {
            var: "MARQUEE_API_URL",
        })?;

        let mut config = Self::parse(&url_str)?;
        config.token = std::env::var("MARQUEE_API_TOKEN")
            .ok()
            .filter(|t| !t.is_empty());
        Ok(config)
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }
}

/// Public site configuration
#[derive(Debug, Clone)]
pub struct SiteConfig {
    /// Where hidden pages without their own redirect send visitors.
    pub fallback_path: String,
    /// Site name used in page titles.
    pub site_name: String,
    /// The site's own origin. Preview messages from anywhere else are dropped.
    pub origin: Option<Url>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            fallback_path: "/".to_string(),
            site_name: "Marquee".to_string(),
            origin: None,
        }
    }
}

impl SiteConfig {
    /// Load configuration from environment variables.
    ///
    /// Optional env vars:
    /// - `MARQUEE_FALLBACK_PATH`: Redirect target for hidden pages (default: `/`)
    /// - `MARQUEE_SITE_NAME`: Site name (default: `Marquee`)
    /// - `MARQUEE_SITE_ORIGIN`: Own origin for preview messaging, e.g. `https://example.com`
    pub fn from_env() -> Result<Self, MarqueeError> {
        let defaults = Self::default();
        let fallback_path =
            std::env::var("MARQUEE_FALLBACK_PATH").unwrap_or(defaults.fallback_path);
        if !fallback_path.starts_with('/') {
            return Err(ConfigError::Invalid {
                field: "MARQUEE_FALLBACK_PATH",
                message: format!("{fallback_path:?} must be an absolute path"),
            }
            .into());
        }
        let site_name = std::env::var("MARQUEE_SITE_NAME").unwrap_or(defaults.site_name);
        let origin = match std::env::var("MARQUEE_SITE_ORIGIN") {
            Ok(origin) => Some(Url::parse(&origin).map_err(|e| ConfigError::UrlParse {
                url: origin.clone(),
                message: e.to_string(),
            })?),
            Err(_) => None,
        };
        Ok(Self {
            fallback_path,
            site_name,
            origin,
        })
    }
}
