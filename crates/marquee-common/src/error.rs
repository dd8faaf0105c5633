use miette::Diagnostic;
use thiserror::Error;

/// Top-level error type for marquee operations
#[derive(Debug, Error, Diagnostic)]
pub enum MarqueeError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    /// Serialization/deserialization error
    #[error(transparent)]
    #[diagnostic(code(marquee::serde))]
    Serde(#[from] serde_json::Error),
}

/// Errors talking to the content store REST API
#[derive(Debug, Error, Diagnostic)]
pub enum ApiError {
    #[error("{resource} not found")]
    #[diagnostic(code(api::not_found))]
    NotFound { resource: String },

    #[error("request to {path} was rejected as unauthorized")]
    #[diagnostic(
        code(api::unauthorized),
        help("Log in again or set MARQUEE_API_TOKEN to a valid token")
    )]
    Unauthorized { path: String },

    #[error("{path} failed with status {status}: {message}")]
    #[diagnostic(code(api::status))]
    Status {
        path: String,
        status: u16,
        message: String,
    },

    #[cfg(feature = "http")]
    #[error("request to {path} failed")]
    #[diagnostic(code(api::transport))]
    Transport {
        path: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("content store unavailable: {message}")]
    #[diagnostic(code(api::unavailable))]
    Unavailable { message: String },

    #[error("failed to decode response from {path}: {message}")]
    #[diagnostic(code(api::decode))]
    Decode { path: String, message: String },

    #[error("invalid request url for {path}: {message}")]
    #[diagnostic(code(api::url))]
    InvalidUrl { path: String, message: String },

    #[error("upload response did not contain a file path")]
    #[diagnostic(
        code(api::upload_shape),
        help("Expected either {{\"path\": ...}} or {{\"data\": {{\"path\": ...}}}}")
    )]
    UploadShape,
}

impl ApiError {
    /// True for a 404 from the store (the record does not exist).
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound { .. })
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized { .. })
    }
}

/// Configuration errors
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("missing required environment variable: {var}")]
    #[diagnostic(
        code(config::missing_env),
        help("Set the {var} environment variable or add it to your .env file")
    )]
    MissingEnv { var: &'static str },

    #[error("invalid configuration value for {field}: {message}")]
    #[diagnostic(code(config::invalid))]
    Invalid { field: &'static str, message: String },

    #[error("failed to parse URL: {url}")]
    #[diagnostic(code(config::url_parse))]
    UrlParse { url: String, message: String },
}

pub type Result<T> = std::result::Result<T, MarqueeError>;
