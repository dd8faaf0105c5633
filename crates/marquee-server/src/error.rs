use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use marquee_common::{ApiError, MarqueeError};
use marquee_renderer::RenderError;
use miette::Diagnostic;
use thiserror::Error;

/// Top-level error for the server binary
#[derive(Debug, Error, Diagnostic)]
pub enum AppError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Server(#[from] ServerError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] MarqueeError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Render(#[from] RenderError),
}

/// HTTP server errors
#[derive(Debug, Error, Diagnostic)]
pub enum ServerError {
    #[error("failed to bind to {addr}")]
    #[diagnostic(code(server::bind))]
    Bind {
        addr: std::net::SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid listen address {addr}")]
    #[diagnostic(code(server::addr), help("Check SERVER_HOST and SERVER_PORT"))]
    Addr {
        addr: String,
        #[source]
        source: std::net::AddrParseError,
    },

    #[error("server terminated unexpectedly")]
    #[diagnostic(code(server::serve))]
    Serve {
        #[source]
        source: std::io::Error,
    },
}

/// Errors a request handler can answer with.
#[derive(Debug, Error)]
pub enum RouteError {
    #[error("page not found")]
    NotFound,

    #[error("{0}")]
    Invalid(String),

    #[error("contact forwarding failed")]
    Upstream(#[source] ApiError),

    #[error(transparent)]
    Render(#[from] RenderError),
}

impl IntoResponse for RouteError {
    fn into_response(self) -> Response {
        let status = match &self {
            RouteError::NotFound => StatusCode::NOT_FOUND,
            RouteError::Invalid(_) => StatusCode::UNPROCESSABLE_ENTITY,
            RouteError::Upstream(_) => StatusCode::BAD_GATEWAY,
            RouteError::Render(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(error = ?self, "request failed");
        }
        (status, self.to_string()).into_response()
    }
}
