pub mod error;
pub mod server;

pub use error::{AppError, RouteError, ServerError};
pub use server::{AppState, ServerConfig, router, run};
