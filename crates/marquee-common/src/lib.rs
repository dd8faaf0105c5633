//! marquee-common: shared types for the marquee site and editor.
//!
//! - `model` - page, upload and admin records as they travel over the wire
//! - `store` - the `ContentStore` contract plus an in-memory implementation
//! - `client` - `ApiClient`, the REST implementation (feature `http`)
//! - `config`, `error`, `telemetry` - ambient plumbing for the binaries

pub mod config;
pub mod error;
pub mod model;
pub mod store;

#[cfg(feature = "http")]
pub mod client;

#[cfg(feature = "telemetry")]
pub mod telemetry;

pub use smol_str::SmolStr;

#[cfg(feature = "http")]
pub use client::{ApiClient, RequestOptions};
pub use config::{ApiConfig, SiteConfig};
pub use error::{ApiError, ConfigError, MarqueeError, Result};
pub use model::{
    CaseStudy, ContactSubmission, MediaType, Page, PageUpdate, Permission, Resource, Role,
    Session, UploadedFile, User, Work,
};
pub use store::{ContentStore, MemoryContentStore};
