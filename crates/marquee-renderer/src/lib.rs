//! marquee-renderer: public page HTML and the page visibility gate.

pub mod error;
pub mod gate;
pub mod render;

pub use error::{RenderError, Result};
pub use gate::{Resolution, Visibility, check_visibility, resolve_page};
pub use render::{DEFAULT_BOOTSTRAP_SRC, PageRenderer, RenderOptions};
