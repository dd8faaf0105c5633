//! Live preview synchronization between the editor and its preview frame.
//!
//! The editor side is [`PreviewHost`]; the framed page is
//! [`EmbeddedPreview`]. Transport is abstracted behind [`PreviewPort`] so the
//! same logic runs over `window.postMessage` in the browser and over channels
//! natively.

pub mod debounce;
pub mod embedded;
pub mod host;
pub mod protocol;

#[cfg(not(all(target_family = "wasm", target_os = "unknown")))]
pub mod driver;

#[cfg(all(target_family = "wasm", target_os = "unknown"))]
pub mod browser;

pub use debounce::{Debouncer, EDITOR_UPDATE_DEBOUNCE};
pub use embedded::{Applied, EditorMode, EmbeddedPreview, PreviewState};
pub use host::{Handled, INIT_FALLBACK, PreviewHost};
pub use protocol::{
    ChannelPort, Envelope, HostMessage, IncomingMessage, Origin, PreviewMessage, PreviewPayload,
    PreviewPort, Rejected,
};

#[cfg(not(all(target_family = "wasm", target_os = "unknown")))]
pub use driver::{SharedSession, run_host};
