//! `window.postMessage` bindings for the preview protocol.

use gloo_events::EventListener;
use serde::Serialize;
use serde_json::Value;
use wasm_bindgen::JsCast;
use web_sys::{MessageEvent, Window};

use super::protocol::{IncomingMessage, Origin, PreviewPort};

/// Posts to another window, typically `window.parent` from inside the
/// preview frame.
#[derive(Debug, Clone)]
pub struct WindowPort {
    target: Window,
}

impl WindowPort {
    pub fn new(target: Window) -> Self {
        Self { target }
    }

    /// Port to the embedding window, when running inside a frame.
    pub fn parent() -> Option<Self> {
        let window = web_sys::window()?;
        let parent = window.parent().ok().flatten()?;
        Some(Self::new(parent))
    }
}

impl<M: Serialize> PreviewPort<M> for WindowPort {
    fn post(&self, message: &M, target: &Origin) {
        // Plain objects rather than JS Maps, so the other side can read them.
        let serializer = serde_wasm_bindgen::Serializer::json_compatible();
        let value = match message.serialize(&serializer) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(error = %err, "failed to encode preview message");
                return;
            }
        };
        if let Err(err) = self.target.post_message(&value, target.as_str()) {
            tracing::warn!(error = ?err, "postMessage failed");
        }
    }
}

/// This page's own origin.
pub fn own_origin() -> Option<Origin> {
    let origin = web_sys::window()?.location().origin().ok()?;
    Origin::parse(&origin).ok()
}

/// Listen for `message` events on `window`. Origin filtering happens when the
/// handler calls [`IncomingMessage::accept`]. Dropping the listener
/// unregisters it.
pub fn listen(window: &Window, mut handler: impl FnMut(IncomingMessage) + 'static) -> EventListener {
    EventListener::new(window, "message", move |event| {
        let Some(event) = event.dyn_ref::<MessageEvent>() else {
            return;
        };
        let data: Value = match serde_wasm_bindgen::from_value(event.data()) {
            Ok(data) => data,
            Err(err) => {
                tracing::debug!(error = %err, "ignoring undecodable message");
                return;
            }
        };
        handler(IncomingMessage::new(event.origin(), data));
    })
}
