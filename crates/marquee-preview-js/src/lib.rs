//! Runtime for pages rendered with `?editor=true`.
//!
//! The server-rendered page loads this module inside the editor's preview
//! frame. On start it reads the page name from `<body data-page>`, announces
//! itself to the parent window with `PREVIEW_READY`, repaints sections from
//! every snapshot the editor sends, and reports clicks on sections as
//! `SECTION_CLICKED`.
//!
//! Built with
//! `wasm-pack build crates/marquee-preview-js --target web --out-name preview --out-dir <assets dir>`;
//! the server serves the output under `/assets`.

#![cfg(all(target_family = "wasm", target_os = "unknown"))]

pub mod dom;

use std::cell::RefCell;
use std::rc::Rc;

use gloo_events::{EventListener, EventListenerOptions, EventListenerPhase};
use marquee_editor_core::preview::browser::{WindowPort, listen, own_origin};
use marquee_editor_core::preview::{Applied, EditorMode, EmbeddedPreview, Origin};
use marquee_renderer::PageRenderer;
use wasm_bindgen::prelude::*;

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    init_tracing();
    if let Err(err) = boot() {
        web_sys::console::warn_1(&err);
    }
}

fn init_tracing() {
    use tracing::subscriber::set_global_default;
    use tracing_subscriber::Registry;
    use tracing_subscriber::layer::SubscriberExt;

    let console_level = if cfg!(debug_assertions) {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    let wasm_layer = tracing_wasm::WASMLayer::new(
        tracing_wasm::WASMLayerConfigBuilder::new()
            .set_max_level(console_level)
            .build(),
    );
    let _ = set_global_default(Registry::default().with(wasm_layer));
}

fn boot() -> Result<(), JsValue> {
    let window = web_sys::window().ok_or("no window")?;
    let document = window.document().ok_or("no document")?;
    let body = document.body().ok_or("no <body>")?;
    let page = body
        .get_attribute("data-page")
        .ok_or("missing data-page on <body>")?;

    let mode = EditorMode::from_query(window.location().search().ok().as_deref());
    if !mode.is_embedded() {
        tracing::debug!(page = %page, "not in editor mode, preview runtime idle");
        return Ok(());
    }
    let port = WindowPort::parent().ok_or("not inside a frame")?;
    let origin = body
        .get_attribute("data-origin")
        .and_then(|origin| Origin::parse(&origin).ok())
        .or_else(own_origin)
        .ok_or("cannot determine the site origin")?;
    let renderer = PageRenderer::new("").map_err(|err| JsValue::from_str(&err.to_string()))?;

    let preview = Rc::new(RefCell::new(EmbeddedPreview::new(page, origin, mode, port)));

    let messages = {
        let preview = Rc::clone(&preview);
        let document = document.clone();
        listen(&window, move |incoming| {
            let mut preview = preview.borrow_mut();
            if preview.handle(&incoming) == Applied::Snapshot {
                dom::repaint(&document, &renderer, &*preview);
            }
        })
    };

    // Capture phase, so links inside a section never navigate the frame.
    let options = EventListenerOptions {
        phase: EventListenerPhase::Capture,
        passive: false,
    };
    let clicks = {
        let preview = Rc::clone(&preview);
        EventListener::new_with_options(&document, "click", options, move |event| {
            let Some(section_id) = dom::section_id_of(event) else {
                return;
            };
            if preview.borrow().click(&section_id) {
                event.prevent_default();
                event.stop_propagation();
            }
        })
    };
    // Both listeners live as long as the page.
    messages.forget();
    clicks.forget();

    // Listeners first: the editor answers PREVIEW_READY right away.
    preview.borrow_mut().mount();
    tracing::info!(page = preview.borrow().page(), "preview runtime mounted");
    Ok(())
}
