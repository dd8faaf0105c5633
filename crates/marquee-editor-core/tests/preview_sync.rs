use std::time::Duration;

use marquee_editor_core::EditorSession;
use marquee_editor_core::preview::{
    ChannelPort, EditorMode, EmbeddedPreview, HostMessage, INIT_FALLBACK, IncomingMessage, Origin,
    PreviewHost, PreviewMessage, PreviewState, SharedSession, run_host,
};
use serde_json::json;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tokio::task::JoinHandle;
use tokio::time::Instant;

const SITE: &str = "https://site.example";

struct Harness {
    session: SharedSession,
    to_host: UnboundedSender<IncomingMessage>,
    frame_loaded: UnboundedSender<()>,
    to_preview: UnboundedReceiver<IncomingMessage>,
    task: JoinHandle<()>,
}

impl Harness {
    fn start(page: &str) -> Self {
        let origin = Origin::parse(SITE).unwrap();
        let (preview_tx, to_preview) = unbounded_channel();
        let port = ChannelPort::new(origin.clone(), origin.clone(), preview_tx);
        let host = PreviewHost::<_, Instant>::new(origin, port);
        let session = SharedSession::new(EditorSession::with_defaults(page));
        let (to_host, inbound) = unbounded_channel();
        let (frame_loaded, frames) = unbounded_channel();
        let task = tokio::spawn(run_host(host, session.clone(), inbound, frames));
        Self {
            session,
            to_host,
            frame_loaded,
            to_preview,
            task,
        }
    }

    fn sent(&mut self) -> Vec<HostMessage> {
        let origin = Origin::parse(SITE).unwrap();
        let mut out = Vec::new();
        while let Ok(incoming) = self.to_preview.try_recv() {
            out.push(incoming.accept::<HostMessage>(&origin).unwrap().message);
        }
        out
    }

    async fn stop(self) {
        drop(self.to_host);
        self.task.await.unwrap();
    }
}

async fn settle(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

#[tokio::test(start_paused = true)]
async fn test_preview_ready_gets_init_with_current_draft() {
    let mut h = Harness::start("about");
    h.session
        .edit(|s| s.update_field("heroTitle1", json!("Edited")))
        .await;
    h.to_host
        .send(IncomingMessage::new(SITE, json!({ "type": "PREVIEW_READY" })))
        .unwrap();
    settle(1).await;

    let sent = h.sent();
    assert_eq!(sent.len(), 1);
    let HostMessage::EditorInit { payload } = &sent[0] else {
        panic!("expected EDITOR_INIT, got {:?}", sent[0]);
    };
    assert_eq!(payload.data.text("heroTitle1"), "Edited");
    assert_eq!(payload.section, None);
    h.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_rapid_edits_coalesce_into_one_update() {
    let mut h = Harness::start("about");
    for title in ["W", "We", "Wel", "Welc", "Welcome"] {
        h.session
            .edit(|s| s.update_field("heroTitle1", json!(title)))
            .await;
        tokio::time::advance(Duration::from_millis(20)).await;
    }
    settle(1_000).await;

    let sent = h.sent();
    assert_eq!(sent.len(), 1, "{sent:?}");
    let HostMessage::EditorUpdate { payload } = &sent[0] else {
        panic!("expected EDITOR_UPDATE");
    };
    assert_eq!(payload.data.text("heroTitle1"), "Welcome");
    h.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_no_update_before_debounce_elapses() {
    let mut h = Harness::start("work");
    h.session
        .edit(|s| s.update_field("heroTitle", json!("x")))
        .await;
    settle(50).await;
    assert!(h.sent().is_empty());
    settle(200).await;
    assert_eq!(h.sent().len(), 1);
    h.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_section_click_round_trip() {
    let mut h = Harness::start("about");
    h.to_host
        .send(IncomingMessage::new(
            SITE,
            json!({ "type": "SECTION_CLICKED", "sectionId": "story" }),
        ))
        .unwrap();
    settle(1).await;
    assert_eq!(
        h.session.read(|s| s.selected_section().map(String::from)).await,
        Some("story".to_string())
    );

    settle(500).await;
    let sent = h.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].payload().section.as_deref(), Some("story"));
    h.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_foreign_origin_messages_are_dropped() {
    let mut h = Harness::start("about");
    h.to_host
        .send(IncomingMessage::new(
            "https://evil.example",
            json!({ "type": "SECTION_CLICKED", "sectionId": "hero" }),
        ))
        .unwrap();
    h.to_host
        .send(IncomingMessage::new(
            "https://evil.example",
            json!({ "type": "PREVIEW_READY" }),
        ))
        .unwrap();
    settle(1_000).await;

    assert!(h.sent().is_empty());
    assert!(h.session.read(|s| s.selected_section().is_none()).await);
    h.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_frame_load_fallback_sends_init() {
    let mut h = Harness::start("contact");
    h.frame_loaded.send(()).unwrap();
    settle(1).await;
    let sent = h.sent();
    assert!(matches!(sent.as_slice(), [HostMessage::EditorInit { .. }]));
    h.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_init_sent_without_ready_or_load() {
    let mut h = Harness::start("shopify");
    settle(INIT_FALLBACK.as_millis() as u64 - 1).await;
    assert!(h.sent().is_empty());

    settle(2).await;
    let sent = h.sent();
    assert!(matches!(sent.as_slice(), [HostMessage::EditorInit { .. }]), "{sent:?}");

    // Not re-armed once the snapshot has gone out.
    settle(10_000).await;
    assert!(h.sent().is_empty());
    h.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_ready_cancels_init_fallback() {
    let mut h = Harness::start("about");
    h.to_host
        .send(IncomingMessage::new(SITE, json!({ "type": "PREVIEW_READY" })))
        .unwrap();
    settle(10_000).await;
    assert_eq!(h.sent().len(), 1);
    h.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_embedded_preview_follows_editor() {
    let origin = Origin::parse(SITE).unwrap();
    let mut h = Harness::start("about");

    // The preview posts straight into the host's inbound channel.
    let (ready_tx, mut ready_rx) = unbounded_channel();
    let preview_port = ChannelPort::new(origin.clone(), origin.clone(), ready_tx);
    let mut preview = EmbeddedPreview::new("about", origin.clone(), EditorMode::Embedded, preview_port);
    preview.mount();
    let ready = ready_rx.try_recv().unwrap();
    assert_eq!(
        ready.accept::<PreviewMessage>(&origin).unwrap().message,
        PreviewMessage::PreviewReady
    );
    h.to_host.send(ready).unwrap();
    settle(1).await;

    let init = h.to_preview.try_recv().unwrap();
    preview.handle(&init);
    assert_eq!(preview.state(), PreviewState::Synced);
    let draft = h.session.read(|s| s.draft().clone()).await;
    assert_eq!(preview.content(), &draft);

    // Click in the preview, edit in the editor; the next update carries both.
    assert!(preview.click("cta"));
    h.to_host.send(ready_rx.try_recv().unwrap()).unwrap();
    settle(1).await;
    h.session
        .edit(|s| s.update_field("ctaTitle", json!("Talk to us")))
        .await;
    settle(500).await;

    while let Ok(update) = h.to_preview.try_recv() {
        preview.handle(&update);
    }
    assert!(preview.is_selected("cta"));
    assert_eq!(preview.content().text("ctaTitle"), "Talk to us");
    h.stop().await;
}
