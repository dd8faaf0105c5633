//! Tokio driver for the host side of the preview protocol.

use std::sync::Arc;

use marquee_common::ContentStore;
use tokio::sync::{Mutex, mpsc, watch};
use tokio::time::Instant;

use super::host::PreviewHost;
use super::protocol::{HostMessage, IncomingMessage, PreviewPort};
use crate::error::Result;
use crate::session::EditorSession;

/// An editor session shared between the UI and the preview driver.
///
/// Every edit made through [`SharedSession::edit`] publishes the session's
/// new revision, which the driver turns into a debounced `EDITOR_UPDATE`.
#[derive(Clone)]
pub struct SharedSession {
    inner: Arc<Mutex<EditorSession>>,
    revisions: Arc<watch::Sender<u64>>,
}

impl SharedSession {
    pub fn new(session: EditorSession) -> Self {
        let (revisions, _) = watch::channel(session.revision());
        Self {
            inner: Arc::new(Mutex::new(session)),
            revisions: Arc::new(revisions),
        }
    }

    /// Mutate the session and announce the change if the revision moved.
    pub async fn edit<R>(&self, f: impl FnOnce(&mut EditorSession) -> R) -> R {
        let mut session = self.inner.lock().await;
        let out = f(&mut session);
        let revision = session.revision();
        self.revisions.send_if_modified(|current| {
            let changed = *current != revision;
            *current = revision;
            changed
        });
        out
    }

    pub async fn read<R>(&self, f: impl FnOnce(&EditorSession) -> R) -> R {
        f(&*self.inner.lock().await)
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revisions.subscribe()
    }

    /// Save without holding the session lock across the store request, so
    /// edits and preview traffic continue while the save is in flight.
    pub async fn save_changes<S: ContentStore + ?Sized>(&self, store: &S) -> Result<()> {
        let pending = self.inner.lock().await.begin_save()?;
        let result = store.put_page(pending.page(), &pending.update()).await;
        self.inner.lock().await.finish_save(pending, result)
    }
}

/// Run the host until the inbound message stream closes.
///
/// Answers `PREVIEW_READY` and frame loads with `EDITOR_INIT`, sends one
/// anyway if neither arrives within [`INIT_FALLBACK`](super::host::INIT_FALLBACK), applies
/// `SECTION_CLICKED` to the session, and turns session revisions into
/// debounced `EDITOR_UPDATE`s. The revision subscription is taken when this
/// is called, so edits made before the returned future is first polled are
/// not missed.
pub fn run_host<P: PreviewPort<HostMessage>>(
    host: PreviewHost<P, Instant>,
    session: SharedSession,
    inbound: mpsc::UnboundedReceiver<IncomingMessage>,
    frame_loaded: mpsc::UnboundedReceiver<()>,
) -> impl Future<Output = ()> {
    let revisions = session.subscribe();
    drive(host, session, revisions, inbound, frame_loaded)
}

async fn drive<P: PreviewPort<HostMessage>>(
    mut host: PreviewHost<P, Instant>,
    session: SharedSession,
    mut revisions: watch::Receiver<u64>,
    mut inbound: mpsc::UnboundedReceiver<IncomingMessage>,
    mut frame_loaded: mpsc::UnboundedReceiver<()>,
) {
    tracing::info!(origin = %host.origin(), "preview host running");
    host.arm_init_fallback(Instant::now());

    loop {
        let deadline = host.next_deadline();
        tokio::select! {
            incoming = inbound.recv() => {
                let Some(incoming) = incoming else { break };
                let mut guard = session.inner.lock().await;
                host.handle(&incoming, &mut guard, Instant::now());
            }
            Ok(()) = revisions.changed() => {
                host.notify_changed(Instant::now());
            }
            Some(()) = frame_loaded.recv() => {
                let guard = session.inner.lock().await;
                host.on_frame_loaded(&guard);
            }
            _ = wait_for(deadline) => {
                let guard = session.inner.lock().await;
                host.on_timer(&guard, Instant::now());
            }
        }
    }
    tracing::info!("preview host stopped");
}

async fn wait_for(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
