use std::time::Duration;

use smol_str::SmolStr;

use super::debounce::Debouncer;
use super::protocol::{HostMessage, IncomingMessage, Origin, PreviewMessage, PreviewPort, Rejected};
use crate::session::EditorSession;

/// How long the host waits for `PREVIEW_READY` or a frame load before it
/// sends `EDITOR_INIT` anyway.
pub const INIT_FALLBACK: Duration = Duration::from_secs(2);

/// What the host did with an incoming message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Handled {
    /// `PREVIEW_READY`: an `EDITOR_INIT` was sent.
    Ready,
    /// `SECTION_CLICKED` for a known section: it is now selected.
    Selected(SmolStr),
    /// Well-formed but not actionable, e.g. a click on an unknown section.
    Ignored,
    Rejected(Rejected),
}

/// Editor-side half of the preview protocol.
///
/// Owns no editor state; every call is handed the session it should read
/// or update. Preview and editor are same-origin, so `origin` is both the
/// only accepted sender and the target of every post.
pub struct PreviewHost<P, I = web_time::Instant> {
    origin: Origin,
    port: P,
    debounce: Debouncer<I>,
    init_sent: bool,
    init_fallback: Option<I>,
}

impl<P, I> PreviewHost<P, I>
where
    P: PreviewPort<HostMessage>,
    I: Copy + Ord + std::ops::Add<std::time::Duration, Output = I>,
{
    pub fn new(origin: Origin, port: P) -> Self {
        Self::with_debouncer(origin, port, Debouncer::default())
    }

    pub fn with_debouncer(origin: Origin, port: P, debounce: Debouncer<I>) -> Self {
        Self {
            origin,
            port,
            debounce,
            init_sent: false,
            init_fallback: None,
        }
    }

    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    pub fn port(&self) -> &P {
        &self.port
    }

    pub fn init_sent(&self) -> bool {
        self.init_sent
    }

    /// Whether an `EDITOR_UPDATE` is waiting on the debounce.
    pub fn update_pending(&self) -> bool {
        self.debounce.is_pending()
    }

    /// Start waiting for the preview. If no `EDITOR_INIT` has gone out by
    /// `now + INIT_FALLBACK`, [`on_timer`](Self::on_timer) sends one.
    pub fn arm_init_fallback(&mut self, now: I) {
        if !self.init_sent {
            self.init_fallback = Some(now + INIT_FALLBACK);
        }
    }

    /// Earliest of the debounce and init fallback deadlines.
    pub fn next_deadline(&self) -> Option<I> {
        [self.debounce.deadline(), self.init_fallback]
            .into_iter()
            .flatten()
            .min()
    }

    /// Fire whatever is due at `now`.
    pub fn on_timer(&mut self, session: &EditorSession, now: I) {
        if self.init_fallback.is_some_and(|deadline| deadline <= now) {
            tracing::debug!(page = session.page(), "no ready signal from preview, sending init");
            self.send_init(session);
        }
        self.flush_due(session, now);
    }

    pub fn handle(&mut self, incoming: &IncomingMessage, session: &mut EditorSession, now: I) -> Handled {
        let envelope = match incoming.accept::<PreviewMessage>(&self.origin) {
            Ok(envelope) => envelope,
            Err(rejected) => return Handled::Rejected(rejected),
        };
        match envelope.message {
            PreviewMessage::PreviewReady => {
                tracing::debug!(page = session.page(), "preview ready");
                self.send_init(session);
                Handled::Ready
            }
            PreviewMessage::SectionClicked { section_id } => {
                match session.select_section(Some(&section_id)) {
                    Ok(()) => {
                        self.notify_changed(now);
                        Handled::Selected(section_id)
                    }
                    Err(err) => {
                        tracing::debug!(error = %err, "ignoring click on unknown section");
                        Handled::Ignored
                    }
                }
            }
        }
    }

    /// Fallback for a preview whose `PREVIEW_READY` may have been lost.
    /// Re-sending the full snapshot is harmless.
    pub fn on_frame_loaded(&mut self, session: &EditorSession) {
        self.send_init(session);
    }

    pub fn notify_changed(&mut self, now: I) {
        self.debounce.touch(now);
    }

    /// Send the pending `EDITOR_UPDATE` if its deadline has passed.
    pub fn flush_due(&mut self, session: &EditorSession, now: I) -> bool {
        if !self.debounce.take(now) {
            return false;
        }
        tracing::debug!(page = session.page(), revision = session.revision(), "editor update");
        self.port.post(
            &HostMessage::EditorUpdate {
                payload: session.preview_payload(),
            },
            &self.origin,
        );
        true
    }

    fn send_init(&mut self, session: &EditorSession) {
        // The init snapshot already carries any pending change.
        self.debounce.cancel();
        self.port.post(
            &HostMessage::EditorInit {
                payload: session.preview_payload(),
            },
            &self.origin,
        );
        self.init_sent = true;
        self.init_fallback = None;
    }
}
