//! Messages exchanged between the editor host and the embedded preview.
//!
//! Host to preview:
//! - `{"type":"EDITOR_INIT","payload":{"section":..,"data":{..}}}`
//! - `{"type":"EDITOR_UPDATE","payload":{"section":..,"data":{..}}}`
//!
//! Preview to host:
//! - `{"type":"PREVIEW_READY"}`
//! - `{"type":"SECTION_CLICKED","sectionId":".."}`
//!
//! Both directions are fire-and-forget. Every payload is a full snapshot;
//! there are no deltas and no acknowledgements.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use smol_str::SmolStr;
use url::Url;

use crate::content::PageContent;
use crate::error::{EditorError, Result};

/// Full editor state pushed to the preview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewPayload {
    /// Selected section id, `null` when nothing is selected.
    pub section: Option<SmolStr>,
    pub data: PageContent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HostMessage {
    EditorInit { payload: PreviewPayload },
    EditorUpdate { payload: PreviewPayload },
}

impl HostMessage {
    pub fn payload(&self) -> &PreviewPayload {
        match self {
            HostMessage::EditorInit { payload } | HostMessage::EditorUpdate { payload } => payload,
        }
    }

    pub fn into_payload(self) -> PreviewPayload {
        match self {
            HostMessage::EditorInit { payload } | HostMessage::EditorUpdate { payload } => payload,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PreviewMessage {
    PreviewReady,
    SectionClicked {
        #[serde(rename = "sectionId")]
        section_id: SmolStr,
    },
}

/// A web origin: scheme, host and port.
///
/// Stored in its serialized ASCII form, so comparison is exact.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Origin(SmolStr);

impl Origin {
    /// Parse an origin, or any URL whose origin should be used.
    pub fn parse(input: &str) -> Result<Self> {
        let url = Url::parse(input).map_err(|e| EditorError::InvalidOrigin {
            origin: input.to_string(),
            message: e.to_string(),
        })?;
        let origin = url.origin();
        if !origin.is_tuple() {
            return Err(EditorError::InvalidOrigin {
                origin: input.to_string(),
                message: "opaque origin".to_string(),
            });
        }
        Ok(Origin(origin.ascii_serialization().into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when `other` names this same origin. Unparseable input never
    /// matches.
    pub fn matches(&self, other: &str) -> bool {
        Origin::parse(other).is_ok_and(|o| o == *self)
    }
}

impl std::fmt::Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A message as delivered by the transport: sender origin plus raw data.
#[derive(Debug, Clone, PartialEq)]
pub struct IncomingMessage {
    pub origin: String,
    pub data: Value,
}

/// A decoded message from an accepted origin.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope<M> {
    pub origin: Origin,
    pub message: M,
}

/// Why an incoming message was not accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejected {
    /// Sender origin differs from the expected one.
    Origin(String),
    /// Data did not decode as a known message.
    Malformed,
}

impl IncomingMessage {
    pub fn new(origin: impl Into<String>, data: Value) -> Self {
        Self {
            origin: origin.into(),
            data,
        }
    }

    /// Check the sender and decode. Foreign origins are dropped before the
    /// data is looked at.
    pub fn accept<M: DeserializeOwned>(&self, expected: &Origin) -> std::result::Result<Envelope<M>, Rejected> {
        if !expected.matches(&self.origin) {
            tracing::warn!(origin = %self.origin, expected = %expected, "dropping message from foreign origin");
            return Err(Rejected::Origin(self.origin.clone()));
        }
        match M::deserialize(&self.data) {
            Ok(message) => Ok(Envelope {
                origin: expected.clone(),
                message,
            }),
            Err(err) => {
                tracing::debug!(error = %err, "ignoring unrecognised message");
                Err(Rejected::Malformed)
            }
        }
    }
}

/// Outbound side of the transport.
///
/// `target` is the only origin allowed to receive the message; delivery to
/// anything else is silently dropped, as `postMessage` does.
pub trait PreviewPort<M> {
    fn post(&self, message: &M, target: &Origin);
}

impl<M, P: PreviewPort<M> + ?Sized> PreviewPort<M> for &P {
    fn post(&self, message: &M, target: &Origin) {
        (**self).post(message, target)
    }
}

impl<M, P: PreviewPort<M> + ?Sized> PreviewPort<M> for std::sync::Arc<P> {
    fn post(&self, message: &M, target: &Origin) {
        (**self).post(message, target)
    }
}

/// In-process port over an unbounded channel, for tests and native hosts.
///
/// Posts are stamped with `sender` as their origin and dropped unless
/// `target` equals `receiver`.
#[derive(Debug, Clone)]
pub struct ChannelPort {
    sender: Origin,
    receiver: Origin,
    tx: tokio::sync::mpsc::UnboundedSender<IncomingMessage>,
}

impl ChannelPort {
    pub fn new(
        sender: Origin,
        receiver: Origin,
        tx: tokio::sync::mpsc::UnboundedSender<IncomingMessage>,
    ) -> Self {
        Self {
            sender,
            receiver,
            tx,
        }
    }
}

impl<M: Serialize> PreviewPort<M> for ChannelPort {
    fn post(&self, message: &M, target: &Origin) {
        if *target != self.receiver {
            tracing::debug!(%target, receiver = %self.receiver, "target origin mismatch, not delivered");
            return;
        }
        let data = match serde_json::to_value(message) {
            Ok(data) => data,
            Err(err) => {
                tracing::warn!(error = %err, "failed to encode preview message");
                return;
            }
        };
        // A closed receiver means the other side is gone; nothing to do.
        let _ = self.tx.send(IncomingMessage::new(self.sender.as_str(), data));
    }
}
