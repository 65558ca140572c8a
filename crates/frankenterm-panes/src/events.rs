#![forbid(unsafe_code)]

//! Topics and payload shapes carried on the shared event channel.
//!
//! Backend payloads travel as untyped JSON ([`Payload`]) so that one channel
//! can carry every topic. Panes decode the typed struct only after the
//! session filter has accepted the event.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Untyped payload as delivered by the backend bridge.
pub type Payload = serde_json::Value;

/// Wire topic names.
pub mod topic {
    /// `{ sessionId, data }`, once per session attach.
    pub const INITIAL_VIEWPORT: &str = "terminal-initial-viewport";
    /// `{ sessionId, epoch }`, on every backend-side resize.
    pub const RESIZE_EPOCH: &str = "terminal-resize-epoch";
    /// `{ text }`, OS-level paste command. Not session scoped.
    pub const GLOBAL_PASTE: &str = "global-paste";
}

/// Opaque id tying a pane to a backend terminal session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl PartialEq<str> for SessionId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitialViewport {
    pub session_id: SessionId,
    pub data: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResizeEpoch {
    pub epoch: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalPaste {
    #[serde(default)]
    pub text: Option<String>,
}

impl InitialViewport {
    #[must_use]
    pub fn to_payload(&self) -> Payload {
        serde_json::json!({ "sessionId": self.session_id, "data": self.data })
    }
}

/// Build a resize-epoch payload for `session`.
#[must_use]
pub fn resize_epoch_payload(session: &SessionId, epoch: u64) -> Payload {
    serde_json::json!({ "sessionId": session, "epoch": epoch })
}

/// Build a global paste payload.
#[must_use]
pub fn global_paste_payload(text: &str) -> Payload {
    serde_json::json!({ "text": text })
}
