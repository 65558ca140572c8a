#![forbid(unsafe_code)]

//! Session-scoped filtering of broadcast backend events.
//!
//! Every pane subscribes to the same topics; the filter in front of each
//! handler drops events addressed to another session before any side effect
//! runs. A missing payload or a missing `sessionId` is treated as "not mine",
//! never as an error.

use serde::Serialize;
use tracing::trace;

use crate::events::{Payload, SessionId};

/// Why an incoming event produced no side effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IgnoredReason {
    /// Payload names another session.
    SessionMismatch,
    /// Payload is absent or carries no string `sessionId`.
    MissingSession,
    /// Session matched but the remaining fields did not decode.
    Malformed,
    /// Global action while another pane is active.
    NotActivePane,
}

/// Result of routing one payload to one pane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    Deliver,
    Ignore(IgnoredReason),
}

impl RouteDecision {
    #[must_use]
    pub const fn is_deliver(self) -> bool {
        matches!(self, Self::Deliver)
    }
}

/// Payloads that name the session they belong to.
pub trait SessionScoped {
    fn session_id(&self) -> Option<&str>;
}

impl SessionScoped for Payload {
    fn session_id(&self) -> Option<&str> {
        self.get("sessionId").and_then(Payload::as_str)
    }
}

impl<T: SessionScoped> SessionScoped for Option<T> {
    fn session_id(&self) -> Option<&str> {
        self.as_ref().and_then(SessionScoped::session_id)
    }
}

/// Decide whether `payload` is addressed to `session`.
#[must_use]
pub fn route<P: SessionScoped + ?Sized>(payload: &P, session: &SessionId) -> RouteDecision {
    match payload.session_id() {
        None => RouteDecision::Ignore(IgnoredReason::MissingSession),
        Some(id) if session == id => RouteDecision::Deliver,
        Some(_) => RouteDecision::Ignore(IgnoredReason::SessionMismatch),
    }
}

/// Wrap `handler` so it only sees payloads for `session`.
///
/// `on_ignored` observes every dropped payload (used for the pane's event
/// log); pass `|_| {}` when not needed.
pub fn session_filter<P, H, I>(session: SessionId, handler: H, on_ignored: I) -> impl Fn(&P)
where
    P: SessionScoped,
    H: Fn(&P),
    I: Fn(IgnoredReason),
{
    move |payload: &P| match route(payload, &session) {
        RouteDecision::Deliver => handler(payload),
        RouteDecision::Ignore(reason) => {
            trace!(session = %session, ?reason, "event filtered");
            on_ignored(reason);
        }
    }
}
