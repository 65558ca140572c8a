#![forbid(unsafe_code)]

//! Process-wide multicast event channel keyed by topic.
//!
//! # Design
//!
//! [`EventChannel<P>`] maps a topic name to the handlers registered for it.
//! Each handler has its own identity; [`EventChannel::subscribe`] returns a
//! [`Subscription`] that removes only that identity, never the whole topic.
//!
//! Cloning the channel creates a new handle to the **same** registry, so the
//! deck and every pane share one set of topics.
//!
//! # Invariants
//!
//! 1. `cancel()` removes exactly one handler and is idempotent.
//! 2. Dropping a [`Subscription`] cancels it. Use
//!    [`Subscription::detach`] to keep a handler for the channel's lifetime.
//! 3. Handlers are invoked in registration order.
//! 4. A handler cancelled during an emission is not invoked later in that
//!    same emission.
//!
//! # Failure Modes
//!
//! - **Stale subscriptions**: re-subscribing without cancelling the previous
//!   handle (for example via `detach`) delivers every emission once per
//!   registration. [`EventChannel::handler_count`] exposes the count so hosts
//!   can assert against it.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use tracing::{debug_span, trace};

/// Identity of one registered handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(u64);

type HandlerRc<P> = Rc<dyn Fn(&P)>;

struct Entry<P> {
    id: HandlerId,
    handler: HandlerRc<P>,
}

struct Registry<P> {
    topics: HashMap<Box<str>, Vec<Entry<P>>>,
    next_id: u64,
}

impl<P> Registry<P> {
    fn is_live(&self, topic: &str, id: HandlerId) -> bool {
        self.topics
            .get(topic)
            .is_some_and(|entries| entries.iter().any(|e| e.id == id))
    }

    fn remove(&mut self, topic: &str, id: HandlerId) -> bool {
        let Some(entries) = self.topics.get_mut(topic) else {
            return false;
        };
        let before = entries.len();
        entries.retain(|e| e.id != id);
        let removed = entries.len() != before;
        if entries.is_empty() {
            self.topics.remove(topic);
        }
        removed
    }
}

/// Shared topic → handlers registry.
pub struct EventChannel<P> {
    inner: Rc<RefCell<Registry<P>>>,
}

impl<P> Clone for EventChannel<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<P> std::fmt::Debug for EventChannel<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("EventChannel")
            .field("topics", &inner.topics.len())
            .field("next_id", &inner.next_id)
            .finish()
    }
}

impl<P: 'static> Default for EventChannel<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: 'static> EventChannel<P> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(Registry {
                topics: HashMap::new(),
                next_id: 0,
            })),
        }
    }

    /// Register `handler` for `topic`.
    ///
    /// The returned guard removes exactly this handler when cancelled or
    /// dropped.
    pub fn subscribe(&self, topic: &str, handler: impl Fn(&P) + 'static) -> Subscription {
        let id = {
            let mut inner = self.inner.borrow_mut();
            let id = HandlerId(inner.next_id);
            inner.next_id += 1;
            inner.topics.entry(topic.into()).or_default().push(Entry {
                id,
                handler: Rc::new(handler),
            });
            id
        };
        trace!(topic, handler = id.0, "subscribed");

        let weak: Weak<RefCell<Registry<P>>> = Rc::downgrade(&self.inner);
        let owned_topic: Box<str> = topic.into();
        Subscription {
            topic: topic.into(),
            id,
            cancel: Some(Box::new(move || {
                // The channel may already be gone; nothing to remove then.
                if let Some(inner) = weak.upgrade() {
                    inner.borrow_mut().remove(&owned_topic, id);
                }
            })),
        }
    }

    /// Deliver `payload` to every handler of `topic`.
    ///
    /// Returns how many handlers were invoked.
    pub fn emit(&self, topic: &str, payload: &P) -> usize {
        // Snapshot so handlers may subscribe or cancel while we iterate.
        let handlers: Vec<(HandlerId, HandlerRc<P>)> = {
            let inner = self.inner.borrow();
            match inner.topics.get(topic) {
                Some(entries) => entries
                    .iter()
                    .map(|e| (e.id, Rc::clone(&e.handler)))
                    .collect(),
                None => return 0,
            }
        };

        let _span = debug_span!("channel.emit", topic, handlers = handlers.len()).entered();
        let mut invoked = 0;
        for (id, handler) in handlers {
            if !self.inner.borrow().is_live(topic, id) {
                continue;
            }
            handler(payload);
            invoked += 1;
        }
        invoked
    }

    /// Number of live handlers for `topic`.
    #[must_use]
    pub fn handler_count(&self, topic: &str) -> usize {
        self.inner.borrow().topics.get(topic).map_or(0, Vec::len)
    }

    /// Number of topics with at least one handler.
    #[must_use]
    pub fn topic_count(&self) -> usize {
        self.inner.borrow().topics.len()
    }
}

/// Cancellation handle for one registered handler.
pub struct Subscription {
    topic: Box<str>,
    id: HandlerId,
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    /// Remove the handler. Calling again is a no-op.
    pub fn cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
            trace!(topic = &*self.topic, handler = self.id.0, "unsubscribed");
        }
    }

    /// Whether this handle still owns a registration.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.cancel.is_some()
    }

    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    #[must_use]
    pub fn id(&self) -> HandlerId {
        self.id
    }

    /// Give up the handle without removing the handler.
    ///
    /// The handler then lives as long as the channel.
    pub fn detach(mut self) {
        self.cancel = None;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("topic", &self.topic)
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}
