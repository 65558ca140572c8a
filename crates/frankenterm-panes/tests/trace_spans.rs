#![forbid(unsafe_code)]

//! Verifies the spans hosts rely on when tracing dispatch.

use std::rc::Rc;
use std::sync::{Arc, Mutex};

use frankenterm_panes::{HostClock, PaneConfig, PaneDeck, RecordingSurface, SessionId, topic};
use serde_json::json;
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;

#[derive(Clone, Default)]
struct SpanNames(Arc<Mutex<Vec<String>>>);

impl SpanNames {
    fn snapshot(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

impl<S> tracing_subscriber::Layer<S> for SpanNames
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(
        &self,
        attrs: &tracing::span::Attributes<'_>,
        _id: &tracing::span::Id,
        _ctx: Context<'_, S>,
    ) {
        self.0
            .lock()
            .unwrap()
            .push(attrs.metadata().name().to_string());
    }
}

#[test]
fn emit_and_remount_open_spans() {
    let names = SpanNames::default();
    let subscriber = tracing_subscriber::registry().with(names.clone());

    tracing::subscriber::with_default(subscriber, || {
        let clock = HostClock::new();
        let mut deck = PaneDeck::new(PaneConfig::default(), Rc::new(clock));
        deck.mount(SessionId::new("a"), Box::new(RecordingSurface::new()))
            .remount();
        deck.emit_backend(
            topic::INITIAL_VIEWPORT,
            &json!({ "sessionId": "a", "data": "x" }),
        );
    });

    let spans = names.snapshot();
    assert!(spans.iter().any(|n| n == "pane.remount"), "{spans:?}");
    assert!(spans.iter().any(|n| n == "deck.emit_backend"), "{spans:?}");
    assert!(spans.iter().any(|n| n == "channel.emit"), "{spans:?}");
}
