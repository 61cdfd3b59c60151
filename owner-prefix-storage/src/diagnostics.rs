/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::fmt::Debug;
use std::sync::{Mutex, PoisonError};

use crate::owner::KeyFormatError;

/// Receives diagnostics raised while translating keys.
///
/// Supplied to the decorator at construction. The default, [`TracingSink`],
/// forwards everything to `tracing`.
pub trait DiagnosticSink: Send + Sync + Debug {
    /// `key` could not be parsed as a chunk key and is used without an owner prefix.
    fn unrecognized_key(&self, key: &str, error: &KeyFormatError);
}

/// Emits diagnostics as `tracing` error events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn unrecognized_key(&self, key: &str, error: &KeyFormatError) {
        tracing::error!(key, %error, "unknown chunk key format");
    }
}

/// Collects diagnostics in memory so they can be inspected later.
#[derive(Debug, Default)]
pub struct CollectingSink {
    events: Mutex<Vec<(String, KeyFormatError)>>,
}

impl CollectingSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every `(key, error)` pair received so far.
    pub fn events(&self) -> Vec<(String, KeyFormatError)> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of diagnostics received so far.
    pub fn len(&self) -> usize {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns true if nothing was received.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DiagnosticSink for CollectingSink {
    fn unrecognized_key(&self, key: &str, error: &KeyFormatError) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((key.to_string(), error.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tracing::field::{Field, Visit};
    use tracing::{Event, Level, Subscriber};
    use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

    /// Records the level and `key` field of every event.
    #[derive(Clone, Default)]
    struct EventRecorder {
        events: Arc<Mutex<Vec<(Level, String)>>>,
    }

    struct KeyField(String);

    impl Visit for KeyField {
        fn record_str(&mut self, field: &Field, value: &str) {
            if field.name() == "key" {
                self.0 = value.to_string();
            }
        }

        fn record_debug(&mut self, _field: &Field, _value: &dyn Debug) {}
    }

    impl<S: Subscriber> Layer<S> for EventRecorder {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            let mut key = KeyField(String::new());
            event.record(&mut key);
            self.events
                .lock()
                .unwrap()
                .push((*event.metadata().level(), key.0));
        }
    }

    #[test]
    fn test_tracing_sink_logs_at_error_level() {
        let recorder = EventRecorder::default();
        let subscriber = tracing_subscriber::registry().with(recorder.clone());

        tracing::subscriber::with_default(subscriber, || {
            TracingSink.unrecognized_key("chunks/0/0/bad", &KeyFormatError::ChunkName);
        });

        let events = recorder.events.lock().unwrap().clone();
        assert_eq!(events, vec![(Level::ERROR, "chunks/0/0/bad".to_string())]);
    }

    #[test]
    fn test_collecting_sink_keeps_order() {
        let sink = CollectingSink::new();
        assert!(sink.is_empty());

        sink.unrecognized_key("bad", &KeyFormatError::Path);
        sink.unrecognized_key("a/bad", &KeyFormatError::ChunkName);

        assert_eq!(
            sink.events(),
            vec![
                ("bad".to_string(), KeyFormatError::Path),
                ("a/bad".to_string(), KeyFormatError::ChunkName),
            ]
        );
    }
}
