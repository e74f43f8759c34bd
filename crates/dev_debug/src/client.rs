use std::{
    panic::{self, AssertUnwindSafe, Location},
    sync::Arc,
    time::Duration,
};

use tracing::{debug, trace};

use crate::{
    builder::DebugClientBuilder,
    config::{Context, NormalizeConfig},
    defaults::INSPECTION_PANICKED,
    event::{DebugEvent, EventBuilder},
    normalize::{Inspect, Marker, NormalizedNode, Normalizer},
    stack::StackCapture,
    transport::{NullTransport, Transport},
};

/// Handle used by host code to report values to the collector.
///
/// Cloning is cheap; clones share the transport. Every entry point returns
/// `()` and never panics on delivery problems.
#[derive(Debug, Clone)]
pub struct DebugClient {
    pub(crate) events: EventBuilder,
    pub(crate) normalize: NormalizeConfig,
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) stack_capture: Arc<dyn StackCapture>,
}

impl Default for DebugClient {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl DebugClient {
    pub fn builder() -> DebugClientBuilder {
        DebugClientBuilder::default()
    }

    /// A client that discards everything without inspecting it.
    pub fn disabled() -> Self {
        Self::builder().transport(Arc::new(NullTransport)).build()
    }

    pub fn is_enabled(&self) -> bool {
        self.transport.is_enabled()
    }

    /// Normalizes `value`, attaches the call site and stack, and hands the
    /// event to the transport.
    ///
    /// A panicking [`Inspect`] impl is reported as an error leaf. The process
    /// panic hook still runs, so the default hook prints the panic message to
    /// stderr. Locks held by the normalizer are released without being
    /// poisoned.
    #[track_caller]
    pub fn send<T: Inspect + ?Sized>(&self, value: &T, context: Context) {
        if !self.transport.is_enabled() {
            trace!("debug transport disabled; skipping event");
            return;
        }
        let event = self.build_event(value, &context);
        self.transport.dispatch(event);
    }

    /// [`DebugClient::send`] with the default label and language.
    #[track_caller]
    pub fn dbg<T: Inspect + ?Sized>(&self, value: &T) {
        self.send(value, Context::default());
    }

    /// Builds the event `send` would dispatch, without dispatching it.
    #[track_caller]
    pub fn build_event<T: Inspect + ?Sized>(&self, value: &T, context: &Context) -> DebugEvent {
        let location = Location::caller();
        let node = self.normalize_contained(value);
        let frames = self.stack_capture.capture();
        self.events.build(node, context, Some(location), frames)
    }

    /// Waits up to `timeout` for queued deliveries to finish.
    pub fn flush(&self, timeout: Duration) -> bool {
        self.transport.flush(timeout)
    }

    fn normalize_contained<T: Inspect + ?Sized>(&self, value: &T) -> NormalizedNode {
        let config = self.normalize;
        panic::catch_unwind(AssertUnwindSafe(|| Normalizer::new(config).normalize(value)))
            .unwrap_or_else(|_| {
                debug!("value inspection panicked; sending an error marker instead");
                NormalizedNode::Marker(Marker::Error {
                    message: INSPECTION_PANICKED.to_string(),
                })
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    };

    use serde_json::json;

    use crate::stack::RawFrame;

    #[derive(Debug, Default)]
    struct RecordingTransport {
        events: Mutex<Vec<DebugEvent>>,
    }

    impl Transport for RecordingTransport {
        fn dispatch(&self, event: DebugEvent) {
            self.events.lock().unwrap().push(event);
        }
    }

    #[derive(Debug)]
    struct FixedStack(Vec<RawFrame>);

    impl StackCapture for FixedStack {
        fn capture(&self) -> Vec<RawFrame> {
            self.0.clone()
        }
    }

    fn recording_client() -> (DebugClient, Arc<RecordingTransport>) {
        let transport = Arc::new(RecordingTransport::default());
        let client = DebugClient::builder()
            .transport(transport.clone())
            .stack_capture(Arc::new(FixedStack(vec![
                RawFrame::new("src/checkout.rs", 7, "shop::checkout"),
                RawFrame::new("src/main.rs", 3, "shop::main"),
            ])))
            .build();
        (client, transport)
    }

    #[test]
    fn send_dispatches_one_event_with_the_default_marker() {
        let (client, transport) = recording_client();
        client.send(&42, Context::new());

        let events = transport.events.lock().unwrap();
        assert_eq!(events.len(), 1);
        let json = serde_json::to_value(&events[0]).unwrap();
        assert_eq!(json["payload"], json!({"language": "Rust", "value": 42}));
        assert_eq!(json["label"], "Rust");
        assert_eq!(json["callerFunction"], "shop::checkout");
        assert_eq!(json["sourceName"], "client.rs");
        assert_eq!(
            json["backtrace"],
            json!([{"file": "src/main.rs", "line": 3, "function": "shop::main"}])
        );
    }

    #[test]
    fn send_reports_the_track_caller_location() {
        let (client, _) = recording_client();
        let line = line!() + 1;
        let event = client.build_event(&"here", &Context::new());
        assert_eq!(event.line_number, line);
        assert_eq!(event.source_path, file!());
    }

    #[test]
    fn panicking_inspection_becomes_an_error_marker() {
        struct Explodes;

        impl Inspect for Explodes {
            fn inspect(&self, _normalizer: &mut Normalizer) -> NormalizedNode {
                panic!("boom");
            }
        }

        let (client, transport) = recording_client();
        client.send(&Explodes, Context::new());

        let events = transport.events.lock().unwrap();
        assert_eq!(
            serde_json::to_value(&events[0].payload.value).unwrap(),
            json!({"__type": "error", "message": "inspection panicked"})
        );
    }

    #[test]
    fn custom_marker_applies_to_label_and_language() {
        let transport = Arc::new(RecordingTransport::default());
        let client = DebugClient::builder()
            .marker("Worker")
            .transport(transport.clone())
            .stack_capture(Arc::new(FixedStack(Vec::new())))
            .build();
        client.dbg(&());

        let events = transport.events.lock().unwrap();
        assert_eq!(events[0].label, "Worker");
        assert_eq!(events[0].payload.language, "Worker");
    }

    #[derive(Debug, Default)]
    struct CountingStack {
        prepared: AtomicUsize,
    }

    impl StackCapture for CountingStack {
        fn capture(&self) -> Vec<RawFrame> {
            Vec::new()
        }

        fn prepare(&self) {
            self.prepared.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn stack_capture_is_prepared_only_for_enabled_clients() {
        let capture = Arc::new(CountingStack::default());
        DebugClient::builder()
            .transport(Arc::new(RecordingTransport::default()))
            .stack_capture(capture.clone())
            .build();
        assert_eq!(capture.prepared.load(Ordering::SeqCst), 1);

        let capture = Arc::new(CountingStack::default());
        DebugClient::builder()
            .transport(Arc::new(NullTransport))
            .stack_capture(capture.clone())
            .build();
        assert_eq!(capture.prepared.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn disabled_client_skips_everything() {
        let client = DebugClient::disabled();
        assert!(!client.is_enabled());
        client.send(&"ignored", Context::new());
        assert!(client.flush(Duration::ZERO));
    }

    #[test]
    fn invalid_endpoint_falls_back_to_a_disabled_client() {
        let client = DebugClient::builder().endpoint("not a url").build();
        assert!(!client.is_enabled());
    }
}
