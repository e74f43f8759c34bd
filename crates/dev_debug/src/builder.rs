use std::{sync::Arc, time::Duration};

use tracing::warn;

use crate::{
    client::DebugClient,
    config::NormalizeConfig,
    defaults::{default_endpoint, DEFAULT_MARKER, DEFAULT_TIMEOUT},
    event::EventBuilder,
    stack::{BacktraceCapture, StackCapture},
    transport::{HttpTransport, NullTransport, Transport},
};

#[derive(Debug, Clone)]
pub struct DebugClientBuilder {
    pub(crate) endpoint: Option<String>,
    pub(crate) timeout: Duration,
    pub(crate) marker: String,
    pub(crate) normalize: NormalizeConfig,
    pub(crate) backtrace_limit: Option<usize>,
    pub(crate) transport: Option<Arc<dyn Transport>>,
    pub(crate) stack_capture: Option<Arc<dyn StackCapture>>,
}

impl Default for DebugClientBuilder {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout: DEFAULT_TIMEOUT,
            marker: DEFAULT_MARKER.to_string(),
            normalize: NormalizeConfig::default(),
            backtrace_limit: None,
            transport: None,
            stack_capture: None,
        }
    }
}

impl DebugClientBuilder {
    /// Collector URL. Defaults to `DEV_DEBUG_ENDPOINT` or
    /// `http://127.0.0.1:3000/debug`.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Hard upper bound on each delivery attempt.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Default label and payload language when a call's context sets none.
    pub fn marker(mut self, marker: impl Into<String>) -> Self {
        self.marker = marker.into();
        self
    }

    pub fn normalize_config(mut self, config: NormalizeConfig) -> Self {
        self.normalize = config;
        self
    }

    pub fn max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.normalize.max_depth = max_depth;
        self
    }

    pub fn detect_cycles(mut self, enabled: bool) -> Self {
        self.normalize.detect_cycles = enabled;
        self
    }

    pub fn backtrace_limit(mut self, limit: Option<usize>) -> Self {
        self.backtrace_limit = limit;
        self
    }

    /// Replaces the HTTP transport; `endpoint` and `timeout` are then unused.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn stack_capture(mut self, capture: Arc<dyn StackCapture>) -> Self {
        self.stack_capture = Some(capture);
        self
    }

    pub fn build(self) -> DebugClient {
        let transport = match self.transport {
            Some(transport) => transport,
            None => {
                let endpoint = self.endpoint.unwrap_or_else(default_endpoint);
                match HttpTransport::new(endpoint, self.timeout) {
                    Ok(transport) => Arc::new(transport) as Arc<dyn Transport>,
                    Err(err) => {
                        warn!("debug events will be dropped: {err}");
                        Arc::new(NullTransport)
                    }
                }
            }
        };

        let stack_capture = self
            .stack_capture
            .unwrap_or_else(|| Arc::new(BacktraceCapture));
        if transport.is_enabled() {
            stack_capture.prepare();
        }

        DebugClient {
            events: EventBuilder::new(self.marker).backtrace_limit(self.backtrace_limit),
            normalize: self.normalize,
            transport,
            stack_capture,
        }
    }
}
