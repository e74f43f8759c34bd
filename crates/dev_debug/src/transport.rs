use std::{fmt, sync::mpsc as std_mpsc, thread, time::Duration};

use reqwest::{header::CONTENT_TYPE, Url};
use tokio::{runtime, sync::mpsc, task::JoinSet, time};
use tracing::{debug, trace};

use crate::{error::DevDebugError, event::DebugEvent};

/// Delivery side of a [`crate::DebugClient`].
///
/// `dispatch` must return promptly and must never surface a failure: a
/// dropped event is simply lost.
pub trait Transport: Send + Sync + fmt::Debug {
    fn dispatch(&self, event: DebugEvent);

    /// Waits up to `timeout` for in-flight deliveries to settle. Returns
    /// `false` if they did not settle in time.
    fn flush(&self, _timeout: Duration) -> bool {
        true
    }

    /// `false` when every dispatched event would be discarded, letting the
    /// client skip inspection entirely.
    fn is_enabled(&self) -> bool {
        true
    }
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullTransport;

impl Transport for NullTransport {
    fn dispatch(&self, _event: DebugEvent) {}

    fn is_enabled(&self) -> bool {
        false
    }
}

enum Command {
    Deliver(Box<DebugEvent>),
    Flush(std_mpsc::Sender<()>),
}

/// Fire-and-forget JSON POSTs to the collector.
///
/// Events are queued to a dedicated worker thread driving a current-thread
/// tokio runtime; each delivery runs as its own task under a hard timeout.
/// The caller never waits on the network.
pub struct HttpTransport {
    endpoint: Url,
    commands: mpsc::UnboundedSender<Command>,
}

impl fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransport")
            .field("endpoint", &self.endpoint.as_str())
            .finish_non_exhaustive()
    }
}

impl HttpTransport {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, DevDebugError> {
        let endpoint = endpoint.into();
        let url = Url::parse(&endpoint).map_err(|err| DevDebugError::InvalidEndpoint {
            endpoint: endpoint.clone(),
            message: err.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(DevDebugError::InvalidEndpoint {
                message: format!("unsupported scheme {:?}", url.scheme()),
                endpoint,
            });
        }

        let client = reqwest::Client::builder().timeout(timeout).build()?;
        let runtime = runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(DevDebugError::WorkerSpawn)?;

        let (commands, receiver) = mpsc::unbounded_channel();
        let worker_url = url.clone();
        thread::Builder::new()
            .name("dev-debug-transport".to_string())
            .spawn(move || runtime.block_on(run_worker(receiver, client, worker_url, timeout)))
            .map_err(DevDebugError::WorkerSpawn)?;

        Ok(Self {
            endpoint: url,
            commands,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

impl Transport for HttpTransport {
    fn dispatch(&self, event: DebugEvent) {
        if self.commands.send(Command::Deliver(Box::new(event))).is_err() {
            trace!("debug transport worker is gone; dropping event");
        }
    }

    fn flush(&self, timeout: Duration) -> bool {
        let (ack, settled) = std_mpsc::channel();
        if self.commands.send(Command::Flush(ack)).is_err() {
            return false;
        }
        settled.recv_timeout(timeout).is_ok()
    }
}

async fn run_worker(
    mut commands: mpsc::UnboundedReceiver<Command>,
    client: reqwest::Client,
    endpoint: Url,
    timeout: Duration,
) {
    let mut inflight = JoinSet::new();
    loop {
        tokio::select! {
            command = commands.recv() => match command {
                Some(Command::Deliver(event)) => {
                    inflight.spawn(deliver(client.clone(), endpoint.clone(), timeout, event));
                }
                Some(Command::Flush(ack)) => {
                    while inflight.join_next().await.is_some() {}
                    let _ = ack.send(());
                }
                None => break,
            },
            Some(_) = inflight.join_next(), if !inflight.is_empty() => {}
        }
    }
    while inflight.join_next().await.is_some() {}
}

async fn deliver(
    client: reqwest::Client,
    endpoint: Url,
    timeout: Duration,
    event: Box<DebugEvent>,
) {
    let body = match serde_json::to_vec(&event) {
        Ok(body) => body,
        Err(err) => {
            debug!("dropping debug event {} that failed to serialize: {err}", event.id);
            return;
        }
    };

    let request = client
        .post(endpoint)
        .header(CONTENT_TYPE, "application/json")
        .body(body)
        .send();
    match time::timeout(timeout, request).await {
        Ok(Ok(response)) => {
            trace!("debug event {} delivered ({})", event.id, response.status())
        }
        Ok(Err(err)) => debug!("debug event {} not delivered: {err}", event.id),
        Err(_) => debug!("debug event {} timed out after {timeout:?}", event.id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_endpoints_that_are_not_http_urls() {
        let err = HttpTransport::new("not a url", Duration::from_millis(50)).unwrap_err();
        assert!(matches!(err, DevDebugError::InvalidEndpoint { .. }));

        let err =
            HttpTransport::new("ftp://127.0.0.1/debug", Duration::from_millis(50)).unwrap_err();
        assert!(err.to_string().contains("unsupported scheme"));
    }

    #[test]
    fn keeps_the_parsed_endpoint() {
        let transport =
            HttpTransport::new("http://127.0.0.1:3000/debug", Duration::from_millis(50))
                .unwrap();
        assert_eq!(transport.endpoint().as_str(), "http://127.0.0.1:3000/debug");
        assert_eq!(transport.endpoint().port(), Some(3000));
    }

    #[test]
    fn null_transport_reports_disabled() {
        assert!(!NullTransport.is_enabled());
        assert!(NullTransport.flush(Duration::ZERO));
    }
}
