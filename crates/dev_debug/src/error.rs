use thiserror::Error;

/// Errors from constructing the delivery side of a client.
///
/// Nothing on the `send` path returns an error; these only surface from
/// explicit constructors such as [`crate::HttpTransport::new`].
#[derive(Debug, Error)]
pub enum DevDebugError {
    #[error("invalid collector endpoint {endpoint:?}: {message}")]
    InvalidEndpoint { endpoint: String, message: String },
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
    #[error("failed to spawn transport worker thread: {0}")]
    WorkerSpawn(std::io::Error),
}
