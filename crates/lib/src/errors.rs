use thiserror::Error;

/// Errors raised by calls against the document storage or index service.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to build Reqwest client: {0}")]
    ClientBuild(reqwest::Error),
    #[error("Failed to send request to the store API: {0}")]
    Request(reqwest::Error),
    #[error("Request to the store API timed out: {0}")]
    Timeout(reqwest::Error),
    #[error("Failed to deserialize store API response: {0}")]
    Deserialization(reqwest::Error),
    #[error("Store API returned status {status}: {body}")]
    Api { status: u16, body: String },
}

impl StoreError {
    /// Classifies a transport error from `reqwest`, keeping timeouts distinct.
    pub(crate) fn from_send(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            StoreError::Timeout(err)
        } else {
            StoreError::Request(err)
        }
    }

    /// Whether repeating the same call could plausibly succeed.
    ///
    /// Timeouts, connection failures, rate limiting (429) and server-side (5xx)
    /// failures are transient. Authentication, validation and decoding errors are not.
    pub fn is_transient(&self) -> bool {
        match self {
            StoreError::Timeout(_) => true,
            StoreError::Request(e) => e.is_connect() || e.is_timeout(),
            StoreError::Api { status, .. } => *status == 429 || *status >= 500,
            StoreError::ClientBuild(_) | StoreError::Deserialization(_) => false,
        }
    }
}

/// A generic error type for feed sources.
///
/// Each feed plugin maps its specific errors (HTTP, XML parsing) into these
/// variants so the job runner can handle them uniformly.
#[derive(Error, Debug)]
pub enum FeedFetchError {
    #[error("Failed to fetch the feed: {0}")]
    Fetch(String),
    #[error("Fetching the feed timed out: {0}")]
    Timeout(String),
    #[error("Failed to parse the feed: {0}")]
    Parse(String),
}

/// Errors produced while running the ingestion job.
#[derive(Error, Debug)]
pub enum JobError {
    #[error(transparent)]
    FeedFetch(#[from] FeedFetchError),
    #[error("Failed to upload document '{file_name}': {source}")]
    Upload {
        file_name: String,
        #[source]
        source: StoreError,
    },
    #[error("Failed to attach file {file_id} to vector store {store_id}: {source}")]
    Attach {
        file_id: String,
        store_id: String,
        #[source]
        source: StoreError,
    },
    #[error("A job run is already in progress")]
    AlreadyRunning,
}
