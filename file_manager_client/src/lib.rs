//! A thin client for the file manager's object query-and-update api.
//!
//! Requests are assembled with [IndexRequest], one consuming step at a time, so that the exact
//! request can be inspected with [IndexRequest::build] without touching the network.

use bytes::Bytes;
use url::Url;

mod request;

pub use request::{IndexRequest, IndexResponse};
pub use reqwest::{Method, StatusCode};

/// Path segments of the s3 object collection, relative to the file manager endpoint.
pub const S3_COLLECTION_SEGMENTS: [&str; 3] = ["api", "v1", "s3"];

#[derive(Debug, thiserror::Error)]
pub enum FileManagerErr {
    #[error("invalid file manager endpoint `{endpoint}`: {source}")]
    InvalidEndpoint {
        endpoint: String,
        #[source]
        source: url::ParseError,
    },
    #[error("file manager endpoint `{0}` cannot be used as a base url")]
    NotABaseUrl(String),
    #[error("invalid header `{name}`: {reason}")]
    InvalidHeader { name: String, reason: String },
    #[error("unable to complete request to the file manager: {0}")]
    Transport(#[from] reqwest::Error),
}

#[derive(Clone, Debug)]
pub struct FileManagerClient {
    endpoint: Url,
    client: reqwest::Client,
}

impl FileManagerClient {
    /// Creates a client for the file manager hosted at `endpoint`, e.g. `https://file.example.com`.
    pub fn new(endpoint: &str) -> Result<Self, FileManagerErr> {
        Self::with_client(endpoint, reqwest::Client::new())
    }

    /// Same as [FileManagerClient::new] but reuses an existing [reqwest::Client].
    pub fn with_client(endpoint: &str, client: reqwest::Client) -> Result<Self, FileManagerErr> {
        let parsed = Url::parse(endpoint).map_err(|source| FileManagerErr::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            source,
        })?;

        if parsed.cannot_be_a_base() {
            return Err(FileManagerErr::NotABaseUrl(endpoint.to_string()));
        }

        Ok(Self {
            endpoint: parsed,
            client,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Starts a new request which will send `body`.
    pub fn request(&self, body: impl Into<Bytes>) -> IndexRequest {
        IndexRequest::new(self.client.clone(), self.endpoint.clone(), body.into())
    }
}
