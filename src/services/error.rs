use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("collection {identifier} does not exist or has no metadata")]
    NotFound { identifier: String },

    #[error("{url} answered HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("transport error fetching {url}: {message}")]
    Transport { url: String, message: String },

    #[error("malformed metadata from {url}: {message}")]
    Decode { url: String, message: String },
}
