use thiserror::Error;

use crate::models::ListingId;

/// Errors raised by the remote data/storage service adapters
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("listing {0} not found")]
    NotFound(ListingId),

    #[error("listing {0} already exists")]
    Conflict(ListingId),

    #[error("backend returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("malformed backend payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

/// Errors for a single media upload. Never aborts the surrounding save.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("{file}: unsupported file type {content_type} for {slot}")]
    UnsupportedType {
        file: String,
        content_type: String,
        slot: String,
    },

    #[error("{0}: file is empty")]
    Empty(String),

    #[error("{file}: upload failed: {source}")]
    Storage {
        file: String,
        #[source]
        source: StoreError,
    },
}

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("no seller is signed in")]
    NotSignedIn,

    #[error("listing {0} belongs to another seller")]
    NotOwner(ListingId),

    #[error("listing {0} has been deleted")]
    Deleted(ListingId),

    #[error("listing cannot be published: {}", .missing.join(", "))]
    Incomplete { missing: Vec<String> },

    #[error("could not save listing: {0}")]
    Write(#[source] StoreError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("backend url and api key are required (set LISTING_DESK_BACKEND_URL and LISTING_DESK_API_KEY, or pass --offline)")]
    MissingBackend,

    #[error("failed to build http client: {0}")]
    Client(#[from] reqwest::Error),
}
