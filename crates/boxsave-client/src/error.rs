//! Client error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SaveError {
    #[error("Box server URL is not configured")]
    ServerNotConfigured,

    #[error("Invalid box server URL: {0}")]
    InvalidServerUrl(String),

    #[error("Invalid artifact: {0}")]
    InvalidArtifact(String),

    #[error("Cannot contact box server at {url}: {reason}")]
    ServerUnreachable { url: String, reason: String },

    #[error("Upload to {url} stalled for {idle_secs}s")]
    UploadStalled { url: String, idle_secs: u64 },

    #[error("Upload failed with status {status}")]
    UploadFailed { status: u16 },

    #[error("Failed to load version listing: {0}")]
    ListingFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}
