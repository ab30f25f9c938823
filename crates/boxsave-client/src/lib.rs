//! Box Save Client
//!
//! This crate provides the client for publishing box images to a remote
//! box server: streaming uploads with progress reporting, and retention-based
//! cleanup of older versions.

pub mod artifact;
pub mod cleaner;
pub mod config;
pub mod error;
pub mod progress;
pub mod uploader;
pub mod version;

pub use artifact::{ArtifactIdentity, UrlBuilder, normalize_provider};
pub use cleaner::{Cleaner, CleanupReport};
pub use config::{ServerConfig, Timeouts};
pub use error::SaveError;
pub use progress::{NoopUi, ProgressTracker, ProgressUpdate, Render, UiObserver, next_progress, percent_of};
pub use uploader::Uploader;
pub use version::compare_versions;
