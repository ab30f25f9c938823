//! Box server connection settings

use reqwest::Client;
use std::time::Duration;

use crate::error::SaveError;

/// Default timeout applied to every phase of a request
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Timeouts bounding each blocking network call
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Timeouts {
    /// Time allowed to establish a connection
    pub connect: Duration,
    /// Longest an upload may go without moving a byte, including the wait
    /// for the response once the body is sent
    pub read: Duration,
    /// End-to-end limit for requests without a body (probe, listing, delete)
    pub request: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            connect: DEFAULT_TIMEOUT,
            read: DEFAULT_TIMEOUT,
            request: DEFAULT_TIMEOUT,
        }
    }
}

/// Resolved box server settings, owned by the caller
#[derive(Clone, Debug, Default)]
pub struct ServerConfig {
    /// Base URL of the box server. `None` is reported at call time.
    pub base_url: Option<String>,
    pub timeouts: Timeouts,
}

impl ServerConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: Some(base_url.into()),
            timeouts: Timeouts::default(),
        }
    }

    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Build a fresh HTTP client for a single operation
    ///
    /// No read timeout is set here: reqwest starts that clock when the request
    /// is sent, which would cap the whole upload. Bodiless requests use
    /// `timeouts.request`; uploads use an idle watchdog.
    pub(crate) fn http_client(&self) -> Result<Client, SaveError> {
        let client = Client::builder()
            .connect_timeout(self.timeouts.connect)
            .build()?;
        Ok(client)
    }
}
