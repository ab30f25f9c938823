//! Streaming box upload

use futures::TryStreamExt;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, Method, StatusCode};
use std::future::Future;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::fs::File;
use tokio::io::AsyncReadExt;
use tokio::time::{Instant, sleep_until};
use tokio_util::io::ReaderStream;
use tracing::{debug, info};

use crate::artifact::{ArtifactIdentity, UrlBuilder};
use crate::config::ServerConfig;
use crate::error::SaveError;
use crate::progress::{ProgressTracker, UiObserver};

/// Multipart field the box server reads the image from
pub const BOX_FIELD: &str = "box";

/// Uploads box files to the box server
///
/// Holds no connection state; every call builds its own HTTP client.
pub struct Uploader {
    server: ServerConfig,
    ui: Arc<dyn UiObserver>,
}

impl Uploader {
    pub fn new(server: ServerConfig, ui: Arc<dyn UiObserver>) -> Self {
        Self { server, ui }
    }

    /// Upload `file` as `version` of `artifact`
    ///
    /// Returns the provider token the version was stored under.
    pub async fn send(
        &self,
        artifact: &ArtifactIdentity,
        file: impl AsRef<Path>,
        version: &str,
    ) -> Result<String, SaveError> {
        let path = file.as_ref();

        self.ui.info("Uploading now");
        debug!("Preparing to send file {}", path.display());

        let provider = artifact.provider_token();
        let ping_url = UrlBuilder::build(artifact, &self.server)?;
        let post_url = format!("{}/{}/{}", ping_url, version, provider);

        // Size is captured once; the body never reads past it.
        let file = File::open(path).await?;
        let total = file.metadata().await?.len();

        let client = self.server.http_client()?;
        self.ping(&client, &ping_url).await?;

        debug!("Sending {} bytes to {}", total, post_url);

        self.ui.info_inline("Uploading");

        let mut tracker = ProgressTracker::new(total, self.ui.clone());
        tracker.start();

        let activity = Arc::new(Activity::new());
        let body_activity = activity.clone();
        let stream = ReaderStream::new(file.take(total)).inspect_ok(move |chunk| {
            body_activity.touch();
            tracker.advance(chunk.len() as u64);
        });

        let part = Part::stream_with_length(Body::wrap_stream(stream), total)
            .file_name(upload_file_name(path))
            .mime_str("application/octet-stream")?;
        let form = Form::new().part(BOX_FIELD, part);

        let request = client.post(&post_url).multipart(form).send();
        let result = until_idle(request, &activity, self.server.timeouts.read).await;
        self.ui.clear_line();

        let status = result
            .map_err(|idle| SaveError::UploadStalled {
                url: post_url.clone(),
                idle_secs: idle.as_secs(),
            })??
            .status();
        if status != StatusCode::OK {
            return Err(SaveError::UploadFailed {
                status: status.as_u16(),
            });
        }

        info!("Uploaded {} {} ({})", artifact.name, version, provider);
        self.ui.info("Upload successful");

        Ok(provider)
    }

    /// Check the box server answers an OPTIONS request with 200
    async fn ping(&self, client: &Client, url: &str) -> Result<(), SaveError> {
        debug!("Pinging {}", url);

        let response = client
            .request(Method::OPTIONS, url)
            .timeout(self.server.timeouts.request)
            .send()
            .await
            .map_err(|e| SaveError::ServerUnreachable {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(SaveError::ServerUnreachable {
                url: url.to_string(),
                reason: format!("status {}", status.as_u16()),
            });
        }

        Ok(())
    }
}

/// Time of the last chunk handed to the request body
struct Activity {
    last: Mutex<Instant>,
}

impl Activity {
    fn new() -> Self {
        Self {
            last: Mutex::new(Instant::now()),
        }
    }

    fn touch(&self) {
        if let Ok(mut last) = self.last.lock() {
            *last = Instant::now();
        }
    }

    fn last(&self) -> Instant {
        self.last.lock().map(|last| *last).unwrap_or_else(|e| *e.into_inner())
    }
}

/// Drive `fut` until it completes or `activity` stays quiet for `limit`
///
/// Once the body is fully sent the last touch stays put, so the same limit
/// bounds the wait for the response.
async fn until_idle<F: Future>(
    fut: F,
    activity: &Activity,
    limit: Duration,
) -> Result<F::Output, Duration> {
    tokio::pin!(fut);
    loop {
        let deadline = activity.last() + limit;
        tokio::select! {
            output = &mut fut => return Ok(output),
            _ = sleep_until(deadline) => {
                let idle = Instant::now().duration_since(activity.last());
                if idle >= limit {
                    return Err(idle);
                }
            }
        }
    }
}

fn upload_file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| format!("{}.box", BOX_FIELD))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_until_idle_resets_on_activity() {
        let activity = Arc::new(Activity::new());
        let ticker = activity.clone();
        let work = async move {
            for _ in 0..5 {
                tokio::time::sleep(Duration::from_millis(600)).await;
                ticker.touch();
            }
            "done"
        };

        let result = until_idle(work, &activity, Duration::from_secs(1)).await;
        assert_eq!(result, Ok("done"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_until_idle_gives_up_when_quiet() {
        let activity = Activity::new();
        let work = tokio::time::sleep(Duration::from_secs(5));

        let result = until_idle(work, &activity, Duration::from_secs(1)).await;
        assert!(matches!(result, Err(idle) if idle >= Duration::from_secs(1)));
    }

    #[test]
    fn test_upload_file_name() {
        assert_eq!(upload_file_name(Path::new("/tmp/build/package.box")), "package.box");
        assert_eq!(upload_file_name(Path::new("/")), "box.box");
    }
}
