//! Terminal and file surfaces for the binary.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use backdrop_core::{AppError, NetworkError, ReqwestErrorExt};
use backdrop_view::{ImageSurface, LoadSignal, TextSurface};
use parking_lot::Mutex;

#[derive(Debug, Default)]
struct StatusText {
    time: String,
    location: String,
}

/// One terminal line holding the clock and the location, redrawn in place
#[derive(Debug, Clone, Default)]
pub struct StatusLine {
    text: Arc<Mutex<StatusText>>,
}

#[derive(Debug, Clone, Copy)]
enum Slot {
    Time,
    Location,
}

impl StatusLine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn time(&self) -> StatusField {
        StatusField {
            line: self.clone(),
            slot: Slot::Time,
        }
    }

    pub fn location(&self) -> StatusField {
        StatusField {
            line: self.clone(),
            slot: Slot::Location,
        }
    }

    fn redraw(&self) {
        let text = self.text.lock();
        let mut out = std::io::stdout().lock();
        // The status line is cosmetic; a closed or broken stdout must not
        // take down the clock task, so write errors are dropped
        let _ = write!(out, "\r\x1b[2K{}  {}", text.time, text.location);
        let _ = out.flush();
    }
}

/// A [`TextSurface`] writing into one slot of a [`StatusLine`]
#[derive(Debug, Clone)]
pub struct StatusField {
    line: StatusLine,
    slot: Slot,
}

impl TextSurface for StatusField {
    fn set_text(&self, text: &str) {
        {
            let mut state = self.line.text.lock();
            match self.slot {
                Slot::Time => state.time = text.to_string(),
                Slot::Location => state.location = text.to_string(),
            }
        }
        self.line.redraw();
    }
}

/// Downloads the revealed photo to a file, then signals load completion
pub struct DownloadSurface {
    client: reqwest::Client,
    path: PathBuf,
    runtime: tokio::runtime::Handle,
}

impl DownloadSurface {
    pub fn new(path: PathBuf) -> Result<Self> {
        let runtime = tokio::runtime::Handle::try_current()
            .context("Download surface needs a running tokio runtime")?;
        let client = reqwest::Client::builder()
            .build()
            .context("Failed to create photo client")?;

        Ok(Self {
            client,
            path,
            runtime,
        })
    }
}

async fn download(client: &reqwest::Client, url: &str, path: &Path) -> Result<(), AppError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| e.into_network_error())?;

    let status = response.status();
    if !status.is_success() {
        return Err(NetworkError::ServerError {
            status: status.as_u16(),
            message: format!("photo service returned {}", status),
        }
        .into());
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| e.into_network_error())?;
    if bytes.is_empty() {
        return Err(NetworkError::InvalidResponse("empty photo body".to_string()).into());
    }

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, &bytes).await?;
    tracing::info!("Saved photo ({} bytes) to {}", bytes.len(), path.display());
    Ok(())
}

impl ImageSurface for DownloadSurface {
    fn assign(&self, url: &str, loaded: LoadSignal) {
        let client = self.client.clone();
        let path = self.path.clone();
        let url = url.to_string();

        self.runtime.spawn(async move {
            match download(&client, &url, &path).await {
                Ok(()) => {
                    loaded.fire();
                }
                Err(e) => {
                    // No load signal: the clock and label stay hidden
                    tracing::warn!("Photo failed to load: {} ({})", e.user_message(), e);
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fields_write_their_own_slot() {
        let line = StatusLine::new();
        line.time().set_text("10:00:00");
        line.location().set_text("Namaste!");
        line.time().set_text("10:00:01");

        let text = line.text.lock();
        assert_eq!(text.time, "10:00:01");
        assert_eq!(text.location, "Namaste!");
    }

    #[tokio::test]
    async fn test_download_surface_needs_runtime_only_at_construction() {
        let dir = std::env::temp_dir().join("backdrop-surface-test.jpg");
        assert!(DownloadSurface::new(dir).is_ok());
    }

    #[test]
    fn test_download_surface_without_runtime_fails() {
        assert!(DownloadSurface::new(PathBuf::from("photo.jpg")).is_err());
    }
}
