//! Media materialization
//!
//! Image URIs found during extraction are turned into local file paths here.
//! Each asset is named after the last segment of its URI path; an asset whose
//! file already exists is not fetched again. A failed download is logged and
//! skipped without affecting the record it belongs to.

use reqwest::{Client, StatusCode};
use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;

/// File extensions accepted as images
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "webp"];

#[derive(Debug, Error)]
enum MediaError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("unexpected status {0}")]
    Status(u16),

    #[error("failed to write {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },
}

/// Downloads media assets into a directory, or passes URIs through when
/// downloading is disabled
#[derive(Debug, Clone)]
pub struct MediaStore {
    client: Client,
    directory: PathBuf,
    download: bool,
}

impl MediaStore {
    pub fn new(client: Client, directory: impl Into<PathBuf>) -> Self {
        Self {
            client,
            directory: directory.into(),
            download: true,
        }
    }

    /// A store that records accepted URIs without fetching them
    pub fn disabled() -> Self {
        Self {
            client: Client::new(),
            directory: PathBuf::new(),
            download: false,
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Returns the reference to record for `uri`, or `None` when the asset is
    /// not an accepted image or could not be stored
    pub async fn materialize(&self, uri: &str) -> Option<String> {
        let filename = filename_for(uri)?;
        if !self.download {
            return Some(uri.to_string());
        }

        let path = self.directory.join(&filename);
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            tracing::trace!(file = %path.display(), "Media already stored");
            return Some(path.display().to_string());
        }

        match self.download_to(uri, &path).await {
            Ok(()) => {
                tracing::debug!(file = %path.display(), "Stored media asset");
                Some(path.display().to_string())
            }
            Err(e) => {
                tracing::warn!(uri = %uri, "Skipping media asset: {}", e);
                None
            }
        }
    }

    /// Materializes every URI in order, dropping the ones that fail
    pub async fn materialize_all(&self, uris: &[String]) -> Vec<String> {
        let mut stored = Vec::with_capacity(uris.len());
        for uri in uris {
            if let Some(path) = self.materialize(uri).await {
                stored.push(path);
            }
        }
        stored
    }

    async fn download_to(&self, uri: &str, path: &Path) -> Result<(), MediaError> {
        let response = self.client.get(uri).send().await?;
        let status = response.status();
        if status != StatusCode::OK {
            return Err(MediaError::Status(status.as_u16()));
        }
        let bytes = response.bytes().await?;

        let write_err = |source: std::io::Error| MediaError::Write {
            path: path.display().to_string(),
            source,
        };
        tokio::fs::create_dir_all(&self.directory)
            .await
            .map_err(write_err)?;
        tokio::fs::write(path, &bytes).await.map_err(write_err)?;
        Ok(())
    }
}

/// Local filename for a media URI: the last path segment, query stripped
///
/// Returns `None` when the URI does not parse or does not end in an accepted
/// image extension.
pub fn filename_for(uri: &str) -> Option<String> {
    let url = Url::parse(uri).ok()?;
    let name = url.path_segments()?.last()?.to_string();
    let (_, extension) = name.rsplit_once('.')?;
    let extension = extension.to_ascii_lowercase();

    if IMAGE_EXTENSIONS.contains(&extension.as_str()) {
        Some(name)
    } else {
        None
    }
}
