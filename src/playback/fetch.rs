use tracing::debug;

use super::engine::{Clip, PlaybackError};
use crate::catalog::Location;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MediaError {
    #[error("cannot resolve media path \"{0}\"")]
    Unresolvable(String),
    #[error("{location}: {reason}")]
    Unavailable { location: String, reason: String },
}

impl From<MediaError> for PlaybackError {
    fn from(err: MediaError) -> Self {
        Self::NotFound(err.to_string())
    }
}

/// Reads audio and icon files relative to the catalog's site root.
#[derive(Debug, Clone)]
pub struct MediaFetcher {
    client: reqwest::Client,
    root: Location,
}

impl MediaFetcher {
    pub fn new(client: reqwest::Client, root: Location) -> Self {
        Self { client, root }
    }

    pub fn resolve(&self, path: &str) -> Result<Location, MediaError> {
        self.root
            .join(path)
            .ok_or_else(|| MediaError::Unresolvable(path.to_owned()))
    }

    pub async fn fetch(&self, path: &str) -> Result<Vec<u8>, MediaError> {
        let location = self.resolve(path)?;
        debug!(%location, "fetching media");
        let unavailable = |reason: String| MediaError::Unavailable {
            location: location.to_string(),
            reason,
        };

        match &location {
            Location::Remote(url) => self
                .client
                .get(url.clone())
                .send()
                .await
                .map_err(|e| unavailable(e.to_string()))?
                .error_for_status()
                .map_err(|e| unavailable(e.to_string()))?
                .bytes()
                .await
                .map(|b| b.to_vec())
                .map_err(|e| unavailable(e.to_string())),
            Location::Local(path) => tokio::fs::read(path)
                .await
                .map_err(|e| unavailable(e.to_string())),
        }
    }

    /// Fetch an audio clip for playback. Every failure is a missing resource.
    pub async fn fetch_clip(&self, path: &str) -> Result<Clip, PlaybackError> {
        let clip = Clip::from(self.fetch(path).await?);
        if clip.is_empty() {
            return Err(PlaybackError::NotFound(format!("{path} is empty")));
        }
        Ok(clip)
    }
}
