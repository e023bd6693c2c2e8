use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::domain::error::StagingError;

/// Opaque reference to user-selected audio.
///
/// Wraps a URI rather than a path: the audio may live behind a content
/// provider or any other scheme a `SourceReader` knows how to open.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AudioSource(Url);

impl AudioSource {
    pub fn new(url: Url) -> Self {
        Self(url)
    }

    /// Parse a URI string such as `file:///music/song.wav` or `content://media/42`.
    pub fn parse(uri: &str) -> Result<Self, StagingError> {
        Url::parse(uri)
            .map(Self)
            .map_err(|e| StagingError::SourceUnreadable {
                reason: format!("invalid audio URI '{}': {}", uri, e),
            })
    }

    /// Build a `file://` source. Relative paths are resolved against the working directory.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, StagingError> {
        let path = path.as_ref();
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()
                .map_err(|e| StagingError::Io {
                    reason: e.to_string(),
                })?
                .join(path)
        };

        Url::from_file_path(&absolute)
            .map(Self)
            .map_err(|_| StagingError::SourceUnreadable {
                reason: format!("not a valid file path: {}", absolute.display()),
            })
    }

    pub fn url(&self) -> &Url {
        &self.0
    }

    pub fn scheme(&self) -> &str {
        self.0.scheme()
    }

    /// The local path behind a `file://` source, if this is one.
    pub fn to_file_path(&self) -> Option<PathBuf> {
        if self.scheme() == "file" {
            self.0.to_file_path().ok()
        } else {
            None
        }
    }
}

impl std::fmt::Display for AudioSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
