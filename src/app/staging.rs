use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempPath;
use tracing::{debug, info, warn};

use crate::domain::{AudioSource, StagingError};
use crate::ports::SourceReader;

/// Subdirectory of the configured staging root that this crate owns outright.
pub const OWNED_DIR: &str = "lyricsync-staging";

const STAGED_PREFIX: &str = "audio";
const STAGED_SUFFIX: &str = ".wav";

/// Local copy of an audio source's bytes.
///
/// The file is deleted when this value is dropped, on every exit path.
#[derive(Debug)]
pub struct StagedFile {
    path: TempPath,
    bytes: u64,
}

impl StagedFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> u64 {
        self.bytes
    }

    pub fn is_empty(&self) -> bool {
        self.bytes == 0
    }

    /// Delete the file now, reporting any error instead of ignoring it.
    pub fn close(self) -> io::Result<()> {
        self.path.close()
    }
}

/// Copies audio sources into uniquely named files under a staging directory.
///
/// Files go into `<root>/lyricsync-staging/`; nothing else under `root` is
/// ever written or removed, so `root` may be a directory the user shares.
#[derive(Clone)]
pub struct Stager {
    reader: Arc<dyn SourceReader>,
    dir: PathBuf,
}

impl Stager {
    pub fn new(reader: Arc<dyn SourceReader>, root: PathBuf) -> Self {
        Self {
            reader,
            dir: root.join(OWNED_DIR),
        }
    }

    /// The owned directory staged files are written to.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Stage `source` on the blocking pool.
    pub async fn stage(&self, source: &AudioSource) -> Result<StagedFile, StagingError> {
        let stager = self.clone();
        let source = source.clone();
        tokio::task::spawn_blocking(move || stager.stage_blocking(&source))
            .await
            .map_err(|e| StagingError::Io {
                reason: format!("Task join error: {}", e),
            })?
    }

    /// Stream-copy `source` into a fresh file. A partial file never survives an error.
    pub fn stage_blocking(&self, source: &AudioSource) -> Result<StagedFile, StagingError> {
        let mut input = self
            .reader
            .open(source)
            .map_err(|e| StagingError::SourceUnreadable {
                reason: format!("{}: {}", source, e),
            })?;

        fs::create_dir_all(&self.dir).map_err(|e| io_error("create staging dir", e))?;

        // NamedTempFile deletes itself on drop, so every `?` below cleans up.
        let mut file = tempfile::Builder::new()
            .prefix(STAGED_PREFIX)
            .suffix(STAGED_SUFFIX)
            .tempfile_in(&self.dir)
            .map_err(|e| io_error("create staged file", e))?;

        let bytes = io::copy(&mut input, &mut file).map_err(|e| io_error("copy source", e))?;
        file.flush().map_err(|e| io_error("flush staged file", e))?;

        let path = file.into_temp_path();
        debug!(source = %source, path = ?path, bytes, "Audio staged");

        Ok(StagedFile { path, bytes })
    }

    /// Remove staged files left behind by a previous process that did not exit cleanly.
    ///
    /// Only the owned directory is scanned.
    pub fn sweep(&self) -> usize {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(_) => return 0,
        };

        let mut removed = 0;
        for entry in entries.flatten() {
            let path = entry.path();
            let is_staged = path
                .file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.starts_with(STAGED_PREFIX) && n.ends_with(STAGED_SUFFIX))
                .unwrap_or(false);

            if !is_staged || !path.is_file() {
                continue;
            }

            match fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) => warn!(path = ?path, error = %e, "Failed to remove stale staged file"),
            }
        }

        if removed > 0 {
            info!(dir = ?self.dir, removed, "Removed stale staged audio");
        }
        removed
    }
}

fn io_error(action: &str, err: io::Error) -> StagingError {
    StagingError::Io {
        reason: format!("{}: {}", action, err),
    }
}
