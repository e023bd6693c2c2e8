use std::fs::File;
use std::io::{self, BufReader, Read};

use tracing::debug;

use crate::domain::AudioSource;
use crate::ports::SourceReader;

/// Reads `file://` sources from the local filesystem.
///
/// Other schemes belong to platform-specific readers and are reported as
/// `io::ErrorKind::Unsupported`.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileSourceReader;

impl FileSourceReader {
    pub fn new() -> Self {
        Self
    }
}

impl SourceReader for FileSourceReader {
    fn open(&self, source: &AudioSource) -> io::Result<Box<dyn Read + Send>> {
        let path = source.to_file_path().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::Unsupported,
                format!("unsupported source scheme: {}", source.scheme()),
            )
        })?;
        debug!(path = ?path, "Opening audio source");
        Ok(Box::new(BufReader::new(File::open(path)?)))
    }
}
