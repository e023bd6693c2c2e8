use std::io::{self, Read};

use crate::domain::AudioSource;

/// Port for resolving an `AudioSource` to its bytes.
///
/// Implementations decide which URI schemes they understand; the source is
/// never assumed to be a local file.
pub trait SourceReader: Send + Sync {
    fn open(&self, source: &AudioSource) -> io::Result<Box<dyn Read + Send>>;
}
