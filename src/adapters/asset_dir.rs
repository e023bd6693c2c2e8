use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Component, Path, PathBuf};

use tracing::debug;

use crate::ports::ModelAssets;

/// Bundled assets served from a directory on disk.
pub struct DirModelAssets {
    root: PathBuf,
}

impl DirModelAssets {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve `name` under the root, refusing names that escape it.
    fn resolve(&self, name: &str) -> io::Result<PathBuf> {
        let relative = Path::new(name);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes || name.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid asset name: {}", name),
            ));
        }
        Ok(self.root.join(relative))
    }
}

impl ModelAssets for DirModelAssets {
    fn open(&self, name: &str) -> io::Result<Box<dyn Read + Send>> {
        let path = self.resolve(name)?;
        debug!(path = ?path, "Opening bundled asset");
        Ok(Box::new(BufReader::new(File::open(path)?)))
    }
}
