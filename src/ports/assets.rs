use std::io::{self, Read};

/// Port for read-only bundled resources such as `models/ggml-tiny.en.bin`.
pub trait ModelAssets: Send + Sync {
    /// Open the named asset as a byte stream.
    ///
    /// A missing asset must be reported as `io::ErrorKind::NotFound`.
    fn open(&self, name: &str) -> io::Result<Box<dyn Read + Send>>;
}
