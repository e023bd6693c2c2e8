use std::path::Path;

use crate::domain::{EngineError, Transcript};

/// Port for the offline speech-recognition engine.
///
/// Both calls are blocking, potentially slow and not reentrant. Callers are
/// responsible for running them off the async executor, loading before
/// transcribing, and never invoking `transcribe` concurrently.
pub trait InferenceEngine: Send + Sync {
    /// Load the model at `path` into the engine.
    fn load_model(&self, path: &Path) -> Result<(), EngineError>;

    /// Transcribe the audio file at `path`.
    ///
    /// An empty transcript is a valid engine answer; the pipeline decides
    /// whether it is usable.
    fn transcribe(&self, path: &Path) -> Result<Transcript, EngineError>;

    /// Check if a model is currently loaded.
    fn is_model_loaded(&self) -> bool;
}
