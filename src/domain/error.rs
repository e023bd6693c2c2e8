use serde::Serialize;
use thiserror::Error;

use crate::domain::playback::PlaybackState;

/// Failure while copying an audio source into a local staged file.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StagingError {
    #[error("Audio source unreadable: {reason}")]
    SourceUnreadable { reason: String },

    #[error("Staging I/O failed: {reason}")]
    Io { reason: String },
}

impl StagingError {
    pub fn reason(&self) -> &str {
        match self {
            StagingError::SourceUnreadable { reason } | StagingError::Io { reason } => reason,
        }
    }
}

/// Failure while materializing or loading the recognition model.
///
/// Cloneable so every caller waiting on the same load observes the same outcome.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("Model asset not found: {0}")]
    AssetMissing(String),

    #[error("Model asset copy failed: {0}")]
    CopyFailed(String),

    #[error("Model load failed: {0}")]
    LoadFailed(String),
}

/// Errors reported by an inference engine implementation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("No model loaded")]
    ModelNotLoaded,

    #[error("Failed to load model: {0}")]
    ModelLoad(String),

    #[error("Unreadable audio: {0}")]
    Audio(String),

    #[error("Inference failed: {0}")]
    Inference(String),
}

/// Pipeline stage at which a transcription attempt failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TranscriptionStage {
    Input,
    Model,
    Staging,
    Inference,
}

impl std::fmt::Display for TranscriptionStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TranscriptionStage::Input => "input",
            TranscriptionStage::Model => "model",
            TranscriptionStage::Staging => "staging",
            TranscriptionStage::Inference => "inference",
        };
        f.write_str(name)
    }
}

/// Errors surfaced by the transcription pipeline. All are recoverable by retrying later.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TranscriptionError {
    #[error("Model unavailable: {0}")]
    ModelUnavailable(#[source] ModelError),

    #[error("Staging failed: {0}")]
    StagingFailed(String),

    #[error("Audio source unreadable: {0}")]
    SourceUnreadable(String),

    #[error("Engine failure: {0}")]
    EngineFailure(String),

    #[error("Lyrics text is empty")]
    EmptyLyrics,
}

impl TranscriptionError {
    pub fn stage(&self) -> TranscriptionStage {
        match self {
            TranscriptionError::ModelUnavailable(_) => TranscriptionStage::Model,
            TranscriptionError::StagingFailed(_) | TranscriptionError::SourceUnreadable(_) => {
                TranscriptionStage::Staging
            }
            TranscriptionError::EngineFailure(_) => TranscriptionStage::Inference,
            TranscriptionError::EmptyLyrics => TranscriptionStage::Input,
        }
    }

    pub fn reason(&self) -> String {
        match self {
            TranscriptionError::ModelUnavailable(e) => e.to_string(),
            TranscriptionError::StagingFailed(reason)
            | TranscriptionError::SourceUnreadable(reason)
            | TranscriptionError::EngineFailure(reason) => reason.clone(),
            TranscriptionError::EmptyLyrics => "no lyric lines supplied".to_string(),
        }
    }
}

impl From<ModelError> for TranscriptionError {
    fn from(err: ModelError) -> Self {
        TranscriptionError::ModelUnavailable(err)
    }
}

impl From<StagingError> for TranscriptionError {
    fn from(err: StagingError) -> Self {
        match err {
            StagingError::SourceUnreadable { reason } => TranscriptionError::SourceUnreadable(reason),
            StagingError::Io { reason } => TranscriptionError::StagingFailed(reason),
        }
    }
}

impl From<EngineError> for TranscriptionError {
    fn from(err: EngineError) -> Self {
        TranscriptionError::EngineFailure(err.to_string())
    }
}

/// Errors surfaced by the playback controller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlaybackError {
    #[error("Failed to prepare audio output: {0}")]
    PrepareFailed(String),

    #[error("Playback session is not prepared yet")]
    NotPrepared,

    #[error("Cannot {op} while {state:?}")]
    InvalidState {
        op: &'static str,
        state: PlaybackState,
    },

    #[error("Playback controller has been released")]
    Released,

    #[error("Playback session was superseded before it was prepared")]
    Superseded,

    #[error("Audio output error: {0}")]
    Output(String),

    #[error("Runtime unavailable: {0}")]
    Runtime(String),
}

/// Crate-level errors for configuration, storage and wiring.
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error(transparent)]
    Staging(#[from] StagingError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Transcription(#[from] TranscriptionError),

    #[error(transparent)]
    Playback(#[from] PlaybackError),
}

impl From<std::io::Error> for DomainError {
    fn from(err: std::io::Error) -> Self {
        DomainError::Io(err.to_string())
    }
}

impl From<toml::de::Error> for DomainError {
    fn from(err: toml::de::Error) -> Self {
        DomainError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for DomainError {
    fn from(err: toml::ser::Error) -> Self {
        DomainError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::Serialization(err.to_string())
    }
}
