pub mod audio;
pub mod config;
pub mod error;
pub mod lyrics;
pub mod model;
pub mod playback;
pub mod source;
pub mod transcription;

pub use audio::PcmAudio;
pub use config::{AppConfig, LoggingConfig, ModelConfig, PlaybackConfig, StorageConfig, TranscriptionConfig};
pub use error::{
    DomainError, EngineError, ModelError, PlaybackError, StagingError, TranscriptionError,
    TranscriptionStage,
};
pub use lyrics::{LyricSheet, TimedLine, TimedLyrics};
pub use model::{AtomicModelPhase, ModelPhase};
pub use playback::{PlaybackEvent, PlaybackState};
pub use source::AudioSource;
pub use transcription::{Transcript, TranscriptSegment};
