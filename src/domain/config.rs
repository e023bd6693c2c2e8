use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::model::DEFAULT_MODEL_ASSET;
use crate::domain::playback::DEFAULT_POSITION_INTERVAL_MS;

/// Recognition model configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Bundled asset name, e.g. "models/ggml-tiny.en.bin".
    pub asset_name: String,
    /// Root of the bundled assets. Defaults to `<data_dir>/assets`.
    pub assets_dir: Option<PathBuf>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            asset_name: DEFAULT_MODEL_ASSET.to_string(),
            assets_dir: None,
        }
    }
}

/// Transcription configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionConfig {
    /// Language code (e.g., "en", "tr", "auto").
    pub language: String,
    /// Number of threads to use (0 = auto).
    pub threads: u32,
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            language: "auto".to_string(),
            threads: 0,
        }
    }
}

impl TranscriptionConfig {
    /// Language to pass to the engine; None means auto-detect.
    pub fn language_hint(&self) -> Option<String> {
        match self.language.trim() {
            "" | "auto" => None,
            lang => Some(lang.to_string()),
        }
    }
}

/// Playback preview configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// PositionFeed sampling interval in milliseconds.
    pub position_interval_ms: u64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            position_interval_ms: DEFAULT_POSITION_INTERVAL_MS,
        }
    }
}

impl PlaybackConfig {
    pub fn position_interval(&self) -> Duration {
        Duration::from_millis(self.position_interval_ms.max(1))
    }
}

/// Storage locations. Unset paths fall back to the OS data directory.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StorageConfig {
    /// Where the model is materialized.
    pub data_dir: Option<PathBuf>,
    /// Where staged audio copies are written. Defaults to `<data_dir>/staging`.
    pub staging_dir: Option<PathBuf>,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    pub level: String,
    /// Enable file logging with rotation.
    pub file_logging: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file_logging: true,
        }
    }
}

/// Main configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub model: ModelConfig,
    pub transcription: TranscriptionConfig,
    pub playback: PlaybackConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Create a new AppConfig with default values.
    pub fn new() -> Self {
        Self::default()
    }
}
