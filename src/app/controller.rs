use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;

use crate::adapters::{CpalOutputFactory, DirModelAssets, FileSourceReader, WhisperCppEngine};
use crate::app::model_lifecycle::ModelLifecycle;
use crate::app::pipeline::TranscriptionPipeline;
use crate::app::playback::PlaybackController;
use crate::app::staging::Stager;
use crate::domain::{
    AppConfig, AudioSource, DomainError, LyricSheet, ModelError, ModelPhase, TimedLyrics,
    Transcript, TranscriptionError,
};
use crate::infrastructure::init_logging;
use crate::ports::{AudioOutputFactory, ConfigStore, InferenceEngine, ModelAssets, SourceReader};

/// Adapters the controller is assembled from.
pub struct Components {
    pub engine: Arc<dyn InferenceEngine>,
    pub assets: Arc<dyn ModelAssets>,
    pub reader: Arc<dyn SourceReader>,
    pub output: Arc<dyn AudioOutputFactory>,
}

/// Application controller: owns the transcription pipeline and the playback
/// preview for one process.
pub struct AppController {
    config: AppConfig,
    data_dir: PathBuf,
    pipeline: TranscriptionPipeline,
    playback: PlaybackController,
    _log_guard: Option<WorkerGuard>,
}

impl AppController {
    /// Build the controller with the shipped adapters.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(config: AppConfig, data_dir: PathBuf, logs_dir: PathBuf) -> Result<Self, DomainError> {
        let data_dir = config.storage.data_dir.clone().unwrap_or(data_dir);
        fs::create_dir_all(&data_dir)?;

        let log_guard = init_logging(
            &logs_dir,
            &config.logging.level,
            config.logging.file_logging,
        )?;
        info!("LyricSync starting up");

        let assets_dir = config
            .model
            .assets_dir
            .clone()
            .unwrap_or_else(|| data_dir.join("assets"));
        let reader: Arc<dyn SourceReader> = Arc::new(FileSourceReader::new());
        let components = Components {
            engine: Arc::new(WhisperCppEngine::from_config(&config.transcription)),
            assets: Arc::new(DirModelAssets::new(assets_dir)),
            output: Arc::new(CpalOutputFactory::new(Arc::clone(&reader))),
            reader,
        };

        let mut controller = Self::with_components(config, data_dir, components)?;
        controller._log_guard = log_guard;
        Ok(controller)
    }

    /// Load configuration through `store`, then build as `new` does.
    pub fn from_store(store: &dyn ConfigStore) -> Result<Self, DomainError> {
        let mut config = store.load()?;
        if config.storage.staging_dir.is_none() && config.storage.data_dir.is_none() {
            config.storage.staging_dir = Some(store.staging_dir());
        }
        Self::new(config, store.data_dir(), store.logs_dir())
    }

    /// Assemble from explicit adapters. Does not install logging.
    pub fn with_components(
        config: AppConfig,
        data_dir: PathBuf,
        components: Components,
    ) -> Result<Self, DomainError> {
        let staging_dir = config
            .storage
            .staging_dir
            .clone()
            .unwrap_or_else(|| data_dir.join("staging"));

        let model = Arc::new(ModelLifecycle::new(
            Arc::clone(&components.engine),
            components.assets,
            config.model.asset_name.clone(),
            &data_dir,
        ));

        let stager = Stager::new(components.reader, staging_dir);
        let stale = stager.sweep();
        if stale > 0 {
            warn!(removed = stale, "Previous session left staged audio behind");
        }

        let pipeline = TranscriptionPipeline::new(model, components.engine, stager);
        let playback = PlaybackController::new(components.output, &config.playback)?;

        info!(
            data_dir = ?data_dir,
            asset = %config.model.asset_name,
            "AppController initialized"
        );

        Ok(Self {
            config,
            data_dir,
            pipeline,
            playback,
            _log_guard: None,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn staging_dir(&self) -> &Path {
        self.pipeline.stager().dir()
    }

    pub fn model_path(&self) -> &Path {
        self.pipeline.model().model_path()
    }

    pub fn model_phase(&self) -> ModelPhase {
        self.pipeline.model().phase()
    }

    /// Copy and load the model if needed. Safe to call eagerly at startup.
    pub async fn ensure_model_ready(&self) -> Result<(), ModelError> {
        self.pipeline.model().ensure_ready().await
    }

    /// Try again after a failed model load.
    pub async fn retry_model(&self) -> Result<(), ModelError> {
        self.pipeline.model().retry().await
    }

    pub fn is_transcribing(&self) -> bool {
        self.pipeline.is_busy()
    }

    pub async fn transcribe(&self, source: &AudioSource) -> Result<Transcript, TranscriptionError> {
        self.pipeline.transcribe(source).await
    }

    /// Transcribe `source` and time each non-blank line of `lyrics` against it.
    ///
    /// Lyrics with no text are rejected before any model or engine work.
    pub async fn transcribe_lyrics(
        &self,
        source: &AudioSource,
        lyrics: &str,
    ) -> Result<TimedLyrics, TranscriptionError> {
        let sheet = LyricSheet::parse(lyrics);
        if sheet.is_empty() {
            return Err(TranscriptionError::EmptyLyrics);
        }

        let transcript = self.pipeline.transcribe(source).await?;
        let timed = sheet.align(&transcript);
        info!(lines = timed.lines().len(), "Lyrics timed");
        Ok(timed)
    }

    pub fn playback(&self) -> &PlaybackController {
        &self.playback
    }
}
