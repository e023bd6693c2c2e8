use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::app::model_lifecycle::ModelLifecycle;
use crate::app::staging::Stager;
use crate::domain::{AudioSource, Transcript, TranscriptionError};
use crate::ports::InferenceEngine;

/// Runs transcriptions one at a time against the shared engine.
///
/// Callers arriving while a job is in flight wait for the slot in FIFO order.
pub struct TranscriptionPipeline {
    model: Arc<ModelLifecycle>,
    engine: Arc<dyn InferenceEngine>,
    stager: Stager,
    slot: Arc<Semaphore>,
}

impl TranscriptionPipeline {
    pub fn new(model: Arc<ModelLifecycle>, engine: Arc<dyn InferenceEngine>, stager: Stager) -> Self {
        Self {
            model,
            engine,
            stager,
            slot: Arc::new(Semaphore::new(1)),
        }
    }

    pub fn model(&self) -> &ModelLifecycle {
        &self.model
    }

    pub fn stager(&self) -> &Stager {
        &self.stager
    }

    /// True while a transcription holds the engine.
    pub fn is_busy(&self) -> bool {
        self.slot.available_permits() == 0
    }

    /// Transcribe `source`.
    ///
    /// The staged copy is deleted and the slot released on every exit path.
    /// Both are moved into the blocking inference task, so if this future is
    /// dropped mid-inference they are released only once the engine returns.
    pub async fn transcribe(&self, source: &AudioSource) -> Result<Transcript, TranscriptionError> {
        self.model.ensure_ready().await?;

        let permit = Arc::clone(&self.slot)
            .acquire_owned()
            .await
            .map_err(|e| TranscriptionError::EngineFailure(format!("slot unavailable: {}", e)))?;
        debug!(source = %source, "Transcription slot acquired");

        let staged = self.stager.stage(source).await?;
        let engine = Arc::clone(&self.engine);
        let start = Instant::now();

        let result = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            let result = engine.transcribe(staged.path());
            if let Err(e) = staged.close() {
                warn!(error = %e, "Failed to delete staged audio");
            }
            result
        })
        .await
        .map_err(|e| TranscriptionError::EngineFailure(format!("Task join error: {}", e)))?;

        let mut transcript = result?;
        if transcript.is_empty() {
            warn!(source = %source, "Engine returned no text");
            return Err(TranscriptionError::EngineFailure(
                "engine returned no usable text".to_string(),
            ));
        }

        if transcript.duration_ms == 0 {
            transcript.duration_ms = start.elapsed().as_millis() as u64;
        }

        info!(
            source = %source,
            text_len = transcript.text.len(),
            segments = transcript.segments.len(),
            duration_ms = transcript.duration_ms,
            "Transcription complete"
        );

        Ok(transcript)
    }
}
