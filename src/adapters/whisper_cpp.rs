use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::RwLock;
use tracing::{debug, info};
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

use crate::adapters::wav::decode_wav_file;
use crate::domain::audio::WHISPER_SAMPLE_RATE;
use crate::domain::{EngineError, Transcript, TranscriptSegment, TranscriptionConfig};
use crate::ports::InferenceEngine;

/// Inference engine backed by whisper.cpp via whisper-rs.
pub struct WhisperCppEngine {
    context: RwLock<Option<Arc<WhisperContext>>>,
    threads: u32,
    language: Option<String>,
}

impl WhisperCppEngine {
    /// `threads == 0` means auto-detect (cores - 1).
    pub fn new(threads: u32, language: Option<String>) -> Self {
        let actual_threads = if threads == 0 {
            std::thread::available_parallelism()
                .map(|p| std::cmp::max(1, p.get() as u32 - 1))
                .unwrap_or(1)
        } else {
            threads
        };

        info!(threads = actual_threads, language = ?language, "WhisperCppEngine created");

        Self {
            context: RwLock::new(None),
            threads: actual_threads,
            language,
        }
    }

    pub fn from_config(config: &TranscriptionConfig) -> Self {
        Self::new(config.threads, config.language_hint())
    }

    pub fn threads(&self) -> u32 {
        self.threads
    }

    /// whisper.cpp reports segment bounds in centiseconds.
    fn centis_to_ms(t: i64) -> u64 {
        t.max(0) as u64 * 10
    }
}

impl InferenceEngine for WhisperCppEngine {
    fn load_model(&self, path: &Path) -> Result<(), EngineError> {
        if !path.exists() {
            return Err(EngineError::ModelLoad(format!(
                "model file not found: {}",
                path.display()
            )));
        }

        info!(path = ?path, "Loading whisper model");
        let path_str = path.to_string_lossy();
        let ctx = WhisperContext::new_with_params(&path_str, WhisperContextParameters::default())
            .map_err(|e| EngineError::ModelLoad(e.to_string()))?;

        *self.context.write() = Some(Arc::new(ctx));
        info!(path = ?path, "Whisper model loaded");
        Ok(())
    }

    fn transcribe(&self, path: &Path) -> Result<Transcript, EngineError> {
        let ctx = self
            .context
            .read()
            .clone()
            .ok_or(EngineError::ModelNotLoaded)?;

        let audio = decode_wav_file(path)
            .map_err(|e| EngineError::Audio(format!("{}: {}", path.display(), e)))?
            .resampled(WHISPER_SAMPLE_RATE);
        if audio.is_empty() {
            return Ok(Transcript {
                text: String::new(),
                segments: Vec::new(),
                detected_language: None,
                duration_ms: 0,
            });
        }

        debug!(
            samples = audio.len(),
            audio_ms = audio.duration_ms(),
            threads = self.threads,
            "Starting transcription"
        );
        let start = Instant::now();

        let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
        params.set_n_threads(self.threads as i32);
        params.set_print_progress(false);
        params.set_print_realtime(false);
        params.set_print_timestamps(false);
        params.set_language(Some(self.language.as_deref().unwrap_or("auto")));

        let mut state = ctx
            .create_state()
            .map_err(|e| EngineError::Inference(format!("Failed to create whisper state: {}", e)))?;
        state
            .full(params, audio.samples())
            .map_err(|e| EngineError::Inference(e.to_string()))?;

        let num_segments = state
            .full_n_segments()
            .map_err(|e| EngineError::Inference(format!("Failed to get segment count: {}", e)))?;

        let mut segments = Vec::with_capacity(num_segments.max(0) as usize);
        for i in 0..num_segments {
            let text = state
                .full_get_segment_text(i)
                .map_err(|e| EngineError::Inference(format!("Failed to get segment text: {}", e)))?;
            let t0 = state.full_get_segment_t0(i).unwrap_or(0);
            let t1 = state.full_get_segment_t1(i).unwrap_or(t0);
            segments.push(TranscriptSegment {
                start_ms: Self::centis_to_ms(t0),
                end_ms: Self::centis_to_ms(t1),
                text,
            });
        }

        let text = segments
            .iter()
            .map(|s| s.text.as_str())
            .collect::<String>()
            .trim()
            .to_string();

        let detected_language = state
            .full_lang_id_from_state()
            .ok()
            .and_then(|id| whisper_rs::get_lang_str(id).map(|s| s.to_string()));

        let duration_ms = start.elapsed().as_millis() as u64;
        info!(
            text_len = text.len(),
            segments = segments.len(),
            duration_ms,
            detected_language = ?detected_language,
            "Whisper inference complete"
        );

        Ok(Transcript {
            text,
            segments,
            detected_language,
            duration_ms,
        })
    }

    fn is_model_loaded(&self) -> bool {
        self.context.read().is_some()
    }
}
