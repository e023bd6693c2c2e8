use serde::{Deserialize, Serialize};

/// One timed span of recognized text, as reported by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    pub start_ms: u64,
    pub end_ms: u64,
    pub text: String,
}

/// Result of a transcription.
///
/// Text and segment timing are passed through from the engine unmodified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    /// Full transcribed text.
    pub text: String,
    /// Timed segments in playback order.
    pub segments: Vec<TranscriptSegment>,
    /// Detected language (ISO 639-1 code).
    pub detected_language: Option<String>,
    /// Inference duration in milliseconds.
    pub duration_ms: u64,
}

impl Transcript {
    /// A transcript with a single untimed segment.
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            segments: vec![TranscriptSegment {
                start_ms: 0,
                end_ms: 0,
                text: text.clone(),
            }],
            text,
            detected_language: None,
            duration_ms: 0,
        }
    }

    /// True when the engine produced no usable text.
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// End of the last timed segment.
    pub fn end_ms(&self) -> u64 {
        self.segments.iter().map(|s| s.end_ms).max().unwrap_or(0)
    }
}
