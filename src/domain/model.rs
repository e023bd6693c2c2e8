use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU8, Ordering};

/// Default bundled model, relative to the assets root and the data directory.
pub const DEFAULT_MODEL_ASSET: &str = "models/ggml-tiny.en.bin";

/// Lifecycle of the recognition model within one process.
///
/// State transitions:
/// - Unloaded -> Loading (first `ensure_ready`)
/// - Loading -> Ready | Failed
/// - Failed -> Loading (explicit `retry` only)
///
/// Ready and Failed never fall back to Unloaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum ModelPhase {
    /// Nothing has been copied or loaded yet.
    Unloaded = 0,
    /// A load is in flight; other callers wait on it.
    Loading = 1,
    /// The model is loaded in the engine.
    Ready = 2,
    /// The last load failed; cached until retried.
    Failed = 3,
}

impl ModelPhase {
    #[must_use]
    pub fn is_settled(&self) -> bool {
        matches!(self, ModelPhase::Ready | ModelPhase::Failed)
    }
}

impl From<u8> for ModelPhase {
    fn from(value: u8) -> Self {
        match value {
            0 => ModelPhase::Unloaded,
            1 => ModelPhase::Loading,
            2 => ModelPhase::Ready,
            _ => ModelPhase::Failed,
        }
    }
}

impl From<ModelPhase> for u8 {
    fn from(phase: ModelPhase) -> Self {
        phase as u8
    }
}

/// Atomic wrapper for ModelPhase so status reads never wait on a load.
#[derive(Debug)]
pub struct AtomicModelPhase(AtomicU8);

impl AtomicModelPhase {
    pub fn new(phase: ModelPhase) -> Self {
        Self(AtomicU8::new(phase.into()))
    }

    pub fn load(&self) -> ModelPhase {
        self.0.load(Ordering::Acquire).into()
    }

    pub fn store(&self, phase: ModelPhase) {
        self.0.store(phase.into(), Ordering::Release);
    }
}

impl Default for AtomicModelPhase {
    fn default() -> Self {
        Self::new(ModelPhase::Unloaded)
    }
}
