use tokio::sync::mpsc;

use crate::domain::{AudioSource, PlaybackError};

/// Notifications an audio output delivers asynchronously.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputEvent {
    /// Preparation finished; duration is known.
    Prepared { duration_ms: u64 },
    /// Playback reached the end of the source.
    Completed,
    /// Preparation or playback failed.
    Error { message: String },
}

/// Handle an audio output uses to notify its controller.
///
/// Every event is tagged with the session generation it was created for, so
/// notifications from a superseded session can be recognized and dropped.
#[derive(Debug, Clone)]
pub struct OutputEventSender {
    generation: u64,
    tx: mpsc::UnboundedSender<(u64, OutputEvent)>,
}

impl OutputEventSender {
    pub(crate) fn new(generation: u64, tx: mpsc::UnboundedSender<(u64, OutputEvent)>) -> Self {
        Self { generation, tx }
    }

    /// Deliver an event. Returns false once the controller is gone.
    pub fn send(&self, event: OutputEvent) -> bool {
        self.tx.send((self.generation, event)).is_ok()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// One native audio-output resource bound to one source.
///
/// Position queries are only valid after `OutputEvent::Prepared` was sent.
pub trait AudioOutput: Send {
    fn play(&mut self) -> Result<(), PlaybackError>;

    fn pause(&mut self) -> Result<(), PlaybackError>;

    /// Move to `position_ms`, already clamped to the duration by the caller.
    fn seek(&mut self, position_ms: u64) -> Result<(), PlaybackError>;

    fn duration_ms(&self) -> u64;

    fn position_ms(&self) -> u64;

    fn is_playing(&self) -> bool;

    /// Free the native resource. Called exactly once by the controller.
    fn release(&mut self);
}

/// Port for creating audio outputs.
pub trait AudioOutputFactory: Send + Sync {
    /// Create an output for `source` and begin preparing it.
    ///
    /// Must return promptly; preparation completes asynchronously and is
    /// reported through `events`.
    fn create(
        &self,
        source: &AudioSource,
        events: OutputEventSender,
    ) -> Result<Box<dyn AudioOutput>, PlaybackError>;
}
