use serde::{Deserialize, Serialize};

/// Default PositionFeed sampling interval.
pub const DEFAULT_POSITION_INTERVAL_MS: u64 = 500;

/// Playback session state machine.
///
/// State transitions:
/// - Idle -> Preparing (open)
/// - Preparing -> Prepared (output reported prepared)
/// - Preparing -> Idle (preparation failed)
/// - Prepared | Paused -> Playing (play)
/// - Playing -> Paused (pause)
/// - Playing -> Completed (natural end)
/// - Completed -> Playing (play, restarts from zero)
/// - any active state -> Preparing (open with a new source)
/// - any state -> Released (release, terminal)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackState {
    Idle,
    Preparing,
    Prepared,
    Playing,
    Paused,
    Completed,
    Released,
}

impl PlaybackState {
    /// Seeking is only meaningful once the duration is known.
    #[must_use]
    pub fn can_seek(&self) -> bool {
        matches!(
            self,
            PlaybackState::Prepared | PlaybackState::Playing | PlaybackState::Paused
        )
    }

    /// True while the session holds a native output resource.
    #[must_use]
    pub fn holds_output(&self) -> bool {
        matches!(
            self,
            PlaybackState::Preparing
                | PlaybackState::Prepared
                | PlaybackState::Playing
                | PlaybackState::Paused
                | PlaybackState::Completed
        )
    }
}

/// Events published by the playback controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum PlaybackEvent {
    /// Session state changed.
    StateChanged {
        from: PlaybackState,
        to: PlaybackState,
    },
    /// Duration is known; position queries are valid from here on.
    Prepared { duration_ms: u64 },
    /// Periodic position sample. Only published while playing.
    Position { position_ms: u64 },
    /// A seek was applied; `position_ms` is the clamped target.
    Seeked { position_ms: u64 },
    /// Playback reached the end of the source.
    Completed,
    /// The audio output failed.
    Error { message: String },
}

/// Clamp a requested seek target into `[0, duration_ms]`.
pub fn clamp_position(requested_ms: i64, duration_ms: u64) -> u64 {
    if requested_ms <= 0 {
        0
    } else {
        (requested_ms as u64).min(duration_ms)
    }
}
