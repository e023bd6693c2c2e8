//! Offline lyric transcription and playback preview.
//!
//! The [`AppController`] owns two independent services: a transcription
//! pipeline that stages an audio source, loads the whisper.cpp model once and
//! runs one transcription at a time, and a playback controller that drives a
//! single audio output and publishes its position while playing.

#![forbid(unsafe_code)]

pub mod adapters;
pub mod app;
pub mod domain;
pub mod infrastructure;
pub mod ports;

#[cfg(test)]
mod testing;

pub use app::{AppController, PlaybackController, PreparedSignal, TranscriptionPipeline};
pub use domain::{
    AppConfig, AudioSource, DomainError, ModelError, ModelPhase, PlaybackError, PlaybackEvent,
    PlaybackState, TimedLyrics, Transcript, TranscriptionError,
};
