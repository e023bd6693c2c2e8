use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, FromSample, SampleFormat, SizedSample, Stream, StreamConfig};
use tracing::{debug, error, info, warn};

use crate::adapters::wav::decode_wav;
use crate::domain::audio::{frames_to_ms, ms_to_frames};
use crate::domain::{AudioSource, PlaybackError};
use crate::ports::{AudioOutput, AudioOutputFactory, OutputEvent, OutputEventSender, SourceReader};

/// Commands sent to the output thread.
enum OutputCommand {
    Play,
    Pause,
    Shutdown,
}

/// Playback cursor shared between the output handle and the stream callback.
///
/// Positions are counted in mono frames at the device sample rate.
#[derive(Default)]
struct Playhead {
    cursor: AtomicUsize,
    length: AtomicUsize,
    rate: AtomicU32,
    playing: AtomicBool,
}

impl Playhead {
    fn duration_ms(&self) -> u64 {
        frames_to_ms(
            self.length.load(Ordering::Acquire),
            self.rate.load(Ordering::Acquire),
        )
    }

    fn position_ms(&self) -> u64 {
        frames_to_ms(
            self.cursor.load(Ordering::Acquire),
            self.rate.load(Ordering::Acquire),
        )
    }

    fn seek(&self, position_ms: u64) {
        let frame = ms_to_frames(position_ms, self.rate.load(Ordering::Acquire))
            .min(self.length.load(Ordering::Acquire));
        self.cursor.store(frame, Ordering::Release);
    }

    /// Fill one device buffer. Sends `Completed` once when the end is reached.
    fn fill<T>(&self, data: &mut [T], channels: usize, samples: &[f32], events: &OutputEventSender)
    where
        T: SizedSample + FromSample<f32>,
    {
        let silence = T::from_sample_(0.0f32);
        if !self.playing.load(Ordering::Acquire) {
            data.fill(silence);
            return;
        }

        let start = self.cursor.load(Ordering::Acquire);
        let mut pos = start;
        for frame in data.chunks_mut(channels.max(1)) {
            match samples.get(pos) {
                Some(&value) => {
                    frame.fill(T::from_sample_(value));
                    pos += 1;
                }
                None => frame.fill(silence),
            }
        }

        if self.commit(start, pos, samples.len()) {
            debug!("Audio output reached end of source");
            events.send(OutputEvent::Completed);
        }
    }

    /// Store the cursor advanced from `start` to `pos`, unless a seek moved it
    /// meanwhile. Returns true when the stored cursor is at the end and
    /// playback has just stopped.
    fn commit(&self, start: usize, pos: usize, len: usize) -> bool {
        let cursor = match self
            .cursor
            .compare_exchange(start, pos, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) => pos,
            Err(seeked) => seeked,
        };
        cursor >= len && self.playing.swap(false, Ordering::AcqRel)
    }
}

mod device {
    use super::*;

    pub(super) fn default_output() -> Result<(Device, StreamConfig, SampleFormat), String> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| "No default output device available".to_string())?;

        let supported = device
            .default_output_config()
            .map_err(|e| format!("Failed to get default config: {}", e))?;

        debug!(
            device = %device.name().unwrap_or_else(|_| "Unknown".to_string()),
            sample_rate = ?supported.sample_rate(),
            channels = supported.channels(),
            format = ?supported.sample_format(),
            "Output device default config"
        );

        let config = StreamConfig {
            channels: supported.channels(),
            sample_rate: supported.sample_rate(),
            buffer_size: cpal::BufferSize::Default,
        };
        Ok((device, config, supported.sample_format()))
    }

    pub(super) fn build_stream<T>(
        device: &Device,
        config: &StreamConfig,
        samples: Arc<Vec<f32>>,
        playhead: Arc<Playhead>,
        events: OutputEventSender,
    ) -> Result<Stream, String>
    where
        T: SizedSample + FromSample<f32>,
    {
        let channels = config.channels as usize;
        let err_events = events.clone();

        device
            .build_output_stream(
                config,
                move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                    playhead.fill(data, channels, &samples, &events);
                },
                move |err| {
                    error!(?err, "Audio output stream error");
                    err_events.send(OutputEvent::Error {
                        message: err.to_string(),
                    });
                },
                None,
            )
            .map_err(|e| format!("Failed to build stream: {}", e))
    }
}

/// Decode the source and open a paused stream on the default device.
fn prepare(
    reader: &dyn SourceReader,
    source: &AudioSource,
    playhead: &Arc<Playhead>,
    events: &OutputEventSender,
) -> Result<Stream, String> {
    let input = reader
        .open(source)
        .map_err(|e| format!("Cannot open {}: {}", source, e))?;
    let pcm = decode_wav(input).map_err(|e| format!("Cannot decode {}: {}", source, e))?;

    let (device, config, format) = device::default_output()?;
    let pcm = pcm.resampled(config.sample_rate.0);

    playhead.rate.store(pcm.sample_rate(), Ordering::Release);
    playhead.length.store(pcm.len(), Ordering::Release);
    playhead.cursor.store(0, Ordering::Release);

    let samples = Arc::new(pcm.into_samples());
    let playhead = Arc::clone(playhead);
    let events = events.clone();
    let stream = match format {
        SampleFormat::F32 => device::build_stream::<f32>(&device, &config, samples, playhead, events),
        SampleFormat::I16 => device::build_stream::<i16>(&device, &config, samples, playhead, events),
        SampleFormat::U16 => device::build_stream::<u16>(&device, &config, samples, playhead, events),
        other => Err(format!("Unsupported sample format: {:?}", other)),
    }?;

    stream
        .pause()
        .map_err(|e| format!("Failed to pause new stream: {}", e))?;
    Ok(stream)
}

/// Output thread runner. The Stream is created and dropped here since it is not Send.
fn output_thread_main(
    reader: Arc<dyn SourceReader>,
    source: AudioSource,
    playhead: Arc<Playhead>,
    events: OutputEventSender,
    cmd_rx: Receiver<OutputCommand>,
) {
    let stream = match prepare(reader.as_ref(), &source, &playhead, &events) {
        Ok(stream) => stream,
        Err(message) => {
            warn!(source = %source, message = %message, "Audio output preparation failed");
            events.send(OutputEvent::Error { message });
            return;
        }
    };

    let duration_ms = playhead.duration_ms();
    info!(source = %source, duration_ms, "Audio output prepared");
    events.send(OutputEvent::Prepared { duration_ms });

    while let Ok(cmd) = cmd_rx.recv() {
        let result = match cmd {
            OutputCommand::Play => stream.play().map_err(|e| e.to_string()),
            OutputCommand::Pause => stream.pause().map_err(|e| e.to_string()),
            OutputCommand::Shutdown => break,
        };
        if let Err(message) = result {
            error!(message = %message, "Audio output stream control failed");
            playhead.playing.store(false, Ordering::Release);
            events.send(OutputEvent::Error { message });
        }
    }
    debug!(generation = events.generation(), "Audio output thread shutting down");
}

/// Creates cpal-backed outputs that decode WAV sources read through a `SourceReader`.
pub struct CpalOutputFactory {
    reader: Arc<dyn SourceReader>,
}

impl CpalOutputFactory {
    pub fn new(reader: Arc<dyn SourceReader>) -> Self {
        Self { reader }
    }
}

impl AudioOutputFactory for CpalOutputFactory {
    fn create(
        &self,
        source: &AudioSource,
        events: OutputEventSender,
    ) -> Result<Box<dyn AudioOutput>, PlaybackError> {
        let playhead = Arc::new(Playhead::default());
        let (cmd_tx, cmd_rx) = mpsc::channel();

        let thread_reader = Arc::clone(&self.reader);
        let thread_source = source.clone();
        let thread_playhead = Arc::clone(&playhead);

        thread::Builder::new()
            .name("audio-output".to_string())
            .spawn(move || {
                output_thread_main(thread_reader, thread_source, thread_playhead, events, cmd_rx)
            })
            .map_err(|e| PlaybackError::PrepareFailed(format!("Failed to spawn audio thread: {}", e)))?;

        Ok(Box::new(CpalAudioOutput {
            playhead,
            cmd_tx: Some(cmd_tx),
        }))
    }
}

/// Handle to one output thread.
///
/// Dropping or releasing it shuts the thread down without waiting for it.
pub struct CpalAudioOutput {
    playhead: Arc<Playhead>,
    cmd_tx: Option<Sender<OutputCommand>>,
}

impl CpalAudioOutput {
    fn send(&self, cmd: OutputCommand) -> Result<(), PlaybackError> {
        self.cmd_tx
            .as_ref()
            .ok_or(PlaybackError::Released)?
            .send(cmd)
            .map_err(|_| PlaybackError::Output("Audio thread not running".to_string()))
    }
}

impl AudioOutput for CpalAudioOutput {
    fn play(&mut self) -> Result<(), PlaybackError> {
        self.playhead.playing.store(true, Ordering::Release);
        self.send(OutputCommand::Play)
    }

    fn pause(&mut self) -> Result<(), PlaybackError> {
        self.playhead.playing.store(false, Ordering::Release);
        self.send(OutputCommand::Pause)
    }

    fn seek(&mut self, position_ms: u64) -> Result<(), PlaybackError> {
        self.playhead.seek(position_ms);
        Ok(())
    }

    fn duration_ms(&self) -> u64 {
        self.playhead.duration_ms()
    }

    fn position_ms(&self) -> u64 {
        self.playhead.position_ms()
    }

    fn is_playing(&self) -> bool {
        self.playhead.playing.load(Ordering::Acquire)
    }

    fn release(&mut self) {
        self.playhead.playing.store(false, Ordering::Release);
        if let Some(tx) = self.cmd_tx.take() {
            let _ = tx.send(OutputCommand::Shutdown);
        }
    }
}

impl Drop for CpalAudioOutput {
    fn drop(&mut self) {
        self.release();
    }
}
