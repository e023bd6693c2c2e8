//! In-memory doubles for the ports, shared by unit tests.

use std::collections::HashMap;
use std::fs;
use std::io::{self, Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::domain::{AudioSource, EngineError, PlaybackError, Transcript, TranscriptSegment};
use crate::ports::{
    AudioOutput, AudioOutputFactory, InferenceEngine, ModelAssets, OutputEvent,
    OutputEventSender, SourceReader,
};

/// Reader that yields some bytes and then fails.
struct BrokenReader {
    data: Cursor<Vec<u8>>,
}

impl Read for BrokenReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.data.read(buf)? {
            0 => Err(io::Error::new(io::ErrorKind::ConnectionReset, "stream interrupted")),
            n => Ok(n),
        }
    }
}

#[derive(Clone)]
enum Entry {
    Bytes(Vec<u8>),
    Broken(Vec<u8>),
}

fn open_entry(entry: Option<Entry>, name: &str) -> io::Result<Box<dyn Read + Send>> {
    match entry {
        Some(Entry::Bytes(data)) => Ok(Box::new(Cursor::new(data))),
        Some(Entry::Broken(data)) => Ok(Box::new(BrokenReader {
            data: Cursor::new(data),
        })),
        None => Err(io::Error::new(io::ErrorKind::NotFound, format!("{} not found", name))),
    }
}

/// Audio sources keyed by URI.
#[derive(Default)]
pub struct MemorySources {
    entries: HashMap<String, Entry>,
}

impl MemorySources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, uri: &str, data: &[u8]) -> Self {
        self.entries.insert(uri.to_string(), Entry::Bytes(data.to_vec()));
        self
    }

    pub fn with_broken(mut self, uri: &str, data: &[u8]) -> Self {
        self.entries.insert(uri.to_string(), Entry::Broken(data.to_vec()));
        self
    }
}

impl SourceReader for MemorySources {
    fn open(&self, source: &AudioSource) -> io::Result<Box<dyn Read + Send>> {
        let key = source.url().as_str();
        open_entry(self.entries.get(key).cloned(), key)
    }
}

/// Bundled assets held in memory, counting how often each is opened.
#[derive(Default)]
pub struct MemoryAssets {
    entries: HashMap<String, Entry>,
    opens: AtomicUsize,
}

impl MemoryAssets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, data: &[u8]) -> Self {
        self.entries.insert(name.to_string(), Entry::Bytes(data.to_vec()));
        self
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }
}

impl ModelAssets for MemoryAssets {
    fn open(&self, name: &str) -> io::Result<Box<dyn Read + Send>> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        open_entry(self.entries.get(name).cloned(), name)
    }
}

/// Engine double that records calls and detects overlapping transcriptions.
///
/// `transcribe` returns the staged file's contents as the transcript text.
#[derive(Default)]
pub struct FakeEngine {
    loads: AtomicUsize,
    transcriptions: AtomicUsize,
    active: AtomicUsize,
    max_active: AtomicUsize,
    loaded: AtomicBool,
    fail_load: AtomicBool,
    load_delay: Mutex<Duration>,
    transcribe_delay: Mutex<Duration>,
    staged_paths: Mutex<Vec<PathBuf>>,
    loaded_from: Mutex<Option<PathBuf>>,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_load_delay(self, delay: Duration) -> Self {
        *self.load_delay.lock() = delay;
        self
    }

    pub fn with_transcribe_delay(self, delay: Duration) -> Self {
        *self.transcribe_delay.lock() = delay;
        self
    }

    pub fn failing_load(self) -> Self {
        self.fail_load.store(true, Ordering::SeqCst);
        self
    }

    pub fn set_fail_load(&self, fail: bool) {
        self.fail_load.store(fail, Ordering::SeqCst);
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub fn transcriptions(&self) -> usize {
        self.transcriptions.load(Ordering::SeqCst)
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }

    pub fn staged_paths(&self) -> Vec<PathBuf> {
        self.staged_paths.lock().clone()
    }

    pub fn loaded_from(&self) -> Option<PathBuf> {
        self.loaded_from.lock().clone()
    }
}

impl InferenceEngine for FakeEngine {
    fn load_model(&self, path: &Path) -> Result<(), EngineError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(*self.load_delay.lock());

        if self.fail_load.load(Ordering::SeqCst) {
            return Err(EngineError::ModelLoad("corrupt model".to_string()));
        }
        if !path.exists() {
            return Err(EngineError::ModelLoad(format!("missing {}", path.display())));
        }

        *self.loaded_from.lock() = Some(path.to_path_buf());
        self.loaded.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn transcribe(&self, path: &Path) -> Result<Transcript, EngineError> {
        let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(active, Ordering::SeqCst);
        self.transcriptions.fetch_add(1, Ordering::SeqCst);
        self.staged_paths.lock().push(path.to_path_buf());

        std::thread::sleep(*self.transcribe_delay.lock());
        let result = fs::read_to_string(path)
            .map_err(|e| EngineError::Audio(e.to_string()))
            .map(|text| Transcript {
                segments: vec![TranscriptSegment {
                    start_ms: 0,
                    end_ms: 1000 * text.split_whitespace().count() as u64,
                    text: text.clone(),
                }],
                text,
                detected_language: Some("en".to_string()),
                duration_ms: 0,
            });

        self.active.fetch_sub(1, Ordering::SeqCst);
        result
    }

    fn is_model_loaded(&self) -> bool {
        self.loaded.load(Ordering::SeqCst)
    }
}

/// Observable state of one fake output.
#[derive(Debug, Default)]
pub struct FakeOutputState {
    pub playing: bool,
    pub position_ms: u64,
    pub duration_ms: u64,
    pub releases: usize,
    /// Make `pause()` fail and leave the output playing.
    pub fail_pause: bool,
}

/// Output factory whose outputs are plain shared state plus captured event senders.
pub struct FakeOutputFactory {
    auto_prepare: Option<u64>,
    fail_create: bool,
    outputs: Mutex<Vec<(Arc<Mutex<FakeOutputState>>, OutputEventSender)>>,
}

impl FakeOutputFactory {
    /// Outputs report prepared immediately with the given duration.
    pub fn preparing(duration_ms: u64) -> Self {
        Self {
            auto_prepare: Some(duration_ms),
            fail_create: false,
            outputs: Mutex::new(Vec::new()),
        }
    }

    /// Outputs stay in preparation until a test fires `Prepared` itself.
    pub fn manual() -> Self {
        Self {
            auto_prepare: None,
            fail_create: false,
            outputs: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            auto_prepare: None,
            fail_create: true,
            outputs: Mutex::new(Vec::new()),
        }
    }

    pub fn created(&self) -> usize {
        self.outputs.lock().len()
    }

    pub fn state(&self, index: usize) -> Arc<Mutex<FakeOutputState>> {
        Arc::clone(&self.outputs.lock()[index].0)
    }

    /// Fire an event as output `index`, setting the duration on `Prepared`.
    pub fn fire(&self, index: usize, event: OutputEvent) {
        let (state, sender) = self.outputs.lock()[index].clone();
        if let OutputEvent::Prepared { duration_ms } = event {
            state.lock().duration_ms = duration_ms;
        }
        sender.send(event);
    }

    /// Number of outputs whose native resource is still held.
    pub fn live_outputs(&self) -> usize {
        self.outputs
            .lock()
            .iter()
            .filter(|(state, _)| state.lock().releases == 0)
            .count()
    }
}

impl AudioOutputFactory for FakeOutputFactory {
    fn create(
        &self,
        source: &AudioSource,
        events: OutputEventSender,
    ) -> Result<Box<dyn AudioOutput>, PlaybackError> {
        if self.fail_create {
            return Err(PlaybackError::PrepareFailed(format!("unsupported source {}", source)));
        }

        let state = Arc::new(Mutex::new(FakeOutputState::default()));
        self.outputs.lock().push((Arc::clone(&state), events.clone()));

        if let Some(duration_ms) = self.auto_prepare {
            state.lock().duration_ms = duration_ms;
            events.send(OutputEvent::Prepared { duration_ms });
        }

        Ok(Box::new(FakeOutput { state }))
    }
}

struct FakeOutput {
    state: Arc<Mutex<FakeOutputState>>,
}

impl AudioOutput for FakeOutput {
    fn play(&mut self) -> Result<(), PlaybackError> {
        self.state.lock().playing = true;
        Ok(())
    }

    fn pause(&mut self) -> Result<(), PlaybackError> {
        let mut state = self.state.lock();
        if state.fail_pause {
            return Err(PlaybackError::Output("thread gone".to_string()));
        }
        state.playing = false;
        Ok(())
    }

    fn seek(&mut self, position_ms: u64) -> Result<(), PlaybackError> {
        self.state.lock().position_ms = position_ms;
        Ok(())
    }

    fn duration_ms(&self) -> u64 {
        self.state.lock().duration_ms
    }

    fn position_ms(&self) -> u64 {
        self.state.lock().position_ms
    }

    fn is_playing(&self) -> bool {
        self.state.lock().playing
    }

    fn release(&mut self) {
        let mut state = self.state.lock();
        state.playing = false;
        state.releases += 1;
    }
}
