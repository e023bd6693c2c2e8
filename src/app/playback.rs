use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::domain::playback::clamp_position;
use crate::domain::{AudioSource, PlaybackConfig, PlaybackError, PlaybackEvent, PlaybackState};
use crate::ports::{AudioOutput, AudioOutputFactory, OutputEvent, OutputEventSender};

/// Resolves once the output opened by `open()` is prepared.
///
/// Yields the duration in milliseconds, `PrepareFailed` if preparation
/// failed, or `Superseded` if the session was replaced or released first.
#[derive(Debug)]
pub struct PreparedSignal {
    rx: oneshot::Receiver<Result<u64, PlaybackError>>,
}

impl PreparedSignal {
    pub async fn wait(self) -> Result<u64, PlaybackError> {
        self.rx.await.unwrap_or(Err(PlaybackError::Superseded))
    }
}

/// Drives one audio-output session at a time and publishes its position.
///
/// All operations are synchronous and cheap; preparation and position
/// sampling happen on the Tokio runtime the controller was created on.
pub struct PlaybackController {
    shared: Arc<Shared>,
}

struct Shared {
    factory: Arc<dyn AudioOutputFactory>,
    interval: Duration,
    runtime: Handle,
    events: broadcast::Sender<PlaybackEvent>,
    output_tx: mpsc::UnboundedSender<(u64, OutputEvent)>,
    session: Mutex<Session>,
}

struct Session {
    state: PlaybackState,
    generation: u64,
    output: Option<Box<dyn AudioOutput>>,
    source: Option<AudioSource>,
    duration_ms: u64,
    prepared_tx: Option<oneshot::Sender<Result<u64, PlaybackError>>>,
    play_when_prepared: bool,
    feed: Option<CancellationToken>,
}

impl PlaybackController {
    /// Must be called from within a Tokio runtime.
    pub fn new(
        factory: Arc<dyn AudioOutputFactory>,
        config: &PlaybackConfig,
    ) -> Result<Self, PlaybackError> {
        let runtime = Handle::try_current().map_err(|e| PlaybackError::Runtime(e.to_string()))?;
        let (events, _) = broadcast::channel(64);
        let (output_tx, output_rx) = mpsc::unbounded_channel();

        let shared = Arc::new(Shared {
            factory,
            interval: config.position_interval(),
            runtime,
            events,
            output_tx,
            session: Mutex::new(Session {
                state: PlaybackState::Idle,
                generation: 0,
                output: None,
                source: None,
                duration_ms: 0,
                prepared_tx: None,
                play_when_prepared: false,
                feed: None,
            }),
        });

        shared
            .runtime
            .spawn(pump_output_events(Arc::downgrade(&shared), output_rx));

        Ok(Self { shared })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PlaybackEvent> {
        self.shared.events.subscribe()
    }

    pub fn state(&self) -> PlaybackState {
        self.shared.session.lock().state
    }

    pub fn source(&self) -> Option<AudioSource> {
        self.shared.session.lock().source.clone()
    }

    /// Duration of the prepared source, 0 before preparation.
    pub fn duration_ms(&self) -> u64 {
        self.shared.session.lock().duration_ms
    }

    /// Current position. Returns None until the session is prepared.
    pub fn position_ms(&self) -> Option<u64> {
        let session = self.shared.session.lock();
        match session.state {
            PlaybackState::Prepared | PlaybackState::Playing | PlaybackState::Paused => {
                session.output.as_ref().map(|o| o.position_ms())
            }
            PlaybackState::Completed => Some(session.duration_ms),
            _ => None,
        }
    }

    /// Bind the controller to `source`, releasing any previous output first.
    pub fn open(&self, source: AudioSource) -> Result<PreparedSignal, PlaybackError> {
        let shared = &self.shared;
        let mut session = shared.session.lock();
        if session.state == PlaybackState::Released {
            return Err(PlaybackError::Released);
        }

        shared.teardown(&mut session, PlaybackError::Superseded);

        let (prepared_tx, prepared_rx) = oneshot::channel();
        let events = OutputEventSender::new(session.generation, shared.output_tx.clone());

        match shared.factory.create(&source, events) {
            Ok(output) => {
                info!(source = %source, generation = session.generation, "Opening audio output");
                session.output = Some(output);
                session.source = Some(source);
                session.prepared_tx = Some(prepared_tx);
                shared.transition(&mut session, PlaybackState::Preparing);
                Ok(PreparedSignal { rx: prepared_rx })
            }
            Err(e) => {
                let err = match e {
                    PlaybackError::PrepareFailed(_) => e,
                    other => PlaybackError::PrepareFailed(other.to_string()),
                };
                warn!(source = %source, error = %err, "Audio output could not be created");
                shared.transition(&mut session, PlaybackState::Idle);
                Err(err)
            }
        }
    }

    /// Start or resume playback.
    ///
    /// While preparing, the request is remembered and playback starts as soon
    /// as the output is prepared. From Completed, playback restarts at zero.
    pub fn play(&self) -> Result<(), PlaybackError> {
        let shared = &self.shared;
        let mut session = shared.session.lock();
        match session.state {
            PlaybackState::Preparing => {
                session.play_when_prepared = true;
                Ok(())
            }
            PlaybackState::Prepared | PlaybackState::Paused => shared.start_playing(&mut session),
            PlaybackState::Completed => {
                if let Some(output) = session.output.as_mut() {
                    output.seek(0)?;
                }
                shared.start_playing(&mut session)
            }
            PlaybackState::Playing => Ok(()),
            PlaybackState::Idle => Err(PlaybackError::InvalidState {
                op: "play",
                state: PlaybackState::Idle,
            }),
            PlaybackState::Released => Err(PlaybackError::Released),
        }
    }

    pub fn pause(&self) -> Result<(), PlaybackError> {
        let shared = &self.shared;
        let mut session = shared.session.lock();
        match session.state {
            PlaybackState::Playing => {
                // The feed stops in `transition`, only once the output has paused.
                if let Some(output) = session.output.as_mut() {
                    output.pause()?;
                }
                shared.transition(&mut session, PlaybackState::Paused);
                Ok(())
            }
            PlaybackState::Preparing => {
                session.play_when_prepared = false;
                Ok(())
            }
            PlaybackState::Prepared | PlaybackState::Paused | PlaybackState::Completed => Ok(()),
            PlaybackState::Idle => Err(PlaybackError::InvalidState {
                op: "pause",
                state: PlaybackState::Idle,
            }),
            PlaybackState::Released => Err(PlaybackError::Released),
        }
    }

    /// Move to `position_ms`, clamped to `[0, duration]`. Play/pause state is unchanged.
    ///
    /// Returns the position actually applied.
    pub fn seek(&self, position_ms: i64) -> Result<u64, PlaybackError> {
        let shared = &self.shared;
        let mut session = shared.session.lock();
        match session.state {
            state if state.can_seek() => {
                let target = clamp_position(position_ms, session.duration_ms);
                if let Some(output) = session.output.as_mut() {
                    output.seek(target)?;
                }
                debug!(requested = position_ms, applied = target, "Seek");
                let _ = shared.events.send(PlaybackEvent::Seeked { position_ms: target });
                Ok(target)
            }
            PlaybackState::Preparing => Err(PlaybackError::NotPrepared),
            PlaybackState::Released => Err(PlaybackError::Released),
            state => Err(PlaybackError::InvalidState { op: "seek", state }),
        }
    }

    /// Stop sampling and free the native output. Terminal and idempotent.
    pub fn release(&self) {
        let shared = &self.shared;
        let mut session = shared.session.lock();
        if session.state == PlaybackState::Released {
            return;
        }
        shared.teardown(&mut session, PlaybackError::Released);
        shared.transition(&mut session, PlaybackState::Released);
        info!("Playback released");
    }
}

impl Drop for PlaybackController {
    fn drop(&mut self) {
        self.release();
    }
}

impl Shared {
    /// Release the current output (if any) and invalidate its generation.
    fn teardown(&self, session: &mut Session, reason: PlaybackError) {
        Self::stop_feed(session);
        if let Some(mut output) = session.output.take() {
            output.release();
            debug!(generation = session.generation, "Audio output released");
        }
        if let Some(tx) = session.prepared_tx.take() {
            let _ = tx.send(Err(reason));
        }
        session.generation += 1;
        session.source = None;
        session.duration_ms = 0;
        session.play_when_prepared = false;
    }

    fn stop_feed(session: &mut Session) {
        if let Some(token) = session.feed.take() {
            token.cancel();
        }
    }

    fn start_playing(self: &Arc<Self>, session: &mut Session) -> Result<(), PlaybackError> {
        let output = session.output.as_mut().ok_or(PlaybackError::InvalidState {
            op: "play",
            state: session.state,
        })?;
        output.play()?;
        self.transition(session, PlaybackState::Playing);
        Ok(())
    }

    /// Apply a state change. Leaving Playing stops the feed; entering it starts a new one.
    fn transition(self: &Arc<Self>, session: &mut Session, to: PlaybackState) {
        let from = session.state;
        if from == to {
            return;
        }
        if from == PlaybackState::Playing {
            Self::stop_feed(session);
        }
        session.state = to;
        if to == PlaybackState::Playing {
            self.start_feed(session);
        }

        debug!(?from, ?to, "Playback state changed");
        let _ = self.events.send(PlaybackEvent::StateChanged { from, to });
    }

    fn start_feed(self: &Arc<Self>, session: &mut Session) {
        let token = CancellationToken::new();
        if let Some(previous) = session.feed.replace(token.clone()) {
            previous.cancel();
        }
        self.runtime.spawn(run_position_feed(
            Arc::downgrade(self),
            token,
            session.generation,
            self.interval,
        ));
    }

    /// Publish one position sample. Returns false when the feed should stop.
    ///
    /// The state is re-checked under the session lock, so once `pause()` or
    /// `release()` returns no further sample can be published.
    fn publish_position(&self, token: &CancellationToken, generation: u64) -> bool {
        let session = self.session.lock();
        if token.is_cancelled()
            || session.generation != generation
            || session.state != PlaybackState::Playing
        {
            return false;
        }
        let Some(output) = session.output.as_ref() else {
            return false;
        };
        if !output.is_playing() {
            return false;
        }

        let position_ms = output.position_ms();
        trace!(position_ms, "Position sample");
        let _ = self.events.send(PlaybackEvent::Position { position_ms });
        true
    }

    fn handle_output_event(self: &Arc<Self>, generation: u64, event: OutputEvent) {
        let mut session = self.session.lock();
        if generation != session.generation {
            debug!(generation, current = session.generation, ?event, "Ignoring event from superseded output");
            return;
        }

        match event {
            OutputEvent::Prepared { duration_ms } => {
                if session.state != PlaybackState::Preparing {
                    debug!(state = ?session.state, "Ignoring duplicate prepared notification");
                    return;
                }
                session.duration_ms = duration_ms;
                self.transition(&mut session, PlaybackState::Prepared);
                let _ = self.events.send(PlaybackEvent::Prepared { duration_ms });
                if let Some(tx) = session.prepared_tx.take() {
                    let _ = tx.send(Ok(duration_ms));
                }
                info!(duration_ms, "Audio output prepared");

                if std::mem::take(&mut session.play_when_prepared) {
                    if let Err(e) = self.start_playing(&mut session) {
                        warn!(error = %e, "Deferred play failed");
                        let _ = self.events.send(PlaybackEvent::Error {
                            message: e.to_string(),
                        });
                    }
                }
            }
            OutputEvent::Completed => {
                if session.state != PlaybackState::Playing {
                    debug!(state = ?session.state, "Ignoring completion outside playback");
                    return;
                }
                self.transition(&mut session, PlaybackState::Completed);
                let _ = self.events.send(PlaybackEvent::Completed);
                info!("Playback completed");
            }
            OutputEvent::Error { message } => {
                if !session.state.holds_output() {
                    return;
                }
                let was_preparing = session.state == PlaybackState::Preparing;
                let reason = PlaybackError::PrepareFailed(message.clone());
                self.teardown(&mut session, reason);
                self.transition(&mut session, PlaybackState::Idle);
                let _ = self.events.send(PlaybackEvent::Error {
                    message: message.clone(),
                });
                if was_preparing {
                    warn!(message = %message, "Audio output failed to prepare");
                } else {
                    warn!(message = %message, "Audio output failed during playback");
                }
            }
        }
    }
}

async fn pump_output_events(
    shared: Weak<Shared>,
    mut rx: mpsc::UnboundedReceiver<(u64, OutputEvent)>,
) {
    while let Some((generation, event)) = rx.recv().await {
        let Some(shared) = shared.upgrade() else {
            break;
        };
        shared.handle_output_event(generation, event);
    }
    trace!("Output event pump stopped");
}

/// Periodic position sampler. Stops on cancellation, or the first tick that
/// finds the session no longer playing.
async fn run_position_feed(
    shared: Weak<Shared>,
    token: CancellationToken,
    generation: u64,
    period: Duration,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = ticker.tick() => {}
        }
        let Some(shared) = shared.upgrade() else {
            break;
        };
        if !shared.publish_position(&token, generation) {
            break;
        }
    }
    trace!(generation, "Position feed stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::broadcast::error::TryRecvError;

    use crate::testing::FakeOutputFactory;

    const INTERVAL_MS: u64 = 20;

    fn controller(factory: &Arc<FakeOutputFactory>) -> PlaybackController {
        let config = PlaybackConfig {
            position_interval_ms: INTERVAL_MS,
        };
        PlaybackController::new(Arc::clone(factory) as Arc<dyn AudioOutputFactory>, &config)
            .unwrap()
    }

    fn song(n: u32) -> AudioSource {
        AudioSource::parse(&format!("content://media/audio/{}", n)).unwrap()
    }

    fn drain(rx: &mut broadcast::Receiver<PlaybackEvent>) -> Vec<PlaybackEvent> {
        let mut events = Vec::new();
        loop {
            match rx.try_recv() {
                Ok(event) => events.push(event),
                Err(TryRecvError::Lagged(_)) => continue,
                Err(_) => break,
            }
        }
        events
    }

    async fn wait_for_state(controller: &PlaybackController, state: PlaybackState) {
        for _ in 0..100 {
            if controller.state() == state {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("state never became {:?}, still {:?}", state, controller.state());
    }

    #[tokio::test]
    async fn test_open_prepares_and_reports_duration() {
        let factory = Arc::new(FakeOutputFactory::preparing(180_000));
        let controller = controller(&factory);
        assert_eq!(controller.state(), PlaybackState::Idle);

        let prepared = controller.open(song(1)).unwrap();
        assert_eq!(prepared.wait().await, Ok(180_000));
        assert_eq!(controller.state(), PlaybackState::Prepared);
        assert_eq!(controller.duration_ms(), 180_000);
        assert_eq!(controller.position_ms(), Some(0));
    }

    #[tokio::test]
    async fn test_play_before_prepared_then_seek_past_end_clamps() {
        let factory = Arc::new(FakeOutputFactory::preparing(5_000));
        let controller = controller(&factory);

        let prepared = controller.open(song(1)).unwrap();
        controller.play().unwrap();
        let duration = prepared.wait().await.unwrap();
        wait_for_state(&controller, PlaybackState::Playing).await;

        let applied = controller.seek(duration as i64 + 1000).unwrap();
        assert_eq!(applied, duration);
        assert_eq!(controller.position_ms(), Some(duration));
        assert_eq!(controller.state(), PlaybackState::Playing);
    }

    #[tokio::test]
    async fn test_seek_clamps_below_zero_and_keeps_pause() {
        let factory = Arc::new(FakeOutputFactory::preparing(5_000));
        let controller = controller(&factory);
        controller.open(song(1)).unwrap().wait().await.unwrap();

        controller.play().unwrap();
        controller.pause().unwrap();
        assert_eq!(controller.seek(-300).unwrap(), 0);
        assert_eq!(controller.seek(2_500).unwrap(), 2_500);
        assert_eq!(controller.state(), PlaybackState::Paused);
        assert!(!factory.state(0).lock().playing);
    }

    #[tokio::test]
    async fn test_seek_before_prepared_is_rejected() {
        let factory = Arc::new(FakeOutputFactory::manual());
        let controller = controller(&factory);
        let _prepared = controller.open(song(1)).unwrap();

        assert_eq!(controller.seek(100), Err(PlaybackError::NotPrepared));
        assert_eq!(controller.state(), PlaybackState::Preparing);
        assert_eq!(controller.position_ms(), None);
    }

    #[tokio::test]
    async fn test_position_feed_runs_only_while_playing() {
        let factory = Arc::new(FakeOutputFactory::preparing(60_000));
        let controller = controller(&factory);
        controller.open(song(1)).unwrap().wait().await.unwrap();
        let mut rx = controller.subscribe();

        factory.state(0).lock().position_ms = 1_234;
        controller.play().unwrap();
        tokio::time::sleep(Duration::from_millis(INTERVAL_MS * 3)).await;

        let samples: Vec<u64> = drain(&mut rx)
            .into_iter()
            .filter_map(|e| match e {
                PlaybackEvent::Position { position_ms } => Some(position_ms),
                _ => None,
            })
            .collect();
        assert!(samples.len() >= 2, "expected periodic samples, got {:?}", samples);
        assert!(samples.iter().all(|&p| p == 1_234));

        controller.pause().unwrap();
        drain(&mut rx);
        tokio::time::sleep(Duration::from_millis(INTERVAL_MS * 4)).await;

        let after_pause = drain(&mut rx);
        assert!(
            !after_pause
                .iter()
                .any(|e| matches!(e, PlaybackEvent::Position { .. })),
            "sample delivered after pause: {:?}",
            after_pause
        );
    }

    #[tokio::test]
    async fn test_immediate_pause_delivers_no_samples_afterwards() {
        let factory = Arc::new(FakeOutputFactory::preparing(60_000));
        let controller = controller(&factory);
        controller.open(song(1)).unwrap().wait().await.unwrap();
        let mut rx = controller.subscribe();

        controller.play().unwrap();
        controller.pause().unwrap();
        drain(&mut rx);

        tokio::time::sleep(Duration::from_millis(INTERVAL_MS * 3)).await;
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn test_failed_pause_keeps_playing_and_sampling() {
        let factory = Arc::new(FakeOutputFactory::preparing(60_000));
        let controller = controller(&factory);
        controller.open(song(1)).unwrap().wait().await.unwrap();
        let mut rx = controller.subscribe();

        controller.play().unwrap();
        factory.state(0).lock().fail_pause = true;
        assert_eq!(
            controller.pause(),
            Err(PlaybackError::Output("thread gone".to_string()))
        );
        assert_eq!(controller.state(), PlaybackState::Playing);
        drain(&mut rx);

        tokio::time::sleep(Duration::from_millis(INTERVAL_MS * 4)).await;
        let samples = drain(&mut rx)
            .into_iter()
            .filter(|e| matches!(e, PlaybackEvent::Position { .. }))
            .count();
        assert!(samples >= 1, "feed stopped while still playing");

        factory.state(0).lock().fail_pause = false;
        controller.pause().unwrap();
        assert_eq!(controller.state(), PlaybackState::Paused);
    }

    #[tokio::test]
    async fn test_seek_reports_seeked_not_a_sample() {
        let factory = Arc::new(FakeOutputFactory::preparing(10_000));
        let controller = controller(&factory);
        controller.open(song(1)).unwrap().wait().await.unwrap();
        let mut rx = controller.subscribe();

        controller.seek(4_000).unwrap();
        controller.play().unwrap();
        controller.pause().unwrap();
        drain(&mut rx);
        controller.seek(7_500).unwrap();

        assert_eq!(
            drain(&mut rx),
            vec![PlaybackEvent::Seeked { position_ms: 7_500 }]
        );
    }

    #[tokio::test]
    async fn test_feed_stops_itself_when_output_stops() {
        let factory = Arc::new(FakeOutputFactory::preparing(60_000));
        let controller = controller(&factory);
        controller.open(song(1)).unwrap().wait().await.unwrap();
        let mut rx = controller.subscribe();

        controller.play().unwrap();
        tokio::time::sleep(Duration::from_millis(INTERVAL_MS * 2)).await;

        // The output stalls without the controller being told.
        factory.state(0).lock().playing = false;
        tokio::time::sleep(Duration::from_millis(INTERVAL_MS * 2)).await;
        drain(&mut rx);

        factory.state(0).lock().playing = true;
        tokio::time::sleep(Duration::from_millis(INTERVAL_MS * 3)).await;
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn test_completion_stops_feed() {
        let factory = Arc::new(FakeOutputFactory::preparing(3_000));
        let controller = controller(&factory);
        controller.open(song(1)).unwrap().wait().await.unwrap();
        let mut rx = controller.subscribe();

        controller.play().unwrap();
        factory.fire(0, OutputEvent::Completed);
        wait_for_state(&controller, PlaybackState::Completed).await;
        assert_eq!(controller.position_ms(), Some(3_000));

        let events = drain(&mut rx);
        assert!(events.contains(&PlaybackEvent::Completed));

        tokio::time::sleep(Duration::from_millis(INTERVAL_MS * 3)).await;
        assert!(drain(&mut rx).is_empty());

        // Playing again restarts from the top.
        controller.play().unwrap();
        assert_eq!(controller.state(), PlaybackState::Playing);
        assert_eq!(factory.state(0).lock().position_ms, 0);
    }

    #[tokio::test]
    async fn test_reopen_releases_previous_output() {
        let factory = Arc::new(FakeOutputFactory::preparing(1_000));
        let controller = controller(&factory);

        controller.open(song(1)).unwrap().wait().await.unwrap();
        controller.play().unwrap();
        controller.open(song(2)).unwrap().wait().await.unwrap();

        assert_eq!(factory.created(), 2);
        assert_eq!(factory.state(0).lock().releases, 1);
        assert_eq!(factory.live_outputs(), 1);
        assert_eq!(controller.source(), Some(song(2)));
        assert_eq!(controller.state(), PlaybackState::Prepared);
    }

    #[tokio::test]
    async fn test_superseded_session_events_are_ignored() {
        let factory = Arc::new(FakeOutputFactory::manual());
        let controller = controller(&factory);

        let first = controller.open(song(1)).unwrap();
        let second = controller.open(song(2)).unwrap();
        assert_eq!(first.wait().await, Err(PlaybackError::Superseded));

        // A late prepared from the first output must not prepare the second session.
        factory.fire(0, OutputEvent::Prepared { duration_ms: 10 });
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(controller.state(), PlaybackState::Preparing);

        factory.fire(1, OutputEvent::Prepared { duration_ms: 2_000 });
        assert_eq!(second.wait().await, Ok(2_000));

        // A duplicate prepared is ignored as well.
        controller.play().unwrap();
        factory.fire(1, OutputEvent::Prepared { duration_ms: 99 });
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(controller.state(), PlaybackState::Playing);
        assert_eq!(controller.duration_ms(), 2_000);
    }

    #[tokio::test]
    async fn test_create_failure_stays_idle() {
        let factory = Arc::new(FakeOutputFactory::failing());
        let controller = controller(&factory);

        let err = controller.open(song(1)).unwrap_err();
        assert!(matches!(err, PlaybackError::PrepareFailed(_)));
        assert_eq!(controller.state(), PlaybackState::Idle);
        controller.release();
    }

    #[tokio::test]
    async fn test_async_prepare_failure_returns_to_idle() {
        let factory = Arc::new(FakeOutputFactory::manual());
        let controller = controller(&factory);

        let prepared = controller.open(song(1)).unwrap();
        factory.fire(
            0,
            OutputEvent::Error {
                message: "unsupported codec".to_string(),
            },
        );

        assert_eq!(
            prepared.wait().await,
            Err(PlaybackError::PrepareFailed("unsupported codec".to_string()))
        );
        assert_eq!(controller.state(), PlaybackState::Idle);
        assert_eq!(factory.state(0).lock().releases, 1);
    }

    #[tokio::test]
    async fn test_release_is_idempotent() {
        let factory = Arc::new(FakeOutputFactory::preparing(1_000));
        let controller = controller(&factory);

        controller.open(song(1)).unwrap().wait().await.unwrap();
        controller.play().unwrap();
        controller.pause().unwrap();
        controller.release();
        controller.release();

        assert_eq!(controller.state(), PlaybackState::Released);
        assert_eq!(factory.state(0).lock().releases, 1);
        assert_eq!(controller.open(song(2)).unwrap_err(), PlaybackError::Released);
        assert_eq!(controller.play(), Err(PlaybackError::Released));
    }

    #[tokio::test]
    async fn test_release_from_idle_and_drop() {
        let factory = Arc::new(FakeOutputFactory::preparing(1_000));
        {
            let controller = controller(&factory);
            controller.release();
            assert_eq!(controller.state(), PlaybackState::Released);
        }
        {
            let controller = controller(&factory);
            controller.open(song(1)).unwrap().wait().await.unwrap();
        }
        assert_eq!(factory.live_outputs(), 0);
    }

    #[tokio::test]
    async fn test_play_from_idle_is_invalid() {
        let factory = Arc::new(FakeOutputFactory::preparing(1_000));
        let controller = controller(&factory);
        assert_eq!(
            controller.play(),
            Err(PlaybackError::InvalidState {
                op: "play",
                state: PlaybackState::Idle
            })
        );
    }
}
