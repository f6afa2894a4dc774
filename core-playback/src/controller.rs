//! # Playback Controller
//!
//! State machine gating every playback operation against the engine
//! lifecycle, plus the audio-focus policy.
//!
//! ## Architecture
//!
//! ```text
//!            operations                 EngineEvent      FocusChange
//!                │                           │                │
//!                ▼                           ▼                ▼
//!         ┌────────────┐             ┌─────────────┐  ┌─────────────┐
//!         │ lifecycle  │             │ engine pump │  │ focus pump  │
//!         │   gate     │             └──────┬──────┘  └──────┬──────┘
//!         └─────┬──────┘                    │                │
//!               └──────────┬────────────────┴────────────────┘
//!                          ▼
//!                ┌──────────────────┐      ┌─────────────┐
//!                │ controller mutex │─────>│ AudioEngine │
//!                └──────────────────┘      └─────────────┘
//! ```
//!
//! Every mutation of controller state goes through one mutex: caller
//! operations, engine callbacks, and focus notifications alike. Checking an
//! operation's legality and acting on it is therefore atomic, and callbacks
//! are never applied mid-transition. Engines stay permissive executors; this
//! module owns all sequencing.
//!
//! Illegal operations are always logged as errors and published on the
//! event bus. With [`PlayerConfig::strict_mode`] they panic; otherwise they
//! are no-ops returning [`PlaybackError::InvalidState`].

use crate::cache::SampleCache;
use crate::config::PlayerConfig;
use crate::error::{PlaybackError, Result};
use crate::events::{EventBus, PlayerEvent, Receiver, RecvError};
use crate::state::{duration_queryable, Operation, PlayerState};
use bridge_traits::{
    AudioEngine, Clock, EngineEvent, FocusChange, FocusProvider, ResourceId, SampleHandle,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

const MIN_RATE: f32 = 0.01;
const MAX_RATE: f32 = 2.0;
const MAX_BALANCE: f32 = 2.0;

/// Mutable controller state, guarded by the controller mutex.
struct ControllerInner {
    state: PlayerState,
    current: Option<(ResourceId, SampleHandle)>,
    looping: bool,
    rate: f32,
    master_volume: f32,
    balance: f32,
    // Incremented per async prepare; a watchdog only fires when its
    // generation still matches.
    prepare_generation: u64,
}

impl ControllerInner {
    fn new() -> Self {
        Self {
            state: PlayerState::Idle,
            current: None,
            looping: false,
            rate: 1.0,
            master_volume: 1.0,
            balance: 1.0,
            prepare_generation: 0,
        }
    }

    /// Per-channel gains derived from master volume and balance.
    /// Balance 1.0 is centered; below it the right channel attenuates,
    /// above it the left.
    fn channel_volumes(&self) -> (f32, f32) {
        if self.balance < 1.0 {
            (self.master_volume, self.master_volume * self.balance)
        } else {
            (self.master_volume * (2.0 - self.balance), self.master_volume)
        }
    }
}

struct Shared {
    name: String,
    config: PlayerConfig,
    engine: Arc<dyn AudioEngine>,
    cache: Arc<Mutex<SampleCache>>,
    focus: Arc<dyn FocusProvider>,
    clock: Arc<dyn Clock>,
    events: EventBus,
    inner: Mutex<ControllerInner>,
}

/// Single-stream playback controller.
///
/// One controller owns one engine lifecycle and a view of a (possibly
/// shared) sample cache. All operations are async and may be called from
/// any task; the controller serializes them internally.
pub struct PlaybackController {
    shared: Arc<Shared>,
    pumps: parking_lot::Mutex<Vec<JoinHandle<()>>>,
}

impl PlaybackController {
    /// Create a controller, request audio focus, and start the callback
    /// pump tasks. Must be called from within a tokio runtime.
    pub async fn new(
        name: impl Into<String>,
        engine: Arc<dyn AudioEngine>,
        cache: Arc<Mutex<SampleCache>>,
        focus: Arc<dyn FocusProvider>,
        clock: Arc<dyn Clock>,
        config: PlayerConfig,
    ) -> Result<Self> {
        config.validate().map_err(PlaybackError::Config)?;

        let focus_rx = focus.request_focus().await?;
        let engine_rx = engine.events();

        let shared = Arc::new(Shared {
            name: name.into(),
            events: EventBus::new(config.event_buffer),
            config,
            engine,
            cache,
            focus,
            clock,
            inner: Mutex::new(ControllerInner::new()),
        });

        let pumps = vec![
            tokio::spawn(Shared::run_engine_pump(shared.clone(), engine_rx)),
            tokio::spawn(Shared::run_focus_pump(shared.clone(), focus_rx)),
        ];

        info!(player = %shared.name, "playback controller created");
        Ok(Self {
            shared,
            pumps: parking_lot::Mutex::new(pumps),
        })
    }

    /// Resolve `id` through the sample cache and bind it as the engine
    /// source. Legal only from `Idle`; a failed load moves the controller
    /// to `Error`.
    pub async fn set_source(&self, id: ResourceId) -> Result<()> {
        let shared = &self.shared;
        let mut inner = shared.inner.lock().await;
        shared.gate(&inner, Operation::SetSource)?;

        let resolved = shared.cache.lock().await.resolve(&id).await;
        let handle = match resolved {
            Ok(handle) => handle,
            Err(err) => {
                error!(player = %shared.name, resource = %id, %err, "failed to load source");
                shared.transition(&mut inner, PlayerState::Error, Some(Operation::SetSource));
                return Err(err);
            }
        };

        match shared.engine.set_source(handle).await {
            Ok(()) => {
                inner.current = Some((id, handle));
                shared.transition(&mut inner, PlayerState::Initialized, Some(Operation::SetSource));
                Ok(())
            }
            Err(err) => {
                error!(player = %shared.name, resource = %id, %err, "engine rejected source");
                shared.transition(&mut inner, PlayerState::Error, Some(Operation::SetSource));
                Err(err.into())
            }
        }
    }

    /// Prepare the bound source, blocking until the engine is ready or the
    /// configured deadline passes.
    pub async fn prepare(&self) -> Result<()> {
        let shared = &self.shared;
        let mut inner = shared.inner.lock().await;
        shared.gate(&inner, Operation::Prepare)?;

        let started_at = shared.clock.unix_timestamp_millis();
        match tokio::time::timeout(shared.config.prepare_timeout, shared.engine.prepare()).await {
            Ok(Ok(())) => {
                let elapsed_ms = shared.clock.unix_timestamp_millis() - started_at;
                debug!(player = %shared.name, elapsed_ms, "prepare finished");
                shared.transition(&mut inner, PlayerState::Prepared, Some(Operation::Prepare));
                Ok(())
            }
            Ok(Err(err)) => {
                error!(player = %shared.name, %err, "engine failed to prepare");
                shared.transition(&mut inner, PlayerState::Error, Some(Operation::Prepare));
                Err(err.into())
            }
            Err(_) => {
                let timeout = shared.config.prepare_timeout;
                error!(player = %shared.name, ?timeout, "prepare deadline exceeded");
                shared.transition(&mut inner, PlayerState::Error, Some(Operation::Prepare));
                Err(PlaybackError::Timeout { timeout })
            }
        }
    }

    /// Begin an asynchronous prepare. The controller enters `Preparing` and
    /// leaves it when the engine's `Prepared` callback arrives; a watchdog
    /// moves it to `Error` if the callback misses the deadline.
    pub async fn prepare_async(&self) -> Result<()> {
        let shared = &self.shared;
        let mut inner = shared.inner.lock().await;
        shared.gate(&inner, Operation::PrepareAsync)?;

        if let Err(err) = shared.engine.prepare_async().await {
            error!(player = %shared.name, %err, "engine failed to begin preparing");
            shared.transition(&mut inner, PlayerState::Error, Some(Operation::PrepareAsync));
            return Err(err.into());
        }

        inner.prepare_generation += 1;
        let generation = inner.prepare_generation;
        shared.transition(&mut inner, PlayerState::Preparing, Some(Operation::PrepareAsync));
        drop(inner);

        let watchdog = self.shared.clone();
        tokio::spawn(async move {
            tokio::time::sleep(watchdog.config.prepare_timeout).await;
            let mut inner = watchdog.inner.lock().await;
            if inner.state == PlayerState::Preparing && inner.prepare_generation == generation {
                let timeout = watchdog.config.prepare_timeout;
                error!(player = %watchdog.name, ?timeout, "async prepare deadline exceeded");
                watchdog.transition(&mut inner, PlayerState::Error, None);
            }
        });

        Ok(())
    }

    /// Start or resume playback. Calling `start` while already `Started` is
    /// an accepted no-op that does not reach the engine.
    pub async fn start(&self) -> Result<()> {
        let shared = &self.shared;
        let mut inner = shared.inner.lock().await;
        shared.gate(&inner, Operation::Start)?;

        if inner.state == PlayerState::Started {
            debug!(player = %shared.name, "start ignored, already playing");
            return Ok(());
        }

        match shared.engine.start().await {
            Ok(()) => {
                shared.transition(&mut inner, PlayerState::Started, Some(Operation::Start));
                Ok(())
            }
            Err(err) => {
                error!(player = %shared.name, %err, "engine failed to start");
                shared.transition(&mut inner, PlayerState::Error, Some(Operation::Start));
                Err(err.into())
            }
        }
    }

    /// Pause playback, keeping the position. Idempotent from `Paused`.
    pub async fn pause(&self) -> Result<()> {
        let shared = &self.shared;
        let mut inner = shared.inner.lock().await;
        shared.gate(&inner, Operation::Pause)?;

        if inner.state == PlayerState::Paused {
            debug!(player = %shared.name, "pause ignored, already paused");
            return Ok(());
        }

        match shared.engine.pause().await {
            Ok(()) => {
                shared.transition(&mut inner, PlayerState::Paused, Some(Operation::Pause));
                Ok(())
            }
            Err(err) => {
                error!(player = %shared.name, %err, "engine failed to pause");
                shared.transition(&mut inner, PlayerState::Error, Some(Operation::Pause));
                Err(err.into())
            }
        }
    }

    /// Stop playback. The source must be prepared again before restarting.
    /// Idempotent from `Stopped`.
    pub async fn stop(&self) -> Result<()> {
        let shared = &self.shared;
        let mut inner = shared.inner.lock().await;
        shared.gate(&inner, Operation::Stop)?;

        if inner.state == PlayerState::Stopped {
            debug!(player = %shared.name, "stop ignored, already stopped");
            return Ok(());
        }

        match shared.engine.stop().await {
            Ok(()) => {
                shared.transition(&mut inner, PlayerState::Stopped, Some(Operation::Stop));
                Ok(())
            }
            Err(err) => {
                error!(player = %shared.name, %err, "engine failed to stop");
                shared.transition(&mut inner, PlayerState::Error, Some(Operation::Stop));
                Err(err.into())
            }
        }
    }

    /// Seek to an absolute position. The state is unchanged; the engine
    /// reports completion through its event stream.
    pub async fn seek_to(&self, position: Duration) -> Result<()> {
        let shared = &self.shared;
        let inner = shared.inner.lock().await;
        shared.gate(&inner, Operation::SeekTo)?;
        shared.engine.seek_to(position).await?;
        debug!(player = %shared.name, ?position, "seek requested");
        Ok(())
    }

    /// Toggle automatic restart at end of stream.
    pub async fn set_looping(&self, looping: bool) -> Result<()> {
        let shared = &self.shared;
        let mut inner = shared.inner.lock().await;
        shared.gate(&inner, Operation::SetLooping)?;
        shared.engine.set_looping(looping).await?;
        inner.looping = looping;
        Ok(())
    }

    /// Set the master volume and push the derived per-channel gains to the
    /// engine. `master` is clamped to `[0.0, 1.0]`.
    pub async fn set_volume(&self, master: f32) -> Result<()> {
        let shared = &self.shared;
        let mut inner = shared.inner.lock().await;
        shared.gate(&inner, Operation::SetVolume)?;

        inner.master_volume = master.clamp(0.0, 1.0);
        let (left, right) = inner.channel_volumes();
        shared.engine.set_volume(left, right).await?;
        debug!(player = %shared.name, left, right, "volume applied");
        Ok(())
    }

    /// Set the stereo balance and re-apply the current master volume.
    /// `balance` is clamped to `[0.0, 2.0]`; 1.0 is centered.
    pub async fn set_balance(&self, balance: f32) -> Result<()> {
        let shared = &self.shared;
        let mut inner = shared.inner.lock().await;
        shared.gate(&inner, Operation::SetVolume)?;

        inner.balance = balance.clamp(0.0, MAX_BALANCE);
        let (left, right) = inner.channel_volumes();
        shared.engine.set_volume(left, right).await?;
        debug!(player = %shared.name, balance = inner.balance, left, right, "balance applied");
        Ok(())
    }

    /// Set the playback rate, clamped to `[0.01, 2.0]`.
    pub async fn set_rate(&self, rate: f32) -> Result<()> {
        let shared = &self.shared;
        let mut inner = shared.inner.lock().await;
        shared.gate(&inner, Operation::SetRate)?;

        let clamped = rate.clamp(MIN_RATE, MAX_RATE);
        shared.engine.set_rate(clamped).await?;
        inner.rate = clamped;
        Ok(())
    }

    /// Return the controller to `Idle`, dropping the bound source. Legal
    /// from every state, including `Error`. Playback parameters (volume,
    /// balance, rate, looping) persist across resets.
    pub async fn reset(&self) -> Result<()> {
        let shared = &self.shared;
        let mut inner = shared.inner.lock().await;
        shared.gate(&inner, Operation::Reset)?;

        if let Err(err) = shared.engine.reset().await {
            warn!(player = %shared.name, %err, "engine reset reported a fault");
        }
        inner.current = None;
        shared.transition(&mut inner, PlayerState::Idle, Some(Operation::Reset));
        Ok(())
    }

    /// Convenience: bind, prepare, and start `id` in one call. Legal only
    /// from `Idle`.
    pub async fn play(&self, id: ResourceId) -> Result<()> {
        self.set_source(id).await?;
        self.prepare().await?;
        self.start().await
    }

    /// Tear the controller down: stop if stoppable, release the engine,
    /// abandon focus, clear the cache, and cancel the pump tasks. Always
    /// succeeds; individual failures are logged. The controller ends in
    /// `Idle` and should not be reused afterwards.
    pub async fn release(&self) {
        let shared = &self.shared;
        {
            let mut inner = shared.inner.lock().await;
            info!(player = %shared.name, state = ?inner.state, "releasing playback controller");

            if Operation::Stop.allowed_from(inner.state) && inner.state != PlayerState::Stopped {
                if let Err(err) = shared.engine.stop().await {
                    warn!(player = %shared.name, %err, "failed to stop engine during release");
                }
            }
            if let Err(err) = shared.engine.release().await {
                warn!(player = %shared.name, %err, "failed to release engine");
            }
            if let Err(err) = shared.focus.abandon_focus().await {
                warn!(player = %shared.name, %err, "failed to abandon audio focus");
            }

            inner.current = None;
            shared.transition(&mut inner, PlayerState::Idle, None);
            shared.cache.lock().await.clear().await;
        }

        for pump in self.pumps.lock().drain(..) {
            pump.abort();
        }
    }

    /// Current lifecycle state.
    pub async fn state(&self) -> PlayerState {
        self.shared.inner.lock().await.state
    }

    /// The resource currently bound as the engine source, if any.
    pub async fn current_resource(&self) -> Option<ResourceId> {
        self.shared
            .inner
            .lock()
            .await
            .current
            .as_ref()
            .map(|(id, _)| id.clone())
    }

    /// Whether audio is playing right now.
    pub async fn is_playing(&self) -> bool {
        self.shared.inner.lock().await.state == PlayerState::Started
    }

    /// Current playback position. Zero when the controller is in `Error`.
    pub async fn position(&self) -> Result<Duration> {
        if self.shared.inner.lock().await.state == PlayerState::Error {
            return Ok(Duration::ZERO);
        }
        Ok(self.shared.engine.position().await?)
    }

    /// Stream duration, or `None` when the state has no meaningful answer.
    pub async fn duration(&self) -> Result<Option<Duration>> {
        let state = self.shared.inner.lock().await.state;
        if !duration_queryable(state) {
            return Ok(None);
        }
        Ok(self.shared.engine.duration().await?)
    }

    /// Subscribe to controller events.
    pub fn subscribe(&self) -> Receiver<PlayerEvent> {
        self.shared.events.subscribe()
    }

    /// Diagnostic name given at construction.
    pub fn name(&self) -> &str {
        &self.shared.name
    }
}

impl Drop for PlaybackController {
    fn drop(&mut self) {
        for pump in self.pumps.lock().drain(..) {
            pump.abort();
        }
    }
}

impl Shared {
    /// Check `op` against the current state. Violations are logged,
    /// published, and either panic (strict mode) or surface `InvalidState`.
    fn gate(&self, inner: &ControllerInner, op: Operation) -> Result<()> {
        if op.allowed_from(inner.state) {
            return Ok(());
        }

        error!(
            player = %self.name,
            operation = op.name(),
            state = ?inner.state,
            "operation invoked from illegal state"
        );
        self.events.emit(PlayerEvent::OperationRejected {
            operation: op,
            state: inner.state,
        });

        if self.config.strict_mode {
            panic!(
                "operation '{}' invoked from illegal state {:?} on player '{}'",
                op.name(),
                inner.state,
                self.name
            );
        }

        Err(PlaybackError::InvalidState {
            operation: op.name(),
            state: inner.state,
        })
    }

    fn transition(
        &self,
        inner: &mut ControllerInner,
        to: PlayerState,
        operation: Option<Operation>,
    ) {
        let from = inner.state;
        if from == to {
            return;
        }
        inner.state = to;
        info!(
            player = %self.name,
            from = ?from,
            to = ?to,
            operation = operation.map(Operation::name),
            "state transition"
        );
        self.events.emit(PlayerEvent::StateChanged {
            from,
            to,
            operation,
        });
    }

    async fn run_engine_pump(shared: Arc<Shared>, mut rx: broadcast::Receiver<EngineEvent>) {
        loop {
            match rx.recv().await {
                Ok(event) => shared.handle_engine_event(event).await,
                Err(RecvError::Lagged(missed)) => {
                    warn!(player = %shared.name, missed, "engine event stream lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
    }

    async fn run_focus_pump(shared: Arc<Shared>, mut rx: broadcast::Receiver<FocusChange>) {
        loop {
            match rx.recv().await {
                Ok(change) => shared.handle_focus_change(change).await,
                Err(RecvError::Lagged(missed)) => {
                    warn!(player = %shared.name, missed, "focus event stream lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
    }

    async fn handle_engine_event(&self, event: EngineEvent) {
        let mut inner = self.inner.lock().await;
        match event {
            EngineEvent::Prepared => {
                if inner.state == PlayerState::Preparing {
                    self.transition(&mut inner, PlayerState::Prepared, None);
                } else {
                    warn!(
                        player = %self.name,
                        state = ?inner.state,
                        "ignoring prepared callback outside Preparing"
                    );
                }
            }
            EngineEvent::Completed => {
                if inner.state == PlayerState::Started {
                    self.transition(&mut inner, PlayerState::PlaybackComplete, None);
                } else {
                    warn!(
                        player = %self.name,
                        state = ?inner.state,
                        "ignoring completion callback while not playing"
                    );
                }
            }
            EngineEvent::SeekComplete => {
                debug!(player = %self.name, "seek complete");
                self.events.emit(PlayerEvent::SeekCompleted);
            }
            EngineEvent::Info { what, extra } => {
                debug!(player = %self.name, what, extra, "engine info");
            }
            EngineEvent::Error { code, extra } => {
                error!(player = %self.name, code, extra, "engine reported fault");
                self.transition(&mut inner, PlayerState::Error, None);
                self.events.emit(PlayerEvent::EngineFault { code, extra });
            }
        }
    }

    /// Apply the focus policy. Failures here are logged, never surfaced;
    /// focus handling is fire-and-forget from the host's perspective.
    async fn handle_focus_change(&self, change: FocusChange) {
        let mut inner = self.inner.lock().await;
        info!(player = %self.name, ?change, state = ?inner.state, "audio focus changed");
        self.events.emit(PlayerEvent::FocusChanged { change });

        match change {
            FocusChange::Gained => {
                if inner.state == PlayerState::Paused {
                    match self.engine.start().await {
                        Ok(()) => self.transition(&mut inner, PlayerState::Started, None),
                        Err(err) => {
                            warn!(player = %self.name, %err, "failed to resume after focus gain");
                        }
                    }
                }
            }
            FocusChange::LostPermanent => {
                if inner.state == PlayerState::Started {
                    if let Err(err) = self.engine.stop().await {
                        warn!(player = %self.name, %err, "failed to stop engine on focus loss");
                    }
                    if let Err(err) = self.engine.release().await {
                        warn!(player = %self.name, %err, "failed to release engine on focus loss");
                    }
                    if let Some((id, _)) = inner.current.take() {
                        self.cache.lock().await.invalidate(&id).await;
                    }
                    if let Err(err) = self.focus.abandon_focus().await {
                        warn!(player = %self.name, %err, "failed to abandon audio focus");
                    }
                    self.transition(&mut inner, PlayerState::Idle, None);
                }
            }
            FocusChange::LostTransient => {
                if inner.state == PlayerState::Started {
                    match self.engine.pause().await {
                        Ok(()) => self.transition(&mut inner, PlayerState::Paused, None),
                        Err(err) => {
                            warn!(player = %self.name, %err, "failed to pause on transient focus loss");
                        }
                    }
                }
            }
            FocusChange::LostTransientCanDuck => {
                inner.master_volume = self.config.duck_volume;
                let (left, right) = inner.channel_volumes();
                if let Err(err) = self.engine.set_volume(left, right).await {
                    warn!(player = %self.name, %err, "failed to duck volume");
                }
                self.events.emit(PlayerEvent::Ducked {
                    volume: self.config.duck_volume,
                });
            }
        }
    }
}
