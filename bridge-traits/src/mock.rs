//! Scriptable in-memory bridge implementations.
//!
//! These back the playback core's scenario tests: every call is recorded,
//! failures and hangs can be scripted per operation, and engine/focus events
//! can be injected at will. They are compiled only with the `mock` feature.

use crate::engine::{AudioEngine, EngineEvent};
use crate::error::{BridgeError, Result};
use crate::focus::{FocusChange, FocusProvider};
use crate::ids::{ResourceId, SampleHandle};
use crate::loader::SampleLoader;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::broadcast;

const EVENT_BUFFER: usize = 64;

/// Loader handing out sequential handles and recording every call.
pub struct MockSampleLoader {
    next_handle: AtomicU64,
    loads: Mutex<Vec<ResourceId>>,
    unloads: Mutex<Vec<SampleHandle>>,
    failing: Mutex<HashSet<ResourceId>>,
}

impl MockSampleLoader {
    pub fn new() -> Self {
        Self {
            next_handle: AtomicU64::new(1),
            loads: Mutex::new(Vec::new()),
            unloads: Mutex::new(Vec::new()),
            failing: Mutex::new(HashSet::new()),
        }
    }

    /// Make every subsequent `load` of `id` fail as a missing resource.
    pub fn fail_on(&self, id: impl Into<ResourceId>) {
        self.failing.lock().insert(id.into());
    }

    /// Every resource id passed to `load`, in call order.
    pub fn loads(&self) -> Vec<ResourceId> {
        self.loads.lock().clone()
    }

    /// Every handle passed to `unload`, in call order.
    pub fn unloads(&self) -> Vec<SampleHandle> {
        self.unloads.lock().clone()
    }

    pub fn load_count(&self, id: &ResourceId) -> usize {
        self.loads.lock().iter().filter(|l| *l == id).count()
    }
}

impl Default for MockSampleLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl SampleLoader for MockSampleLoader {
    async fn load(&self, id: &ResourceId) -> Result<SampleHandle> {
        self.loads.lock().push(id.clone());
        if self.failing.lock().contains(id) {
            return Err(BridgeError::NotFound(id.to_string()));
        }
        let raw = self.next_handle.fetch_add(1, Ordering::SeqCst);
        Ok(SampleHandle::new(raw))
    }

    async fn unload(&self, handle: SampleHandle) -> Result<()> {
        self.unloads.lock().push(handle);
        Ok(())
    }
}

/// Commands a [`MockAudioEngine`] has been asked to execute.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCommand {
    SetSource(SampleHandle),
    Prepare,
    PrepareAsync,
    Start,
    Pause,
    Stop,
    SeekTo(Duration),
    SetLooping(bool),
    SetVolume(f32, f32),
    SetRate(f32),
    Reset,
    Release,
}

/// Engine that records commands and lets tests script faults and events.
///
/// By default every operation succeeds immediately; `prepare` included, so
/// synchronous prepare flows need no scripting. Use [`emit`](Self::emit) to
/// drive asynchronous callbacks (`Prepared`, `Completed`, ...).
pub struct MockAudioEngine {
    commands: Mutex<Vec<EngineCommand>>,
    failing: Mutex<HashSet<&'static str>>,
    hanging: Mutex<HashSet<&'static str>>,
    position: Mutex<Duration>,
    duration: Mutex<Option<Duration>>,
    events: broadcast::Sender<EngineEvent>,
}

impl MockAudioEngine {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        Self {
            commands: Mutex::new(Vec::new()),
            failing: Mutex::new(HashSet::new()),
            hanging: Mutex::new(HashSet::new()),
            position: Mutex::new(Duration::ZERO),
            duration: Mutex::new(None),
            events,
        }
    }

    /// Script the named operation (e.g. `"start"`) to fail.
    pub fn fail_on(&self, op: &'static str) {
        self.failing.lock().insert(op);
    }

    /// Script the named operation to never complete.
    pub fn hang_on(&self, op: &'static str) {
        self.hanging.lock().insert(op);
    }

    /// Inject an engine event, as a platform callback would.
    pub fn emit(&self, event: EngineEvent) {
        let _ = self.events.send(event);
    }

    pub fn set_position(&self, position: Duration) {
        *self.position.lock() = position;
    }

    pub fn set_duration(&self, duration: Option<Duration>) {
        *self.duration.lock() = duration;
    }

    /// Everything the engine was asked to do, in call order.
    pub fn commands(&self) -> Vec<EngineCommand> {
        self.commands.lock().clone()
    }

    pub fn count(&self, matches: impl Fn(&EngineCommand) -> bool) -> usize {
        self.commands.lock().iter().filter(|c| matches(c)).count()
    }

    /// The most recent `SetVolume` command, if any.
    pub fn last_volume(&self) -> Option<(f32, f32)> {
        self.commands.lock().iter().rev().find_map(|c| match c {
            EngineCommand::SetVolume(l, r) => Some((*l, *r)),
            _ => None,
        })
    }

    async fn gate(&self, op: &'static str, command: EngineCommand) -> Result<()> {
        self.commands.lock().push(command);
        if self.hanging.lock().contains(op) {
            std::future::pending::<()>().await;
        }
        if self.failing.lock().contains(op) {
            return Err(BridgeError::OperationFailed(format!("{op} rejected")));
        }
        Ok(())
    }
}

impl Default for MockAudioEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl AudioEngine for MockAudioEngine {
    async fn set_source(&self, handle: SampleHandle) -> Result<()> {
        self.gate("set_source", EngineCommand::SetSource(handle)).await
    }

    async fn prepare(&self) -> Result<()> {
        self.gate("prepare", EngineCommand::Prepare).await
    }

    async fn prepare_async(&self) -> Result<()> {
        self.gate("prepare_async", EngineCommand::PrepareAsync).await
    }

    async fn start(&self) -> Result<()> {
        self.gate("start", EngineCommand::Start).await
    }

    async fn pause(&self) -> Result<()> {
        self.gate("pause", EngineCommand::Pause).await
    }

    async fn stop(&self) -> Result<()> {
        self.gate("stop", EngineCommand::Stop).await
    }

    async fn seek_to(&self, position: Duration) -> Result<()> {
        self.gate("seek_to", EngineCommand::SeekTo(position)).await
    }

    async fn set_looping(&self, looping: bool) -> Result<()> {
        self.gate("set_looping", EngineCommand::SetLooping(looping)).await
    }

    async fn set_volume(&self, left: f32, right: f32) -> Result<()> {
        self.gate("set_volume", EngineCommand::SetVolume(left, right)).await
    }

    async fn set_rate(&self, rate: f32) -> Result<()> {
        self.gate("set_rate", EngineCommand::SetRate(rate)).await
    }

    async fn position(&self) -> Result<Duration> {
        Ok(*self.position.lock())
    }

    async fn duration(&self) -> Result<Option<Duration>> {
        Ok(*self.duration.lock())
    }

    async fn reset(&self) -> Result<()> {
        self.gate("reset", EngineCommand::Reset).await
    }

    async fn release(&self) -> Result<()> {
        self.gate("release", EngineCommand::Release).await
    }

    fn events(&self) -> broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }
}

/// Focus provider that grants focus immediately and lets tests inject
/// focus transitions.
pub struct MockFocusProvider {
    changes: broadcast::Sender<FocusChange>,
    requests: AtomicUsize,
    abandons: AtomicUsize,
}

impl MockFocusProvider {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(EVENT_BUFFER);
        Self {
            changes,
            requests: AtomicUsize::new(0),
            abandons: AtomicUsize::new(0),
        }
    }

    /// Deliver a focus transition to every subscribed controller.
    pub fn emit(&self, change: FocusChange) {
        let _ = self.changes.send(change);
    }

    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    pub fn abandon_count(&self) -> usize {
        self.abandons.load(Ordering::SeqCst)
    }
}

impl Default for MockFocusProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl FocusProvider for MockFocusProvider {
    async fn request_focus(&self) -> Result<broadcast::Receiver<FocusChange>> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        Ok(self.changes.subscribe())
    }

    async fn abandon_focus(&self) -> Result<()> {
        self.abandons.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
