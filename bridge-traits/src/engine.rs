//! Audio engine bridge trait.
//!
//! These abstractions let the playback core drive a platform audio engine
//! (a single-stream media player) while preserving a consistent, async-first
//! API surface. Host applications provide concrete implementations that
//! satisfy their platform constraints.
//!
//! The engine is deliberately permissive: it executes whatever it is told
//! and reports faults through [`EngineEvent::Error`]. All lifecycle
//! sequencing and legality checks live in the core, not here.

use crate::error::Result;
use crate::ids::SampleHandle;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::broadcast;

/// Asynchronous notifications emitted by an engine implementation.
///
/// Events are delivered on a broadcast channel obtained from
/// [`AudioEngine::events`]; the core serializes their handling with its own
/// operations, so implementations may emit from any task or thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineEvent {
    /// An asynchronous prepare finished and the stream is ready to start.
    Prepared,
    /// The current stream played to its end (only emitted when not looping).
    Completed,
    /// A previously requested seek has been applied.
    SeekComplete,
    /// Informational engine diagnostic (buffering, stalls, ...).
    Info { what: i32, extra: i32 },
    /// The engine hit an unrecoverable fault. `code` and `extra` are
    /// platform-specific diagnostics passed through verbatim.
    Error { code: i32, extra: i32 },
}

/// Trait for platform-specific audio engines driving a single stream.
#[async_trait::async_trait]
pub trait AudioEngine: Send + Sync {
    /// Bind a resident sample as the engine's current source.
    async fn set_source(&self, handle: SampleHandle) -> Result<()>;

    /// Prepare the bound source for playback, returning once it is ready.
    async fn prepare(&self) -> Result<()>;

    /// Begin preparing the bound source and return immediately; the engine
    /// emits [`EngineEvent::Prepared`] when ready.
    async fn prepare_async(&self) -> Result<()>;

    /// Start or resume playback.
    async fn start(&self) -> Result<()>;

    /// Pause playback, keeping the current position.
    async fn pause(&self) -> Result<()>;

    /// Stop playback. The source must be prepared again before restarting.
    async fn stop(&self) -> Result<()>;

    /// Seek to an absolute position; [`EngineEvent::SeekComplete`] follows.
    async fn seek_to(&self, position: Duration) -> Result<()>;

    /// Toggle automatic restart at end of stream.
    async fn set_looping(&self, looping: bool) -> Result<()>;

    /// Set per-channel gain. Both values are normalized to `0.0..=1.0`.
    async fn set_volume(&self, left: f32, right: f32) -> Result<()>;

    /// Set the playback rate multiplier (1.0 = normal speed).
    async fn set_rate(&self, rate: f32) -> Result<()>;

    /// Query the current playback position.
    async fn position(&self) -> Result<Duration>;

    /// Query the total stream duration, when the engine knows it.
    async fn duration(&self) -> Result<Option<Duration>>;

    /// Return the engine to its unconfigured state, dropping the source.
    async fn reset(&self) -> Result<()>;

    /// Release all native resources. The engine is unusable afterwards.
    async fn release(&self) -> Result<()>;

    /// Subscribe to the engine's event stream.
    fn events(&self) -> broadcast::Receiver<EngineEvent>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_events_serialize_with_tags() {
        let json = serde_json::to_string(&EngineEvent::Error { code: 1, extra: -19 })
            .expect("serialize");
        assert!(json.contains("\"type\":\"error\""));
        assert!(json.contains("-19"));

        let back: EngineEvent = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, EngineEvent::Error { code: 1, extra: -19 });
    }
}
