//! # Host Bridge Traits
//!
//! Platform abstraction traits that must be implemented by each host platform.
//!
//! ## Overview
//!
//! This crate defines the contract between the playback core and
//! platform-specific implementations. Each trait represents a capability the
//! core requires but that must be implemented differently per platform
//! (desktop, iOS, Android).
//!
//! ## Traits
//!
//! - [`AudioEngine`](engine::AudioEngine) - Single-stream audio engine control
//!   with asynchronous [`EngineEvent`](engine::EngineEvent) callbacks
//! - [`SampleLoader`](loader::SampleLoader) - Decode named resources into
//!   resident samples identified by opaque handles
//! - [`FocusProvider`](focus::FocusProvider) - Audio focus arbitration and
//!   [`FocusChange`](focus::FocusChange) notifications
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//!
//! ## Division of responsibility
//!
//! Engines are permissive executors: they carry out whatever call arrives and
//! report faults through their event stream. Lifecycle legality (what may be
//! called in which state) is enforced entirely by the playback core, which
//! also serializes event handling with its own operations. Implementations
//! therefore never need to track lifecycle state themselves.
//!
//! ## Error Handling
//!
//! All bridge traits use the [`BridgeError`](error::BridgeError) type for
//! consistent error handling. Platform implementations should convert
//! platform-specific errors to `BridgeError` and provide actionable messages.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` bounds to support safe concurrent
//! usage across async tasks. Implementations must ensure thread safety.
//!
//! ## Testing
//!
//! The `mock` feature compiles scriptable in-memory implementations of every
//! trait ([`mock::MockAudioEngine`], [`mock::MockSampleLoader`],
//! [`mock::MockFocusProvider`]) used by the core test suites.

pub mod engine;
pub mod error;
pub mod focus;
pub mod ids;
pub mod loader;
pub mod time;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use error::BridgeError;

// Re-export commonly used types
pub use engine::{AudioEngine, EngineEvent};
pub use focus::{FocusChange, FocusProvider};
pub use ids::{ResourceId, SampleHandle};
pub use loader::SampleLoader;
pub use time::{Clock, SystemClock};
