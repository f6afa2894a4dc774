//! # Core Playback
//!
//! Sample pool and playback lifecycle management.
//!
//! ## Overview
//!
//! This crate implements the platform-independent half of a short-sound
//! player: a capacity-bounded [`SampleCache`](cache::SampleCache) with least
//! recently used eviction, and a [`PlaybackController`](controller::PlaybackController)
//! that gates every operation against the engine lifecycle and applies the
//! audio-focus policy. The platform half (engine, loader, focus arbitration)
//! lives behind the `bridge-traits` crate.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────┐
//! │                  PlaybackController                   │
//! │  lifecycle gate · focus policy · event bus · pumps    │
//! └───────────┬────────────────────────┬──────────────────┘
//!             │                        │
//!             ▼                        ▼
//!   ┌──────────────────┐     ┌───────────────────┐
//!   │   SampleCache    │     │    AudioEngine    │  (bridge)
//!   │  bounded + LRU   │     └───────────────────┘
//!   └────────┬─────────┘
//!            ▼
//!   ┌──────────────────┐
//!   │   SampleLoader   │  (bridge)
//!   └──────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! use core_playback::{PlaybackController, PlayerConfig, SampleCache};
//! use std::sync::Arc;
//! use tokio::sync::Mutex;
//!
//! let config = PlayerConfig::default().with_cache_capacity(10);
//! let cache = Arc::new(Mutex::new(SampleCache::new(
//!     config.cache_capacity,
//!     loader,
//! )?));
//! let player = PlaybackController::new(
//!     "effects", engine, cache, focus, clock, config,
//! ).await?;
//!
//! player.play("chime".into()).await?;
//! ```

pub mod cache;
pub mod config;
pub mod controller;
pub mod error;
pub mod events;
pub mod logging;
pub mod state;

pub use cache::SampleCache;
pub use config::PlayerConfig;
pub use controller::PlaybackController;
pub use error::{PlaybackError, Result};
pub use events::{EventBus, PlayerEvent};
pub use state::{Operation, PlayerState, ALL_OPERATIONS, ALL_STATES};
