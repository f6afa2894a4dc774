//! Audio focus bridge trait.
//!
//! Platforms arbitrate which application may produce sound. The core reacts
//! to focus transitions (pausing, ducking, releasing the engine) but never
//! decides them; that policy belongs to the host's audio session manager.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Focus transitions delivered by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FocusChange {
    /// Focus (re)acquired; playback may resume.
    Gained,
    /// Focus lost for an unbounded time; playback resources should be freed.
    LostPermanent,
    /// Focus lost briefly; playback should pause and expect a `Gained`.
    LostTransient,
    /// Focus lost briefly, but playback may continue at reduced volume.
    LostTransientCanDuck,
}

/// Trait for host components that grant audio focus and report changes.
#[async_trait::async_trait]
pub trait FocusProvider: Send + Sync {
    /// Request audio focus. On success the returned receiver delivers every
    /// subsequent [`FocusChange`] until focus is abandoned.
    async fn request_focus(&self) -> Result<broadcast::Receiver<FocusChange>>;

    /// Give up audio focus. No further changes are delivered afterwards.
    async fn abandon_focus(&self) -> Result<()>;
}
