//! # Playback Error Types
//!
//! Error taxonomy for sample cache and controller operations.

use crate::state::PlayerState;
use bridge_traits::{BridgeError, ResourceId};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during cache and playback operations.
#[derive(Error, Debug)]
pub enum PlaybackError {
    // ========================================================================
    // Cache Errors
    // ========================================================================
    /// The host loader could not decode the resource. The cache retains no
    /// partial entry for the failed id.
    #[error("Failed to load resource {id}: {reason}")]
    LoadFailed { id: ResourceId, reason: String },

    /// The cache was configured with zero capacity and can never admit an
    /// entry.
    #[error("Sample cache capacity must be greater than zero")]
    CacheExhausted,

    // ========================================================================
    // Lifecycle Errors
    // ========================================================================
    /// The operation is not legal in the controller's current state. The
    /// state is left unchanged.
    #[error("Operation '{operation}' not allowed in state {state:?}")]
    InvalidState {
        operation: &'static str,
        state: PlayerState,
    },

    /// A prepare did not finish within the configured deadline.
    #[error("Prepare did not complete within {timeout:?}")]
    Timeout { timeout: Duration },

    /// The engine reported an unrecoverable fault. `code` and `extra` are
    /// platform diagnostics passed through verbatim.
    #[error("Engine fault (code {code}, extra {extra})")]
    Engine { code: i32, extra: i32 },

    // ========================================================================
    // Generic Errors
    // ========================================================================
    /// Invalid configuration supplied at construction.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A bridge call failed outside the categories above.
    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),
}

impl PlaybackError {
    /// Returns `true` if this error reports a caller protocol violation
    /// rather than a runtime fault.
    pub fn is_protocol_violation(&self) -> bool {
        matches!(self, PlaybackError::InvalidState { .. })
    }

    /// Returns `true` if the controller must be reset before further use.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            PlaybackError::Engine { .. } | PlaybackError::Timeout { .. }
        )
    }
}

/// Result type for playback operations.
pub type Result<T> = std::result::Result<T, PlaybackError>;
